// Global input sanitizer: strips leading and trailing whitespace from every string argument.
//
// Covers both places a client can put a string: request variables (trimmed while the
// request is prepared) and literals written into the document itself, including nested
// lists, input objects and variable default values (trimmed right after parsing).
// Non-string values are left alone.

use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextParseQuery, NextPrepareRequest,
};
use async_graphql::parser::types::{DocumentOperations, ExecutableDocument, Selection, SelectionSet};
use async_graphql::{Request, ServerResult, Variables};
use async_graphql_value::{ConstValue, Value};
use async_trait::async_trait;
use std::sync::Arc;

pub struct TrimArguments;

impl ExtensionFactory for TrimArguments {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(TrimArgumentsExtension)
    }
}

struct TrimArgumentsExtension;

#[async_trait]
impl Extension for TrimArgumentsExtension {
    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        mut request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        trim_variables(&mut request.variables);
        next.run(ctx, request).await
    }

    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        let mut document = next.run(ctx, query, variables).await?;
        trim_document(&mut document);
        Ok(document)
    }
}

fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

pub fn trim_const(value: &mut ConstValue) {
    match value {
        ConstValue::String(text) => trim_in_place(text),
        ConstValue::List(items) => items.iter_mut().for_each(trim_const),
        ConstValue::Object(fields) => fields.values_mut().for_each(trim_const),
        _ => {}
    }
}

fn trim_literal(value: &mut Value) {
    match value {
        Value::String(text) => trim_in_place(text),
        Value::List(items) => items.iter_mut().for_each(trim_literal),
        Value::Object(fields) => fields.values_mut().for_each(trim_literal),
        _ => {}
    }
}

pub fn trim_variables(variables: &mut Variables) {
    let mut value = std::mem::take(variables).into_value();
    trim_const(&mut value);
    *variables = Variables::from_value(value);
}

pub fn trim_document(document: &mut ExecutableDocument) {
    let operations = match &mut document.operations {
        DocumentOperations::Single(operation) => vec![operation],
        DocumentOperations::Multiple(operations) => operations.values_mut().collect(),
    };
    for operation in operations {
        for definition in &mut operation.node.variable_definitions {
            if let Some(default) = &mut definition.node.default_value {
                trim_const(&mut default.node);
            }
        }
        trim_selection_set(&mut operation.node.selection_set.node);
    }
    for fragment in document.fragments.values_mut() {
        trim_selection_set(&mut fragment.node.selection_set.node);
    }
}

fn trim_selection_set(selection_set: &mut SelectionSet) {
    for selection in &mut selection_set.items {
        match &mut selection.node {
            Selection::Field(field) => {
                for (_, argument) in &mut field.node.arguments {
                    trim_literal(&mut argument.node);
                }
                trim_selection_set(&mut field.node.selection_set.node);
            }
            Selection::InlineFragment(fragment) => {
                trim_selection_set(&mut fragment.node.selection_set.node);
            }
            Selection::FragmentSpread(_) => {}
        }
    }
}
