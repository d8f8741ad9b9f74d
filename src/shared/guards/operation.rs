use async_graphql::parser::parse_query;
use async_graphql::parser::types::{
    DocumentOperations, ExecutableDocument, OperationType, Selection, SelectionSet,
};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl From<OperationType> for OperationKind {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

/// The root fields an incoming operation selects, which is all the guards need to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSummary {
    pub kind: OperationKind,
    pub fields: Vec<String>,
}

impl OperationSummary {
    pub fn new(kind: OperationKind, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Summarizes the operation the executor will run. Unparseable or ambiguous documents
    /// select nothing; the executor reports those itself.
    pub fn from_query(query: &str, operation_name: Option<&str>) -> Self {
        match parse_query(query) {
            Ok(document) => Self::from_document(&document, operation_name),
            Err(error) => {
                tracing::debug!(%error, "operation did not parse");
                Self::new(OperationKind::Query, Vec::<String>::new())
            }
        }
    }

    pub fn from_document(document: &ExecutableDocument, operation_name: Option<&str>) -> Self {
        let operation = match (&document.operations, operation_name) {
            (DocumentOperations::Single(operation), _) => Some(operation),
            (DocumentOperations::Multiple(operations), Some(name)) => operations
                .iter()
                .find(|(candidate, _)| candidate.as_str() == name)
                .map(|(_, operation)| operation),
            (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => {
                operations.values().next()
            }
            (DocumentOperations::Multiple(_), None) => None,
        };
        let Some(operation) = operation else {
            return Self::new(OperationKind::Query, Vec::<String>::new());
        };

        let mut fields = Vec::new();
        let mut visited = HashSet::new();
        collect_root_fields(
            document,
            &operation.node.selection_set.node,
            &mut visited,
            &mut fields,
        );
        Self {
            kind: operation.node.ty.into(),
            fields,
        }
    }
}

fn collect_root_fields(
    document: &ExecutableDocument,
    selection_set: &SelectionSet,
    visited: &mut HashSet<String>,
    fields: &mut Vec<String>,
) {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                let name = field.node.name.node.to_string();
                if !fields.contains(&name) {
                    fields.push(name);
                }
            }
            Selection::InlineFragment(fragment) => {
                collect_root_fields(document, &fragment.node.selection_set.node, visited, fields);
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.node.fragment_name.node.to_string();
                if !visited.insert(name.clone()) {
                    continue;
                }
                if let Some(fragment) = document.fragments.get(name.as_str()) {
                    collect_root_fields(
                        document,
                        &fragment.node.selection_set.node,
                        visited,
                        fields,
                    );
                }
            }
        }
    }
}
