use crate::shared::infrastructure::connection::{ConnectionPlugin, ModelExtensions};
use crate::shared::infrastructure::document_store::SortBy;

/// Offset/limit pagination for every model on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginate {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for Paginate {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl ConnectionPlugin for Paginate {
    fn attach(self, extensions: &mut ModelExtensions) {
        extensions.set_pagination(self);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<SortBy>,
}

impl PageRequest {
    pub fn page(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: SortBy) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub skip: u64,
    pub limit: u64,
}

impl Paginate {
    /// An explicit offset wins over a page number.
    pub fn window(&self, request: &PageRequest) -> PageWindow {
        let limit = request
            .limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1));
        match request.offset {
            Some(offset) => PageWindow {
                page: offset / limit + 1,
                skip: offset,
                limit,
            },
            None => {
                let page = request.page.unwrap_or(1).max(1);
                PageWindow {
                    page,
                    skip: (page - 1).saturating_mul(limit),
                    limit,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
    pub paging_counter: u64,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, window: PageWindow) -> Self {
        let total_pages = total_docs.div_ceil(window.limit).max(1);
        let has_prev_page = window.page > 1;
        let has_next_page = window.page < total_pages;
        Self {
            docs,
            total_docs,
            limit: window.limit,
            page: window.page,
            total_pages,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| window.page - 1),
            next_page: has_next_page.then(|| window.page + 1),
            paging_counter: window.skip + 1,
            offset: window.skip,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
            paging_counter: self.paging_counter,
            offset: self.offset,
        }
    }
}
