use serde::Serialize;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

/// Skip/limit pagination window for listing queries.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub skip: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated listing envelope returned by repository list queries.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Apply a window to an already-filtered, already-ordered result set.
    pub fn from_filtered(filtered: Vec<T>, request: PageRequest) -> Self {
        let total = filtered.len();
        let items = filtered
            .into_iter()
            .skip(request.skip)
            .take(request.limit)
            .collect();

        Self {
            items,
            total,
            page: request.skip / request.limit + 1,
            page_size: request.limit,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_limit() {
        let request = PageRequest::new(0, 500);
        assert_eq!(request.limit, MAX_PAGE_SIZE);
        let request = PageRequest::new(0, 0);
        assert_eq!(request.limit, 1);
    }

    #[test]
    fn from_filtered_windows_and_counts() {
        let page = Page::from_filtered((0..12).collect(), PageRequest::new(5, 5));
        assert_eq!(page.items, vec![5, 6, 7, 8, 9]);
        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 5);
    }
}
