//! Pagination plumbing shared by list endpoints.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 500;

/// Page parameters as sent by clients.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub page_size: u64,
}

impl PageRequest {
    /// Normalized page and size: page defaults to 1, size defaults to
    /// 20 and is capped at 500.
    pub fn normalized(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let page_size = match self.page_size {
            0 => DEFAULT_PAGE_SIZE,
            size if size > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            size => size,
        };
        (page, page_size)
    }

    /// Row offset for a LIMIT/OFFSET query.
    pub fn offset(self) -> u64 {
        let (page, page_size) = self.normalized();
        (page - 1) * page_size
    }

    /// Row limit for a LIMIT/OFFSET query.
    pub fn limit(self) -> u64 {
        self.normalized().1
    }
}

/// Page of results with totals.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub list: Vec<T>,
}

impl<T> PageResponse<T> {
    pub fn new(list: Vec<T>, total: u64, request: PageRequest) -> Self {
        let (page, page_size) = request.normalized();
        Self {
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
            list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_caps() {
        assert_eq!(PageRequest::default().normalized(), (1, 20));
        let oversized = PageRequest {
            page: 3,
            page_size: 9999,
        };
        assert_eq!(oversized.normalized(), (3, 500));
    }

    #[test]
    fn offset_computation() {
        let request = PageRequest {
            page: 3,
            page_size: 25,
        };
        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageResponse::new(vec![1, 2, 3], 41, PageRequest::default());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page_size, 20);
    }
}
