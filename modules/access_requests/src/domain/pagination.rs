use crate::contract::model::{Identity, PendingPage};
use crate::domain::error::DomainError;

/// Validated 1-based page request over the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Reject `page < 1`, `page_size < 1` and `page_size > max_page_size`.
    pub fn new(page: u64, page_size: u64, max_page_size: u64) -> Result<Self, DomainError> {
        if page < 1 {
            return Err(DomainError::invalid_input("page", "must be at least 1"));
        }
        if page_size < 1 {
            return Err(DomainError::invalid_input("page_size", "must be at least 1"));
        }
        if page_size > max_page_size {
            return Err(DomainError::invalid_input(
                "page_size",
                format!("must not exceed {max_page_size}"),
            ));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Wrap a store slice into a page envelope. Pages past the end stay empty
    /// but keep the real totals.
    pub fn assemble(&self, items: Vec<Identity>, total_count: u64) -> PendingPage {
        PendingPage {
            items,
            page: self.page,
            page_size: self.page_size,
            total_count,
            total_pages: total_pages(total_count, self.page_size),
        }
    }
}

pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(10, 4), 3);
    }

    #[test]
    fn offsets_are_page_aligned() {
        assert_eq!(PageRequest::new(1, 4, 100).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(2, 4, 100).unwrap().offset(), 4);
        assert_eq!(PageRequest::new(5, 10, 100).unwrap().offset(), 40);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        for (page, size) in [(0, 10), (1, 0), (1, 101)] {
            let err = PageRequest::new(page, size, 100).unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput { .. }), "{page}/{size}");
        }
    }

    #[test]
    fn page_past_the_end_keeps_totals() {
        let req = PageRequest::new(5, 10, 100).unwrap();
        let page = req.assemble(vec![], 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 10);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }
}
