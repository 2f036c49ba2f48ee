//! # Pagination
//!
//! Operators see one-based page numbers; the backend speaks zero-based
//! pages. `PageRequest` stores the one-based form and is the only place the
//! translation happens, so call sites never do `page - 1` by hand.

use serde::Serialize;

use crate::error::CoreError;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A request for one page of a listing, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Build a request for one-based `page` with `size` items per page.
    ///
    /// # Errors
    ///
    /// Rejects `page == 0` and `size == 0`.
    pub fn new(page: u32, size: u32) -> Result<Self, CoreError> {
        if page == 0 {
            return Err(CoreError::InvalidPage(
                "page numbers start at 1".to_string(),
            ));
        }
        if size == 0 {
            return Err(CoreError::InvalidPage("page size must be positive".to_string()));
        }
        Ok(Self { page, size })
    }

    /// The first page with the given size.
    pub fn first(size: u32) -> Self {
        Self {
            page: 1,
            size: size.max(1),
        }
    }

    /// Rebuild a request from a zero-based wire page.
    pub fn from_wire(wire_page: u32, size: u32) -> Result<Self, CoreError> {
        let page = wire_page
            .checked_add(1)
            .ok_or_else(|| CoreError::InvalidPage(format!("wire page {wire_page} overflows")))?;
        Self::new(page, size)
    }

    /// One-based page number as presented to operators.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Zero-based page number sent to the backend.
    pub fn wire_page(&self) -> u32 {
        self.page - 1
    }

    /// Items per page.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The following page with the same size. `None` past `u32::MAX`.
    pub fn next(&self) -> Option<Self> {
        self.page.checked_add(1).map(|page| Self { page, size: self.size })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the backend's total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page, in display order.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// The request that produced this page.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// An empty page for `request`.
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            request,
        }
    }

    /// Number of pages needed to show `total` items.
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.request.size());
        self.total.div_ceil(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_ui_page_is_wire_page_zero() {
        let req = PageRequest::new(1, 10).unwrap();
        assert_eq!(req.wire_page(), 0);
    }

    #[test]
    fn zero_page_and_zero_size_rejected() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
    }

    #[test]
    fn next_keeps_size_and_stops_at_max() {
        let second = PageRequest::first(25).next().unwrap();
        assert_eq!(second.page(), 2);
        assert_eq!(second.wire_page(), 1);
        assert_eq!(second.size(), 25);
        assert!(PageRequest::new(u32::MAX, 5).unwrap().next().is_none());
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<u8> = Page {
            items: vec![],
            total: 21,
            request: PageRequest::new(1, 10).unwrap(),
        };
        assert_eq!(page.total_pages(), 3);
        assert_eq!(Page::<u8>::empty(PageRequest::default()).total_pages(), 0);
    }

    #[test]
    fn default_is_first_page_of_default_size() {
        let req = PageRequest::default();
        assert_eq!(req.page(), 1);
        assert_eq!(req.size(), DEFAULT_PAGE_SIZE);
    }
}
