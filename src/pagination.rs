use std::fmt;
use std::ops::Range;

use tracing::trace;

use crate::page_range::{PageLabel, compute_range};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeChange {
    pub from: usize,
    pub to: usize,
    /// Set when the current page had to be clamped into the new range.
    pub page: Option<PageChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationPolicy {
    #[default]
    MultiplePages,
    AnyItems,
}

/// 1-based inclusive item range of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRange {
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl fmt::Display for SummaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {}-{} of {}", self.start, self.end, self.total)
    }
}

/// Owns the current page, the page size and the item count.
///
/// Requests outside the valid range are clamped, never rejected. Every
/// mutation reports what changed so the caller can notify its host; a request
/// that changes nothing reports `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    current_page: usize,
    page_size: usize,
    total_items: usize,
    page_size_options: Vec<usize>,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

impl PaginationController {
    pub fn new(page_size: usize, total_items: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
        }
    }

    pub fn with_current_page(mut self, page: usize) -> Self {
        self.current_page = self.clamp_page(page);
        self
    }

    pub fn with_page_size_options(mut self, options: Vec<usize>) -> Self {
        self.page_size_options = options.into_iter().filter(|&n| n > 0).collect();
        self
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages().max(1))
    }

    pub fn go_to_page(&mut self, page: usize) -> Option<PageChange> {
        let target = self.clamp_page(page);
        if target == self.current_page {
            return None;
        }
        let change = PageChange {
            from: self.current_page,
            to: target,
        };
        self.current_page = target;
        trace!("Page {} -> {}", change.from, change.to);
        Some(change)
    }

    pub fn first_page(&mut self) -> Option<PageChange> {
        self.go_to_page(1)
    }

    pub fn previous_page(&mut self) -> Option<PageChange> {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn next_page(&mut self) -> Option<PageChange> {
        self.go_to_page(self.current_page.saturating_add(1))
    }

    pub fn last_page(&mut self) -> Option<PageChange> {
        self.go_to_page(self.total_pages())
    }

    /// Replace the page size and clamp the current page to the new maximum.
    /// A size of zero is treated as one.
    pub fn set_page_size(&mut self, size: usize) -> Option<PageSizeChange> {
        let size = size.max(1);
        if size == self.page_size {
            return None;
        }
        let from = self.page_size;
        self.page_size = size;
        let page = self.go_to_page(self.current_page);
        trace!("Page size {} -> {}", from, size);
        Some(PageSizeChange {
            from,
            to: size,
            page,
        })
    }

    pub fn set_total_items(&mut self, total: usize) -> Option<PageChange> {
        self.total_items = total;
        self.go_to_page(self.current_page)
    }

    /// Item range of the current page, or `None` when there are no items.
    pub fn summary_range(&self) -> Option<SummaryRange> {
        if self.total_items == 0 {
            return None;
        }
        let bounds = self.page_bounds();
        Some(SummaryRange {
            start: bounds.start + 1,
            end: bounds.end,
            total: self.total_items,
        })
    }

    /// 0-based slice range of the current page into the item list.
    pub fn page_bounds(&self) -> Range<usize> {
        let start = (self.current_page - 1)
            .saturating_mul(self.page_size)
            .min(self.total_items);
        let end = start.saturating_add(self.page_size).min(self.total_items);
        start..end
    }

    pub fn page_labels(&self, delta: usize) -> Vec<PageLabel> {
        compute_range(self.current_page, self.total_pages(), delta)
    }

    pub fn should_display(&self, policy: PaginationPolicy) -> bool {
        match policy {
            PaginationPolicy::MultiplePages => self.total_pages() > 1,
            PaginationPolicy::AnyItems => self.total_items > 0,
        }
    }
}
