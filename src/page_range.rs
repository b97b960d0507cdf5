use std::fmt;

/// Pages shown on each side of the current page.
pub const DEFAULT_DELTA: usize = 1;

/// One entry of the abbreviated page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabel {
    Page(usize),
    Ellipsis,
}

impl PageLabel {
    pub fn page(&self) -> Option<usize> {
        match self {
            PageLabel::Page(p) => Some(*p),
            PageLabel::Ellipsis => None,
        }
    }
}

impl fmt::Display for PageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLabel::Page(p) => write!(f, "{p}"),
            PageLabel::Ellipsis => f.write_str("..."),
        }
    }
}

/// Compute the compact page list for `current` out of `total` pages.
///
/// Page 1 and page `total` are always present, the window
/// `[current - delta, current + delta]` is shown, and each gap collapses into a
/// single ellipsis. `current` is clamped into `1..=total`; `total == 0` yields
/// an empty list.
pub fn compute_range(current: usize, total: usize, delta: usize) -> Vec<PageLabel> {
    if total == 0 {
        return Vec::new();
    }
    if total == 1 {
        return vec![PageLabel::Page(1)];
    }

    let current = current.clamp(1, total);
    let left = current.saturating_sub(delta).max(2);
    let right = current.saturating_add(delta).min(total - 1);

    let mut labels = Vec::with_capacity(right.saturating_sub(left) + 5);
    labels.push(PageLabel::Page(1));
    if left > 2 {
        labels.push(PageLabel::Ellipsis);
    }
    labels.extend((left..=right).map(PageLabel::Page));
    if right < total - 1 {
        labels.push(PageLabel::Ellipsis);
    }
    labels.push(PageLabel::Page(total));
    labels
}
