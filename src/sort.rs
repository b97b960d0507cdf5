use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::cell::CellValue;
use crate::column::ColumnDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn orient(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

/// The single active sort of a grid.
///
/// Before the first request there is no sort and rows keep their input order.
/// Once a field is selected there is always a direction; toggling only flips it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortToggle {
    state: Option<SortState>,
}

impl SortToggle {
    pub fn new(initial: Option<SortState>) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> Option<&SortState> {
        self.state.as_ref()
    }

    /// Flip the direction of the active sort. Nothing happens while unsorted.
    pub fn toggle(&mut self) -> Option<&SortState> {
        let state = self.state.as_mut()?;
        state.direction = state.direction.flipped();
        trace!("Sort {} now {}", state.field, state.direction);
        Some(state)
    }

    /// Select `field`: a new field starts ascending, the active field flips.
    pub fn sort_by(&mut self, field: &str) -> &SortState {
        let next = match self.state.take() {
            Some(current) if current.field == field => SortState {
                direction: current.direction.flipped(),
                ..current
            },
            _ => SortState::ascending(field),
        };
        trace!("Sort {} {}", next.field, next.direction);
        self.state.insert(next)
    }
}

pub fn comparator<R>(
    column: &ColumnDescriptor<R>,
    direction: SortDirection,
) -> impl Fn(&R, &R) -> Ordering + '_ {
    move |a, b| direction.orient(column.value(a).compare(&column.value(b)))
}

/// Stably reorder `indices` (positions into `rows`) by `column`.
pub fn sort_indices<R>(
    rows: &[R],
    indices: &mut Vec<usize>,
    column: &ColumnDescriptor<R>,
    direction: SortDirection,
) {
    // read each key once; sort_by is stable so ties keep input order
    let mut keyed: Vec<(usize, CellValue)> = indices
        .iter()
        .map(|&idx| (idx, column.value(&rows[idx])))
        .collect();
    keyed.sort_by(|(_, a), (_, b)| direction.orient(a.compare(b)));
    *indices = keyed.into_iter().map(|(idx, _)| idx).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        label: &'static str,
        qty: Option<f64>,
    }

    fn qty_column() -> ColumnDescriptor<Line> {
        ColumnDescriptor::new("qty", "Qty", |l: &Line| l.qty.into()).sortable(true)
    }

    fn lines() -> Vec<Line> {
        vec![
            Line { label: "a", qty: Some(3.0) },
            Line { label: "b", qty: Some(1.0) },
            Line { label: "c", qty: None },
            Line { label: "d", qty: Some(3.0) },
            Line { label: "e", qty: Some(1.0) },
        ]
    }

    fn labels(rows: &[Line], indices: &[usize]) -> String {
        indices.iter().map(|&i| rows[i].label).collect()
    }

    #[test]
    fn toggle_requires_an_active_sort() {
        let mut sort = SortToggle::default();
        assert!(sort.toggle().is_none());
        sort.sort_by("qty");
        assert_eq!(sort.toggle().map(|s| s.direction), Some(SortDirection::Descending));
        assert_eq!(sort.toggle().map(|s| s.direction), Some(SortDirection::Ascending));
    }

    #[test]
    fn sort_by_starts_ascending_and_flips_on_repeat() {
        let mut sort = SortToggle::new(Some(SortState::descending("qty")));
        assert_eq!(sort.sort_by("label"), &SortState::ascending("label"));
        assert_eq!(sort.sort_by("label"), &SortState::descending("label"));
        assert_eq!(sort.sort_by("qty"), &SortState::ascending("qty"));
    }

    #[test]
    fn sorting_is_stable_in_both_directions() {
        let rows = lines();
        let column = qty_column();
        let mut indices: Vec<usize> = (0..rows.len()).collect();

        sort_indices(&rows, &mut indices, &column, SortDirection::Ascending);
        assert_eq!(labels(&rows, &indices), "beadc");

        let mut desc: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&rows, &mut desc, &column, SortDirection::Descending);
        assert_eq!(labels(&rows, &desc), "cadbe");
    }

    #[test]
    fn comparator_follows_direction() {
        let rows = lines();
        let column = qty_column();
        let asc = comparator(&column, SortDirection::Ascending);
        let desc = comparator(&column, SortDirection::Descending);
        assert_eq!(asc(&rows[1], &rows[0]), Ordering::Less);
        assert_eq!(desc(&rows[1], &rows[0]), Ordering::Greater);
        assert_eq!(asc(&rows[0], &rows[3]), Ordering::Equal);
    }
}
