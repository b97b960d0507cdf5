use std::fmt;
use std::time::Instant;

use tracing::debug;

use crate::cell::parse_number;
use crate::column::{ColumnDescriptor, ColumnSet};

/// A named predicate on one column, as entered in a filter panel.
///
/// Bounds of a range filter are kept as the raw user text and parsed when the
/// filter is applied, so malformed input simply leaves that bound open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredFilter {
    Equals { key: String, value: String },
    Range { key: String, min: String, max: String },
}

impl StructuredFilter {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        StructuredFilter::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn range(key: impl Into<String>, min: impl Into<String>, max: impl Into<String>) -> Self {
        StructuredFilter::Range {
            key: key.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StructuredFilter::Equals { key, .. } | StructuredFilter::Range { key, .. } => key,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            StructuredFilter::Equals { value, .. } => value.trim().is_empty(),
            StructuredFilter::Range { min, max, .. } => {
                parse_number(min).is_none() && parse_number(max).is_none()
            }
        }
    }

    fn compile<'c, R>(&self, columns: &'c ColumnSet<R>) -> Option<Predicate<'c, R>> {
        if self.is_blank() {
            return None;
        }
        let column = columns.get(self.key())?;
        let predicate = match self {
            StructuredFilter::Equals { value, .. } => Predicate::Equals {
                column,
                expected: value.trim().to_lowercase(),
            },
            StructuredFilter::Range { min, max, .. } => Predicate::Range {
                column,
                min: parse_number(min),
                max: parse_number(max),
            },
        };
        Some(predicate)
    }
}

impl fmt::Display for StructuredFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredFilter::Equals { key, value } => write!(f, "{key} = {value}"),
            StructuredFilter::Range { key, min, max } => write!(f, "{key} in {min}..{max}"),
        }
    }
}

enum Predicate<'c, R> {
    Equals {
        column: &'c ColumnDescriptor<R>,
        expected: String,
    },
    Range {
        column: &'c ColumnDescriptor<R>,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl<R> Predicate<'_, R> {
    fn matches(&self, row: &R) -> bool {
        match self {
            Predicate::Equals { column, expected } => column.value(row).equals_lowercase(expected),
            Predicate::Range { column, min, max } => match column.value(row).as_number() {
                Some(v) => min.is_none_or(|lo| v >= lo) && max.is_none_or(|hi| v <= hi),
                None => false,
            },
        }
    }
}

/// Structured filters keyed by column; at most one filter per column key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList {
    filters: Vec<StructuredFilter>,
}

impl FilterList {
    pub fn new(filters: impl IntoIterator<Item = StructuredFilter>) -> Self {
        let mut list = Self::default();
        for filter in filters {
            list.set(filter);
        }
        list
    }

    pub fn set(&mut self, filter: StructuredFilter) {
        match self.filters.iter_mut().find(|f| f.key() == filter.key()) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StructuredFilter> {
        self.filters.iter().find(|f| f.key() == key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.key() != key);
        self.filters.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let had_any = !self.filters.is_empty();
        self.filters.clear();
        had_any
    }

    pub fn compacted(&self) -> Self {
        Self {
            filters: self.filters.iter().filter(|f| !f.is_blank()).cloned().collect(),
        }
    }

    pub fn as_slice(&self) -> &[StructuredFilter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether any filter would actually restrict rows.
    pub fn is_active(&self) -> bool {
        self.filters.iter().any(|f| !f.is_blank())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    search: String,
    filters: FilterList,
}

impl FilterState {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.search {
            return false;
        }
        self.search = text;
        true
    }

    pub fn filters(&self) -> &FilterList {
        &self.filters
    }

    pub fn replace_filters(&mut self, filters: FilterList) {
        self.filters = filters.compacted();
    }

    pub fn clear_filters(&mut self) -> bool {
        self.filters.clear()
    }

    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.filters.is_active()
    }

    pub fn apply<R>(&self, rows: &[R], columns: &ColumnSet<R>) -> Vec<usize> {
        apply(rows, columns, &self.search, self.filters.as_slice())
    }
}

/// Indices of the rows that match the free text and every structured filter.
///
/// Free text is a case-insensitive substring test against the search columns
/// of `columns`; a blank query matches everything. Filters are AND-combined;
/// blank filters and filters on unknown columns are skipped. Input order is
/// preserved.
pub fn apply<R>(
    rows: &[R],
    columns: &ColumnSet<R>,
    search: &str,
    filters: &[StructuredFilter],
) -> Vec<usize> {
    let start_time = Instant::now();
    let needle = search.trim().to_lowercase();
    let search_columns = if needle.is_empty() {
        Vec::new()
    } else {
        columns.search_columns()
    };
    let predicates: Vec<Predicate<'_, R>> =
        filters.iter().filter_map(|f| f.compile(columns)).collect();

    let matches: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            (needle.is_empty()
                || search_columns
                    .iter()
                    .any(|c| c.value(row).contains_lowercase(&needle)))
                && predicates.iter().all(|p| p.matches(row))
        })
        .map(|(idx, _)| idx)
        .collect();

    debug!(
        "Filter matched {} of {} rows ({} predicates) in {}us",
        matches.len(),
        rows.len(),
        predicates.len(),
        start_time.elapsed().as_micros()
    );
    matches
}

pub fn matching_rows<'r, R>(
    rows: &'r [R],
    columns: &ColumnSet<R>,
    search: &str,
    filters: &[StructuredFilter],
) -> Vec<&'r R> {
    apply(rows, columns, search, filters)
        .into_iter()
        .map(|idx| &rows[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[derive(Debug, PartialEq)]
    struct Account {
        name: &'static str,
        city: &'static str,
        status: &'static str,
        balance: f64,
    }

    fn accounts() -> Vec<Account> {
        vec![
            Account { name: "Acme Corp", city: "Berlin", status: "Active", balance: 1200.0 },
            Account { name: "Globex", city: "Acmeville", status: "Closed", balance: 50.0 },
            Account { name: "Initech", city: "Austin", status: "active", balance: 300.0 },
            Account { name: "Umbrella", city: "Raccoon", status: "Active", balance: -20.0 },
        ]
    }

    fn columns(search_name_only: bool) -> ColumnSet<Account> {
        ColumnSet::new(vec![
            ColumnDescriptor::new("name", "Name", |a: &Account| a.name.into())
                .searchable(search_name_only),
            ColumnDescriptor::new("city", "City", |a: &Account| a.city.into()),
            ColumnDescriptor::new("status", "Status", |a: &Account| a.status.into()),
            ColumnDescriptor::new("balance", "Balance", |a: &Account| a.balance.into()),
            ColumnDescriptor::new("note", "Note", |_: &Account| CellValue::Empty),
        ])
        .unwrap()
    }

    #[test]
    fn empty_query_and_no_filters_is_identity() {
        let rows = accounts();
        assert_eq!(apply(&rows, &columns(false), "", &[]), vec![0, 1, 2, 3]);
        assert_eq!(apply(&rows, &columns(false), "   ", &[]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn search_respects_searchable_columns() {
        let rows = accounts();
        assert_eq!(apply(&rows, &columns(false), "ACME", &[]), vec![0, 1]);
        assert_eq!(apply(&rows, &columns(true), "acme", &[]), vec![0]);
    }

    #[test]
    fn equality_filter_ignores_case_and_blank_is_noop() {
        let rows = accounts();
        let cols = columns(false);
        let active = [StructuredFilter::equals("status", "ACTIVE")];
        assert_eq!(apply(&rows, &cols, "", &active), vec![0, 2, 3]);

        let blank = [StructuredFilter::equals("status", "  ")];
        assert_eq!(apply(&rows, &cols, "", &blank), vec![0, 1, 2, 3]);
    }

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        let rows = accounts();
        let cols = columns(false);
        let both = [StructuredFilter::range("balance", "50", "300")];
        assert_eq!(apply(&rows, &cols, "", &both), vec![1, 2]);

        let min_only = [StructuredFilter::range("balance", "300", "")];
        assert_eq!(apply(&rows, &cols, "", &min_only), vec![0, 2]);

        let max_only = [StructuredFilter::range("balance", "", "0")];
        assert_eq!(apply(&rows, &cols, "", &max_only), vec![3]);
    }

    #[test]
    fn malformed_bound_is_ignored() {
        let rows = accounts();
        let cols = columns(false);
        let filters = [StructuredFilter::range("balance", "abc", "100")];
        assert_eq!(apply(&rows, &cols, "", &filters), vec![1, 3]);

        let all_bad = [StructuredFilter::range("balance", "x", "y")];
        assert!(all_bad[0].is_blank());
        assert_eq!(apply(&rows, &cols, "", &all_bad).len(), 4);
    }

    #[test]
    fn range_rejects_non_numeric_cells() {
        let rows = accounts();
        let filters = [StructuredFilter::range("note", "0", "")];
        assert!(apply(&rows, &columns(false), "", &filters).is_empty());
    }

    #[test]
    fn unknown_keys_are_skipped_and_filters_combine_with_and() {
        let rows = accounts();
        let cols = columns(false);
        let filters = [
            StructuredFilter::equals("missing", "x"),
            StructuredFilter::equals("status", "active"),
            StructuredFilter::range("balance", "0", ""),
        ];
        assert_eq!(apply(&rows, &cols, "", &filters), vec![0, 2]);
        let hits = matching_rows(&rows, &cols, "in", &filters);
        assert_eq!(hits, vec![&rows[0], &rows[2]]);
    }

    #[test]
    fn filter_list_keeps_one_filter_per_key() {
        let mut list = FilterList::default();
        list.set(StructuredFilter::equals("status", "active"));
        list.set(StructuredFilter::range("status", "1", "2"));
        list.set(StructuredFilter::equals("city", ""));
        assert_eq!(list.len(), 2);
        assert!(matches!(list.get("status"), Some(StructuredFilter::Range { .. })));
        assert_eq!(list.compacted().len(), 1);
        assert!(list.remove("city"));
        assert!(!list.remove("city"));
        assert!(list.clear());
        assert!(!list.is_active());
    }

    #[test]
    fn filter_state_tracks_activity() {
        let mut state = FilterState::default();
        assert!(!state.is_active());
        assert!(state.set_search("acme"));
        assert!(!state.set_search("acme"));
        assert!(state.is_active());
        state.set_search("");
        state.replace_filters(FilterList::new([StructuredFilter::equals("status", " ")]));
        assert!(state.filters().is_empty());
        assert!(!state.is_active());
    }
}
