use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::cell::CellValue;
use crate::domain::GridError;

type Accessor<R> = Arc<dyn Fn(&R) -> CellValue>;
type Formatter<R> = Arc<dyn Fn(&R) -> String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// One displayable field of a row of type `R`.
///
/// The accessor is typed on the row, so a column can only read fields the row
/// actually has. The `key` identifies the column for visibility, sorting and
/// structured filters.
pub struct ColumnDescriptor<R> {
    key: String,
    header: String,
    align: Align,
    sortable: bool,
    searchable: bool,
    accessor: Accessor<R>,
    formatter: Option<Formatter<R>>,
}

impl<R> ColumnDescriptor<R> {
    pub fn new(
        key: impl Into<String>,
        header: impl Into<String>,
        accessor: impl Fn(&R) -> CellValue + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            align: Align::Left,
            sortable: false,
            searchable: false,
            accessor: Arc::new(accessor),
            formatter: None,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Custom cell renderer; replaces the default text of the cell value.
    pub fn formatter(mut self, formatter: impl Fn(&R) -> String + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn alignment(&self) -> Align {
        self.align
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    pub fn display(&self, row: &R) -> String {
        match &self.formatter {
            Some(format) => format(row),
            None => self.value(row).to_string(),
        }
    }
}

impl<R> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            align: self.align,
            sortable: self.sortable,
            searchable: self.searchable,
            accessor: Arc::clone(&self.accessor),
            formatter: self.formatter.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("align", &self.align)
            .field("sortable", &self.sortable)
            .field("searchable", &self.searchable)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// The declared columns of a grid. Keys are unique and the set never changes
/// after construction.
pub struct ColumnSet<R> {
    columns: Arc<[ColumnDescriptor<R>]>,
}

impl<R> ColumnSet<R> {
    pub fn new(columns: Vec<ColumnDescriptor<R>>) -> Result<Self, GridError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.key()) {
                return Err(GridError::DuplicateColumn(column.key().to_string()));
            }
        }
        Ok(Self {
            columns: columns.into(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor<R>> {
        self.columns.iter().find(|c| c.key() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor<R>> {
        self.columns.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns used for free-text search: the ones marked searchable, or all
    /// of them when none is marked.
    pub fn search_columns(&self) -> Vec<&ColumnDescriptor<R>> {
        let marked: Vec<_> = self.columns.iter().filter(|c| c.is_searchable()).collect();
        if marked.is_empty() {
            self.columns.iter().collect()
        } else {
            marked
        }
    }
}

impl<R> Clone for ColumnSet<R> {
    fn clone(&self) -> Self {
        Self {
            columns: Arc::clone(&self.columns),
        }
    }
}

impl<R> fmt::Debug for ColumnSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}

impl<'a, R> IntoIterator for &'a ColumnSet<R> {
    type Item = &'a ColumnDescriptor<R>;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
