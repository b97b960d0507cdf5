use std::collections::HashSet;

use tracing::trace;

use crate::column::{ColumnDescriptor, ColumnSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry<'a> {
    pub key: &'a str,
    pub header: &'a str,
    pub visible: bool,
}

/// The subset of declared column keys currently shown.
///
/// Keys that are not declared are never stored, so the visible set is always a
/// subset of the declared keys. Iteration follows declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnVisibility {
    all: Vec<String>,
    visible: HashSet<String>,
}

impl ColumnVisibility {
    /// Everything visible unless `initial` names the starting subset.
    pub fn new<'k>(
        all: impl IntoIterator<Item = &'k str>,
        initial: Option<&[String]>,
    ) -> Self {
        let all: Vec<String> = all.into_iter().map(str::to_string).collect();
        let visible = match initial {
            Some(keys) => keys
                .iter()
                .filter(|k| all.contains(*k))
                .cloned()
                .collect(),
            None => all.iter().cloned().collect(),
        };
        Self { all, visible }
    }

    pub fn for_columns<R>(columns: &ColumnSet<R>, initial: Option<&[String]>) -> Self {
        Self::new(columns.keys(), initial)
    }

    /// Flip one column. Unknown keys are ignored and report `false`.
    pub fn toggle(&mut self, key: &str) -> bool {
        if !self.all.iter().any(|k| k == key) {
            trace!("Ignoring toggle of unknown column {key}");
            return false;
        }
        if !self.visible.remove(key) {
            self.visible.insert(key.to_string());
        }
        true
    }

    pub fn show_all(&mut self) -> bool {
        if self.all_visible() {
            return false;
        }
        self.visible = self.all.iter().cloned().collect();
        true
    }

    pub fn hide_all(&mut self) -> bool {
        if self.visible.is_empty() {
            return false;
        }
        self.visible.clear();
        true
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visible.contains(key)
    }

    pub fn visible_keys(&self) -> impl Iterator<Item = &str> {
        self.all
            .iter()
            .filter(|k| self.visible.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn all_visible(&self) -> bool {
        self.visible.len() == self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn select<'a, R>(&self, columns: &'a ColumnSet<R>) -> Vec<&'a ColumnDescriptor<R>> {
        columns
            .iter()
            .filter(|c| self.visible.contains(c.key()))
            .collect()
    }

    /// Picker entries whose header contains `query`, ignoring case.
    /// A blank query lists every column. The visible set is not touched.
    pub fn filter_by_label<'a, R>(
        &self,
        columns: &'a ColumnSet<R>,
        query: &str,
    ) -> Vec<PickerEntry<'a>> {
        let needle = query.trim().to_lowercase();
        columns
            .iter()
            .filter(|c| needle.is_empty() || c.header().to_lowercase().contains(&needle))
            .map(|c| PickerEntry {
                key: c.key(),
                header: c.header(),
                visible: self.is_visible(c.key()),
            })
            .collect()
    }
}
