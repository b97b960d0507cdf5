use std::io;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use thiserror::Error;

use crate::filter::StructuredFilter;
use crate::overlay::{Dismissal, GlobalEvent, OverlayKind};
use crate::page_range::DEFAULT_DELTA;
use crate::pagination::{
    DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS, PageChange, PaginationPolicy,
};
use crate::sort::SortState;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("column key `{0}` is declared more than once")]
    DuplicateColumn(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("unknown file type: {}", .0.display())]
    UnknownFileType(PathBuf),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, Setters)]
pub struct GridConfig {
    pub page_size: usize,
    /// 1-based; clamped once rows are known.
    pub initial_page: usize,
    /// Starting visible subset; all columns when unset.
    #[setters(strip_option)]
    pub initial_visible_columns: Option<Vec<String>>,
    #[setters(strip_option)]
    pub initial_sort: Option<SortState>,
    #[setters(into)]
    pub search_placeholder: String,
    /// Search box (and the add action, when enabled).
    pub toolbar: bool,
    pub add_action: bool,
    pub column_selector: bool,
    pub structured_filters: bool,
    pub pagination_policy: PaginationPolicy,
    pub page_size_options: Vec<usize>,
    /// Pages shown on each side of the current page.
    pub page_delta: usize,
    #[setters(into)]
    pub empty_message: String,
    #[setters(into)]
    pub no_match_message: String,
    #[setters(into)]
    pub no_columns_message: String,
    #[setters(into)]
    pub loading_message: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            initial_page: 1,
            initial_visible_columns: None,
            initial_sort: None,
            search_placeholder: "Search...".to_string(),
            toolbar: true,
            add_action: false,
            column_selector: true,
            structured_filters: false,
            pagination_policy: PaginationPolicy::MultiplePages,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            page_delta: DEFAULT_DELTA,
            empty_message: "No data found".to_string(),
            no_match_message: "No rows match your filter".to_string(),
            no_columns_message: "No columns found".to_string(),
            loading_message: "Loading...".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    GoToPage(usize),
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    SetPageSize(usize),
    ToggleColumn(String),
    ShowAllColumns,
    HideAllColumns,
    SetSearchText(String),
    SortBy(String),
    ToggleSort,
    Add,
    OpenOverlay(OverlayKind),
    CloseOverlay(OverlayKind),
    SetPickerQuery(String),
    SetDraftFilter(StructuredFilter),
    RemoveDraftFilter(String),
    ApplyFilters,
    CancelFilters,
    ResetFilters,
    Global(GlobalEvent),
}

/// Notifications for the host, drained with `GridModel::take_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    PageChanged(PageChange),
    PageSizeChanged { from: usize, to: usize },
    ColumnVisibilityChanged { visible: Vec<String> },
    SearchTextChanged(String),
    SortChanged(SortState),
    AddClicked,
    FiltersApplied(Vec<StructuredFilter>),
    FiltersReset,
    OverlayOpened(OverlayKind),
    OverlayClosed(OverlayKind, Dismissal),
}
