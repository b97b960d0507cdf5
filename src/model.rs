use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use crate::column::{ColumnDescriptor, ColumnSet};
use crate::domain::{GridConfig, GridError, GridEvent, Message};
use crate::filter::{FilterList, FilterState, StructuredFilter};
use crate::overlay::{DismissListeners, Dismissal, GlobalEvent, Overlay, OverlayKind};
use crate::page_range::PageLabel;
use crate::pagination::{PageChange, PaginationController, SummaryRange};
use crate::sort::{SortState, SortToggle, sort_indices};
use crate::visibility::{ColumnVisibility, PickerEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState<'a> {
    /// Rows are not available yet; nothing else is rendered.
    Loading { message: &'a str },
    /// Every column is hidden; a single fallback cell keeps the table valid.
    NoColumns { message: &'a str, colspan: usize },
    Empty { message: &'a str },
    Rows,
}

#[derive(Debug)]
pub struct PageRow<'a, R> {
    pub index: usize,
    pub row: &'a R,
}

impl<R> Clone for PageRow<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for PageRow<'_, R> {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarView<'a> {
    pub search_text: &'a str,
    pub placeholder: &'a str,
    pub add_action: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerView<'a> {
    pub query: &'a str,
    pub entries: Vec<PickerEntry<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPanelView<'a> {
    pub draft: &'a [StructuredFilter],
}

/// Read model of a grid: visible columns × the current page of the filtered,
/// sorted rows, plus pagination and overlay state.
#[derive(Debug)]
pub struct GridView<'a, R> {
    pub state: ViewState<'a>,
    pub visible_columns: Vec<&'a ColumnDescriptor<R>>,
    pub page_rows: Vec<PageRow<'a, R>>,
    pub summary: Option<SummaryRange>,
    pub page_labels: Vec<PageLabel>,
    pub pagination_visible: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub page_size_options: &'a [usize],
    pub toolbar: Option<ToolbarView<'a>>,
    pub sort: Option<&'a SortState>,
    pub active_filters: &'a [StructuredFilter],
    pub column_picker: Option<PickerView<'a>>,
    pub filter_panel: Option<FilterPanelView<'a>>,
}

impl<R> GridView<'_, R> {
    pub fn cell_text(&self, row: &PageRow<'_, R>, column: &ColumnDescriptor<R>) -> String {
        column.display(row.row)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading { .. })
    }
}

/// Composes pagination, column visibility, filtering, sorting and the overlays
/// over one externally owned row set.
///
/// The working set is always filter → sort; pagination selects a slice of it.
/// Rows and columns are never mutated.
pub struct GridModel<R> {
    config: GridConfig,
    columns: ColumnSet<R>,
    rows: Option<Arc<[R]>>,
    visibility: ColumnVisibility,
    pagination: PaginationController,
    sort: SortToggle,
    filters: FilterState,
    draft: FilterList,
    picker: Overlay,
    filter_panel: Overlay,
    listeners: DismissListeners,
    working: Vec<usize>,
    pending_page: Option<usize>,
    events: Vec<GridEvent>,
}

impl<R> GridModel<R> {
    /// `rows == None` means the rows are still loading.
    pub fn new(
        columns: Vec<ColumnDescriptor<R>>,
        rows: Option<Arc<[R]>>,
        config: GridConfig,
    ) -> Result<Self, GridError> {
        let columns = ColumnSet::new(columns)?;
        let visibility =
            ColumnVisibility::for_columns(&columns, config.initial_visible_columns.as_deref());
        let sort = SortToggle::new(config.initial_sort.clone().filter(|s| {
            columns
                .get(&s.field)
                .is_some_and(ColumnDescriptor::is_sortable)
        }));
        let pagination = PaginationController::new(config.page_size, 0)
            .with_page_size_options(config.page_size_options.clone());

        let mut model = Self {
            pending_page: Some(config.initial_page),
            config,
            columns,
            rows,
            visibility,
            pagination,
            sort,
            filters: FilterState::default(),
            draft: FilterList::default(),
            picker: Overlay::new(OverlayKind::ColumnPicker),
            filter_panel: Overlay::new(OverlayKind::FilterPanel),
            listeners: DismissListeners::default(),
            working: Vec::new(),
            events: Vec::new(),
        };
        model.recompute();
        model.apply_pending_page();
        model.events.clear();
        debug!(
            "Grid created with {} columns, {} rows",
            model.columns.len(),
            model.rows.as_ref().map_or(0, |r| r.len())
        );
        Ok(model)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &ColumnSet<R> {
        &self.columns
    }

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.state()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn draft_filters(&self) -> &FilterList {
        &self.draft
    }

    pub fn listeners(&self) -> &DismissListeners {
        &self.listeners
    }

    pub fn overlay(&self, kind: OverlayKind) -> &Overlay {
        match kind {
            OverlayKind::ColumnPicker => &self.picker,
            OverlayKind::FilterPanel => &self.filter_panel,
        }
    }

    /// Filtered and sorted row positions, before pagination.
    pub fn working_rows(&self) -> &[usize] {
        &self.working
    }

    pub fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_rows(&mut self, rows: Option<Arc<[R]>>) {
        self.rows = rows;
        self.recompute();
        self.apply_pending_page();
    }

    /// Dispatch one user action. Returns whether anything changed.
    pub fn update(&mut self, message: Message) -> bool {
        trace!("Update: {message:?}");
        match message {
            Message::GoToPage(page) => self.go_to_page(page),
            Message::FirstPage => self.first_page(),
            Message::PreviousPage => self.previous_page(),
            Message::NextPage => self.next_page(),
            Message::LastPage => self.last_page(),
            Message::SetPageSize(size) => self.set_page_size(size),
            Message::ToggleColumn(key) => self.toggle_column(&key),
            Message::ShowAllColumns => self.show_all_columns(),
            Message::HideAllColumns => self.hide_all_columns(),
            Message::SetSearchText(text) => self.set_search_text(text),
            Message::SortBy(key) => self.sort_by(&key),
            Message::ToggleSort => self.toggle_sort(),
            Message::Add => self.click_add(),
            Message::OpenOverlay(kind) => self.open_overlay(kind),
            Message::CloseOverlay(kind) => self.close_overlay(kind, Dismissal::Close),
            Message::SetPickerQuery(text) => self.set_picker_query(text),
            Message::SetDraftFilter(filter) => self.set_draft_filter(filter),
            Message::RemoveDraftFilter(key) => self.remove_draft_filter(&key),
            Message::ApplyFilters => self.apply_filters(),
            Message::CancelFilters => self.cancel_filters(),
            Message::ResetFilters => self.reset_filters(),
            Message::Global(event) => self.dispatch_global(event),
        }
    }

    // -------------------- Pagination ---------------------- //

    fn page_moved(&mut self, change: Option<PageChange>) -> bool {
        match change {
            Some(change) => {
                self.events.push(GridEvent::PageChanged(change));
                true
            }
            None => false,
        }
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let change = self.pagination.go_to_page(page);
        self.page_moved(change)
    }

    pub fn first_page(&mut self) -> bool {
        let change = self.pagination.first_page();
        self.page_moved(change)
    }

    pub fn previous_page(&mut self) -> bool {
        let change = self.pagination.previous_page();
        self.page_moved(change)
    }

    pub fn next_page(&mut self) -> bool {
        let change = self.pagination.next_page();
        self.page_moved(change)
    }

    pub fn last_page(&mut self) -> bool {
        let change = self.pagination.last_page();
        self.page_moved(change)
    }

    pub fn set_page_size(&mut self, size: usize) -> bool {
        let Some(change) = self.pagination.set_page_size(size) else {
            return false;
        };
        self.events.push(GridEvent::PageSizeChanged {
            from: change.from,
            to: change.to,
        });
        self.page_moved(change.page);
        true
    }

    fn apply_pending_page(&mut self) {
        if self.rows.is_none() {
            return;
        }
        if let Some(page) = self.pending_page.take() {
            self.go_to_page(page);
        }
    }

    // -------------------- Columns ---------------------- //

    fn visibility_changed(&mut self) {
        let visible = self.visibility.visible_keys().map(str::to_string).collect();
        self.events
            .push(GridEvent::ColumnVisibilityChanged { visible });
    }

    pub fn toggle_column(&mut self, key: &str) -> bool {
        if !self.config.column_selector || !self.visibility.toggle(key) {
            return false;
        }
        self.visibility_changed();
        true
    }

    pub fn show_all_columns(&mut self) -> bool {
        if !self.config.column_selector || !self.visibility.show_all() {
            return false;
        }
        self.visibility_changed();
        true
    }

    pub fn hide_all_columns(&mut self) -> bool {
        if !self.config.column_selector || !self.visibility.hide_all() {
            return false;
        }
        self.visibility_changed();
        true
    }

    pub fn set_picker_query(&mut self, query: impl Into<String>) -> bool {
        self.picker.set_text(query)
    }

    // -------------------- Search, filters, sort ---------------------- //

    pub fn set_search_text(&mut self, text: impl Into<String>) -> bool {
        if !self.config.toolbar {
            return false;
        }
        let text = text.into();
        if !self.filters.set_search(text.clone()) {
            return false;
        }
        self.events.push(GridEvent::SearchTextChanged(text));
        self.first_page();
        self.recompute();
        true
    }

    /// Sort by `key`: a new column starts ascending, the active one flips.
    /// Unknown and non-sortable columns are ignored.
    pub fn sort_by(&mut self, key: &str) -> bool {
        if !self
            .columns
            .get(key)
            .is_some_and(ColumnDescriptor::is_sortable)
        {
            trace!("Ignoring sort on {key}");
            return false;
        }
        let state = self.sort.sort_by(key).clone();
        self.events.push(GridEvent::SortChanged(state));
        self.recompute();
        true
    }

    pub fn toggle_sort(&mut self) -> bool {
        let Some(state) = self.sort.toggle().cloned() else {
            return false;
        };
        self.events.push(GridEvent::SortChanged(state));
        self.recompute();
        true
    }

    /// Stage a filter in the open filter panel. Nothing is applied until
    /// `apply_filters`.
    pub fn set_draft_filter(&mut self, filter: StructuredFilter) -> bool {
        if !self.filter_panel.is_open() || self.columns.get(filter.key()).is_none() {
            return false;
        }
        self.draft.set(filter);
        true
    }

    pub fn remove_draft_filter(&mut self, key: &str) -> bool {
        self.filter_panel.is_open() && self.draft.remove(key)
    }

    pub fn apply_filters(&mut self) -> bool {
        if !self.filter_panel.is_open() {
            return false;
        }
        // closing drops the draft, so take it first
        let applied = self.draft.compacted();
        self.close_overlay(OverlayKind::FilterPanel, Dismissal::Apply);
        self.events
            .push(GridEvent::FiltersApplied(applied.as_slice().to_vec()));
        self.filters.replace_filters(applied);
        self.first_page();
        self.recompute();
        true
    }

    pub fn cancel_filters(&mut self) -> bool {
        self.close_overlay(OverlayKind::FilterPanel, Dismissal::Cancel)
    }

    /// Clear draft and applied filters and close the panel.
    pub fn reset_filters(&mut self) -> bool {
        if !self.config.structured_filters {
            return false;
        }
        self.close_overlay(OverlayKind::FilterPanel, Dismissal::Close);
        self.draft.clear();
        self.filters.clear_filters();
        self.events.push(GridEvent::FiltersReset);
        self.first_page();
        self.recompute();
        true
    }

    pub fn click_add(&mut self) -> bool {
        if !(self.config.toolbar && self.config.add_action) {
            return false;
        }
        self.events.push(GridEvent::AddClicked);
        true
    }

    // -------------------- Overlays ---------------------- //

    fn overlay_parts(&mut self, kind: OverlayKind) -> (&mut Overlay, &mut DismissListeners) {
        match kind {
            OverlayKind::ColumnPicker => (&mut self.picker, &mut self.listeners),
            OverlayKind::FilterPanel => (&mut self.filter_panel, &mut self.listeners),
        }
    }

    fn overlay_enabled(&self, kind: OverlayKind) -> bool {
        match kind {
            OverlayKind::ColumnPicker => self.config.column_selector,
            OverlayKind::FilterPanel => self.config.structured_filters,
        }
    }

    pub fn open_overlay(&mut self, kind: OverlayKind) -> bool {
        if !self.overlay_enabled(kind) {
            return false;
        }
        let (overlay, listeners) = self.overlay_parts(kind);
        if !overlay.open(listeners) {
            return false;
        }
        if kind == OverlayKind::FilterPanel {
            self.draft = self.filters.filters().clone();
        }
        self.events.push(GridEvent::OverlayOpened(kind));
        true
    }

    pub fn close_overlay(&mut self, kind: OverlayKind, reason: Dismissal) -> bool {
        let (overlay, listeners) = self.overlay_parts(kind);
        match overlay.dismiss(reason, listeners) {
            Some(reason) => {
                self.overlay_closed(kind, reason);
                true
            }
            None => false,
        }
    }

    fn overlay_closed(&mut self, kind: OverlayKind, reason: Dismissal) {
        if kind == OverlayKind::FilterPanel {
            self.draft.clear();
        }
        self.events.push(GridEvent::OverlayClosed(kind, reason));
    }

    pub fn dispatch_global(&mut self, event: GlobalEvent) -> bool {
        let mut handled = false;
        // every registered overlay sees the event
        for kind in self.listeners.targets() {
            let (overlay, listeners) = self.overlay_parts(kind);
            if let Some(reason) = overlay.handle(event, listeners) {
                self.overlay_closed(kind, reason);
                handled = true;
            }
        }
        handled
    }

    /// Close every overlay and drop all dismiss listeners without notifying.
    pub fn unmount(&mut self) {
        self.picker.dismiss(Dismissal::Close, &mut self.listeners);
        self.filter_panel
            .dismiss(Dismissal::Close, &mut self.listeners);
        self.draft.clear();
        self.listeners.clear();
    }

    // -------------------- Derived state ---------------------- //

    fn recompute(&mut self) {
        let Some(rows) = self.rows.as_ref() else {
            self.working.clear();
            let change = self.pagination.set_total_items(0);
            self.page_moved(change);
            return;
        };
        let start_time = Instant::now();
        let total = rows.len();

        // filter, then sort what survived
        let mut working = self.filters.apply(rows, &self.columns);
        if let Some(state) = self.sort.state()
            && let Some(column) = self.columns.get(&state.field)
        {
            sort_indices(rows, &mut working, column, state.direction);
        }
        self.working = working;

        let change = self.pagination.set_total_items(self.working.len());
        self.page_moved(change);
        debug!(
            "Working set {} of {} rows rebuilt in {}us",
            self.working.len(),
            total,
            start_time.elapsed().as_micros()
        );
    }

    pub fn view(&self) -> GridView<'_, R> {
        let toolbar = self.config.toolbar.then(|| ToolbarView {
            search_text: self.filters.search(),
            placeholder: &self.config.search_placeholder,
            add_action: self.config.add_action,
        });
        let mut view = GridView {
            state: ViewState::Rows,
            visible_columns: Vec::new(),
            page_rows: Vec::new(),
            summary: None,
            page_labels: Vec::new(),
            pagination_visible: false,
            current_page: self.pagination.current_page(),
            total_pages: self.pagination.total_pages(),
            page_size: self.pagination.page_size(),
            page_size_options: self.pagination.page_size_options(),
            toolbar,
            sort: self.sort.state(),
            active_filters: self.filters.filters().as_slice(),
            column_picker: None,
            filter_panel: None,
        };

        let Some(rows) = self.rows.as_deref() else {
            view.state = ViewState::Loading {
                message: &self.config.loading_message,
            };
            return view;
        };

        view.visible_columns = self.visibility.select(&self.columns);
        view.page_rows = self.working[self.pagination.page_bounds()]
            .iter()
            .map(|&index| PageRow {
                index,
                row: &rows[index],
            })
            .collect();
        view.summary = self.pagination.summary_range();
        view.page_labels = self.pagination.page_labels(self.config.page_delta);
        view.pagination_visible = self.pagination.should_display(self.config.pagination_policy);
        view.column_picker = self.picker.is_open().then(|| PickerView {
            query: self.picker.text(),
            entries: self
                .visibility
                .filter_by_label(&self.columns, self.picker.text()),
        });
        view.filter_panel = self.filter_panel.is_open().then(|| FilterPanelView {
            draft: self.draft.as_slice(),
        });

        view.state = if view.visible_columns.is_empty() {
            ViewState::NoColumns {
                message: &self.config.no_columns_message,
                colspan: 1,
            }
        } else if view.page_rows.is_empty() {
            let message = if self.filters.is_active() && !rows.is_empty() {
                &self.config.no_match_message
            } else {
                &self.config.empty_message
            };
            ViewState::Empty { message }
        } else {
            ViewState::Rows
        };
        view
    }
}

impl<R> Drop for GridModel<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}
