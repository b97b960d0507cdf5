use std::time::Duration;
use tracing::trace;

use datagrid::loader::Record;
use datagrid::{GlobalEvent, GridError, GridModel, Message, OverlayKind, StructuredFilter};
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::inputter::Inputter;
use crate::ui::TableUI;

pub const HELP_TEXT: &str = "q quit | ←/→ page | g/G first/last | +/- page size | / search | \
    tab column | s sort | S flip | c columns | f filters | a add";
pub const SEARCH_HELP: &str = "type to search | enter done | esc clear";
pub const PICKER_HELP: &str = "type to narrow | ↑/↓ select | enter toggle | F2 all | F3 none | esc close";
pub const FILTER_HELP: &str =
    "key=value or key:min..max then enter | enter on empty line applies | del remove | ctrl-r reset | esc cancel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Table,
    Search,
    Picker,
    FilterPanel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Grid(Message),
    Quit,
}

/// Maps terminal input to grid messages. Owns the bits of UI state the grid
/// has no notion of: focus, the text editor and list cursors.
pub struct Controller {
    event_poll_time: u64,
    focus: Focus,
    input: Inputter,
    column_cursor: usize,
    picker_cursor: usize,
    panel_cursor: usize,
}

impl Controller {
    pub fn new(event_poll_time: u64) -> Self {
        Self {
            event_poll_time,
            focus: Focus::Table,
            input: Inputter::default(),
            column_cursor: 0,
            picker_cursor: 0,
            panel_cursor: 0,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn input(&self) -> &Inputter {
        &self.input
    }

    pub fn column_cursor(&self) -> usize {
        self.column_cursor
    }

    pub fn picker_cursor(&self) -> usize {
        self.picker_cursor
    }

    pub fn panel_cursor(&self) -> usize {
        self.panel_cursor
    }

    pub fn help(&self) -> &'static str {
        match self.focus {
            Focus::Table => HELP_TEXT,
            Focus::Search => SEARCH_HELP,
            Focus::Picker => PICKER_HELP,
            Focus::FilterPanel => FILTER_HELP,
        }
    }

    pub fn handle_event(
        &mut self,
        model: &GridModel<Record>,
        ui: &TableUI,
    ) -> Result<Option<Action>, GridError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let action = match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => self.handle_key(key, model),
            Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) => {
                let inside = ui.overlay_at(mouse.column, mouse.row);
                Some(Action::Grid(Message::Global(GlobalEvent::PointerDown { inside })))
            }
            _ => None,
        };
        Ok(action)
    }

    /// Fall back to the table when the overlay behind the current focus was
    /// closed by the grid, and keep cursors in range.
    pub fn sync(&mut self, model: &GridModel<Record>) {
        let closed = match self.focus {
            Focus::Picker => !model.overlay(OverlayKind::ColumnPicker).is_open(),
            Focus::FilterPanel => !model.overlay(OverlayKind::FilterPanel).is_open(),
            Focus::Table | Focus::Search => false,
        };
        if closed {
            trace!("Overlay closed, focus back on table");
            self.focus = Focus::Table;
            self.input.clear();
        }
        let visible = model.visibility().visible_count();
        self.column_cursor = self.column_cursor.min(visible.saturating_sub(1));
        self.panel_cursor = self
            .panel_cursor
            .min(model.draft_filters().len().saturating_sub(1));
    }

    fn handle_key(&mut self, key: KeyEvent, model: &GridModel<Record>) -> Option<Action> {
        let action = match self.focus {
            Focus::Table => self.table_key(key, model),
            Focus::Search => self.search_key(key),
            Focus::Picker => self.picker_key(key, model),
            Focus::FilterPanel => self.filter_key(key, model),
        };
        trace!("Mapped: {key:?} => {action:?}");
        action
    }

    fn table_key(&mut self, key: KeyEvent, model: &GridModel<Record>) -> Option<Action> {
        let message = match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Right | KeyCode::Char('n') | KeyCode::PageDown => Message::NextPage,
            KeyCode::Left | KeyCode::Char('p') | KeyCode::PageUp => Message::PreviousPage,
            KeyCode::Home | KeyCode::Char('g') => Message::FirstPage,
            KeyCode::End | KeyCode::Char('G') => Message::LastPage,
            KeyCode::Char('+') => Message::SetPageSize(Self::step_page_size(model, true)),
            KeyCode::Char('-') => Message::SetPageSize(Self::step_page_size(model, false)),
            KeyCode::Tab => {
                let visible = model.visibility().visible_count().max(1);
                self.column_cursor = (self.column_cursor + 1) % visible;
                return None;
            }
            KeyCode::BackTab => {
                let visible = model.visibility().visible_count().max(1);
                self.column_cursor = (self.column_cursor + visible - 1) % visible;
                return None;
            }
            KeyCode::Char('s') => {
                let key = model.visibility().visible_keys().nth(self.column_cursor)?;
                Message::SortBy(key.to_string())
            }
            KeyCode::Char('S') => Message::ToggleSort,
            KeyCode::Char('a') => Message::Add,
            KeyCode::Char('/') if model.config().toolbar => {
                self.focus = Focus::Search;
                self.input.set(model.filters().search());
                return None;
            }
            KeyCode::Char('c') => {
                self.focus = Focus::Picker;
                self.input.clear();
                self.picker_cursor = 0;
                Message::OpenOverlay(OverlayKind::ColumnPicker)
            }
            KeyCode::Char('f') => {
                self.focus = Focus::FilterPanel;
                self.input.clear();
                self.panel_cursor = 0;
                Message::OpenOverlay(OverlayKind::FilterPanel)
            }
            KeyCode::Esc => Message::Global(GlobalEvent::Escape),
            _ => return None,
        };
        Some(Action::Grid(message))
    }

    fn search_key(&mut self, key: KeyEvent) -> Option<Action> {
        let result = self.input.read(key);
        if result.finished {
            self.focus = Focus::Table;
        }
        if result.canceled || result.changed {
            return Some(Action::Grid(Message::SetSearchText(result.input)));
        }
        None
    }

    fn picker_key(&mut self, key: KeyEvent, model: &GridModel<Record>) -> Option<Action> {
        let entries = model.view().column_picker.map_or(0, |p| p.entries.len());
        let message = match key.code {
            KeyCode::Esc => Message::Global(GlobalEvent::Escape),
            KeyCode::Up => {
                self.picker_cursor = self.picker_cursor.saturating_sub(1);
                return None;
            }
            KeyCode::Down => {
                self.picker_cursor = (self.picker_cursor + 1).min(entries.saturating_sub(1));
                return None;
            }
            KeyCode::Enter => {
                let view = model.view();
                let entry = view.column_picker?.entries.into_iter().nth(self.picker_cursor)?;
                Message::ToggleColumn(entry.key.to_string())
            }
            KeyCode::F(2) => Message::ShowAllColumns,
            KeyCode::F(3) => Message::HideAllColumns,
            _ => {
                let result = self.input.read(key);
                if !result.changed {
                    return None;
                }
                self.picker_cursor = 0;
                Message::SetPickerQuery(result.input)
            }
        };
        Some(Action::Grid(message))
    }

    fn filter_key(&mut self, key: KeyEvent, model: &GridModel<Record>) -> Option<Action> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => Message::Global(GlobalEvent::Escape),
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => Message::ResetFilters,
            (KeyCode::Up, _) => {
                self.panel_cursor = self.panel_cursor.saturating_sub(1);
                return None;
            }
            (KeyCode::Down, _) => {
                let drafts = model.draft_filters().len();
                self.panel_cursor = (self.panel_cursor + 1).min(drafts.saturating_sub(1));
                return None;
            }
            (KeyCode::Delete, _) if self.input.input().is_empty() => {
                let filter = model.draft_filters().as_slice().get(self.panel_cursor)?;
                Message::RemoveDraftFilter(filter.key().to_string())
            }
            (KeyCode::Enter, _) if self.input.input().trim().is_empty() => Message::ApplyFilters,
            (KeyCode::Enter, _) => {
                let filter = parse_filter(self.input.input());
                self.input.clear();
                Message::SetDraftFilter(filter?)
            }
            _ => {
                self.input.read(key);
                return None;
            }
        };
        Some(Action::Grid(message))
    }

    fn step_page_size(model: &GridModel<Record>, up: bool) -> usize {
        let pagination = model.pagination();
        let options = pagination.page_size_options();
        let current = pagination.page_size();
        let next = if up {
            options.iter().copied().find(|&o| o > current)
        } else {
            options.iter().rev().copied().find(|&o| o < current)
        };
        next.unwrap_or(current)
    }
}

/// Parse `key=value` into an equality filter and `key:min..max` into a range.
/// Whichever of `=` and `:` comes first separates the key, so values may hold
/// either. Range bounds are kept raw; a bad or missing bound stays open.
pub fn parse_filter(line: &str) -> Option<StructuredFilter> {
    let line = line.trim();
    let split = line.find(['=', ':'])?;
    let (key, rest) = (line[..split].trim(), &line[split + 1..]);
    if key.is_empty() {
        return None;
    }
    if line[split..].starts_with('=') {
        return Some(StructuredFilter::equals(key, rest.trim()));
    }
    let (min, max) = rest.split_once("..")?;
    Some(StructuredFilter::range(key, min.trim(), max.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use datagrid::{CellValue, ColumnDescriptor, Dismissal, GridConfig, GridEvent};

    #[test]
    fn parses_equality_filters() {
        assert_eq!(
            parse_filter(" region = north "),
            Some(StructuredFilter::equals("region", "north"))
        );
        assert_eq!(
            parse_filter("time=12:30"),
            Some(StructuredFilter::equals("time", "12:30"))
        );
        assert_eq!(
            parse_filter("url=http://x"),
            Some(StructuredFilter::equals("url", "http://x"))
        );
        assert_eq!(parse_filter("=north"), None);
        assert_eq!(parse_filter("north"), None);
    }

    #[test]
    fn parses_range_filters() {
        assert_eq!(
            parse_filter("amount:10..20"),
            Some(StructuredFilter::range("amount", "10", "20"))
        );
        assert_eq!(
            parse_filter("amount:..20"),
            Some(StructuredFilter::range("amount", "", "20"))
        );
        // a bad bound is left for the filter to treat as open
        assert_eq!(
            parse_filter("amount:abc..100"),
            Some(StructuredFilter::range("amount", "abc", "100"))
        );
        assert_eq!(parse_filter("amount:10"), None);
    }

    #[test]
    fn escape_in_filter_panel_dismisses_with_escape() {
        let rows: Arc<[Record]> = vec![Record {
            cells: vec![CellValue::Number(1.0)],
        }]
        .into();
        let columns = vec![ColumnDescriptor::new("amount", "amount", |r: &Record| r.get(0))];
        let config = GridConfig::default().structured_filters(true);
        let mut model = GridModel::new(columns, Some(rows), config).unwrap();
        let mut controller = Controller::new(10);

        let open = controller.table_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::NONE), &model);
        let Some(Action::Grid(message)) = open.clone() else {
            panic!("no open action: {open:?}");
        };
        model.update(message);
        assert_eq!(controller.focus(), Focus::FilterPanel);

        let esc = controller.filter_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), &model);
        assert_eq!(esc, Some(Action::Grid(Message::Global(GlobalEvent::Escape))));
        if let Some(Action::Grid(message)) = esc {
            model.update(message);
        }
        controller.sync(&model);
        assert_eq!(controller.focus(), Focus::Table);
        assert!(model.take_events().contains(&GridEvent::OverlayClosed(
            OverlayKind::FilterPanel,
            Dismissal::Escape
        )));
    }
}
