use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use datagrid::loader::Record;
use datagrid::{
    Align, GridEvent, GridModel, GridView, OverlayKind, PageLabel, SortDirection, ViewState,
};

use crate::controller::{Controller, Focus};

pub const TOOLBAR_HEIGHT: u16 = 3;
pub const STATUSLINE_HEIGHT: u16 = 1;
const PICKER_WIDTH: u16 = 40;
const PANEL_WIDTH: u16 = 60;

#[derive(Debug)]
pub struct TableUI {
    name: String,
    status_message: String,
    picker_area: Option<Rect>,
    panel_area: Option<Rect>,
}

impl TableUI {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_message: String::new(),
            picker_area: None,
            panel_area: None,
        }
    }

    /// Overlay drawn at a terminal cell in the last frame.
    pub fn overlay_at(&self, x: u16, y: u16) -> Option<OverlayKind> {
        let pos = Position { x, y };
        if self.panel_area.is_some_and(|a| a.contains(pos)) {
            Some(OverlayKind::FilterPanel)
        } else if self.picker_area.is_some_and(|a| a.contains(pos)) {
            Some(OverlayKind::ColumnPicker)
        } else {
            None
        }
    }

    pub fn on_event(&mut self, event: &GridEvent) {
        let message = match event {
            GridEvent::FiltersApplied(filters) => format!("{} filter(s) applied", filters.len()),
            GridEvent::FiltersReset => "Filters cleared".to_string(),
            GridEvent::AddClicked => "Adding rows is not supported by the viewer".to_string(),
            GridEvent::SortChanged(sort) => format!("Sorted by {} {}", sort.field, sort.direction),
            GridEvent::PageSizeChanged { to, .. } => format!("{to} rows per page"),
            _ => return,
        };
        self.status_message = message;
    }

    pub fn draw(&mut self, model: &GridModel<Record>, controller: &Controller, frame: &mut Frame) {
        let view = model.view();
        let [toolbar_area, table_area, pagination_area, status_area] = Layout::vertical([
            Constraint::Length(if view.toolbar.is_some() { TOOLBAR_HEIGHT } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_toolbar(&view, controller, frame, toolbar_area);
        self.draw_table(&view, controller, frame, table_area);
        Self::draw_pagination(&view, frame, pagination_area);

        let status = Line::from(vec![
            Span::from(format!(" {} ", controller.help())).dim(),
            Span::from(self.status_message.as_str()).yellow(),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        self.picker_area = None;
        self.panel_area = None;
        if view.column_picker.is_some() {
            self.draw_picker(&view, controller, frame);
        }
        if view.filter_panel.is_some() {
            self.draw_filter_panel(&view, controller, frame);
        }
    }

    fn draw_toolbar(
        &self,
        view: &GridView<'_, Record>,
        controller: &Controller,
        frame: &mut Frame,
        area: Rect,
    ) {
        let Some(toolbar) = &view.toolbar else {
            return;
        };
        let focused = controller.focus() == Focus::Search;
        let text = if focused {
            Line::from(controller.input().input().to_string())
        } else if toolbar.search_text.is_empty() {
            Line::from(toolbar.placeholder.to_string()).dim()
        } else {
            Line::from(toolbar.search_text.to_string())
        };
        let mut block = Block::bordered().title(Line::from(format!(" {} ", self.name)).bold());
        if toolbar.add_action {
            block = block.title(Line::from(" [a] Add ").right_aligned());
        }
        if focused {
            block = block.border_set(border::THICK);
            frame.set_cursor_position(Position {
                x: area.x + 1 + controller.input().cursor_pos() as u16,
                y: area.y + 1,
            });
        }
        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn draw_table(
        &self,
        view: &GridView<'_, Record>,
        controller: &Controller,
        frame: &mut Frame,
        area: Rect,
    ) {
        let message = match view.state {
            ViewState::Loading { message }
            | ViewState::NoColumns { message, .. }
            | ViewState::Empty { message } => Some(message),
            ViewState::Rows => None,
        };
        if view.visible_columns.is_empty() || view.is_loading() {
            let paragraph = Paragraph::new(message.unwrap_or_default())
                .centered()
                .block(Block::bordered());
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(view.visible_columns.iter().enumerate().map(|(idx, column)| {
            let indicator = match view.sort {
                Some(sort) if sort.field == column.key() => match sort.direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                },
                _ => "",
            };
            let mut cell = Cell::from(format!("{}{indicator}", column.header())).bold();
            if idx == controller.column_cursor() && controller.focus() == Focus::Table {
                cell = cell.reversed();
            }
            cell
        }));

        let rows: Vec<Row> = if view.page_rows.is_empty() {
            vec![Row::new([Cell::from(message.unwrap_or_default()).dim()])]
        } else {
            view.page_rows
                .iter()
                .map(|page_row| {
                    Row::new(view.visible_columns.iter().map(|column| {
                        let line = Line::from(view.cell_text(page_row, column));
                        Cell::from(match column.alignment() {
                            Align::Left => line.left_aligned(),
                            Align::Center => line.centered(),
                            Align::Right => line.right_aligned(),
                        })
                    }))
                })
                .collect()
        };

        let widths = vec![Constraint::Fill(1); view.visible_columns.len()];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(Block::bordered());
        frame.render_widget(table, area);
    }

    fn draw_pagination(view: &GridView<'_, Record>, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        if view.pagination_visible {
            spans.push(Span::from(" « ‹ ").dim());
            for label in &view.page_labels {
                let span = Span::from(format!(" {label} "));
                spans.push(match label {
                    PageLabel::Page(p) if *p == view.current_page => span.reversed(),
                    _ => span,
                });
            }
            spans.push(Span::from(" › » ").dim());
        }
        if let Some(summary) = view.summary {
            spans.push(Span::from(format!("  {summary}")));
        }
        spans.push(Span::from(format!("  [{} / page]", view.page_size)).dim());
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_picker(&mut self, view: &GridView<'_, Record>, controller: &Controller, frame: &mut Frame) {
        let Some(picker) = &view.column_picker else {
            return;
        };
        let height = (picker.entries.len() as u16 + 4).min(frame.area().height);
        let area = popup_area(frame.area(), PICKER_WIDTH, height);
        self.picker_area = Some(area);

        let mut lines = vec![Line::from(format!("Find: {}", picker.query)), Line::from("")];
        lines.extend(picker.entries.iter().enumerate().map(|(idx, entry)| {
            let mark = if entry.visible { "[x]" } else { "[ ]" };
            let line = Line::from(format!("{mark} {}", entry.header));
            if idx == controller.picker_cursor() {
                line.reversed()
            } else {
                line
            }
        }));
        if picker.entries.is_empty() {
            lines.push(Line::from("No columns found").dim());
        }

        let block = Block::bordered()
            .title(Line::from(" Columns ").bold().centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_filter_panel(
        &mut self,
        view: &GridView<'_, Record>,
        controller: &Controller,
        frame: &mut Frame,
    ) {
        let Some(panel) = &view.filter_panel else {
            return;
        };
        let height = (panel.draft.len() as u16 + 5).min(frame.area().height);
        let area = popup_area(frame.area(), PANEL_WIDTH, height);
        self.panel_area = Some(area);

        let mut lines = vec![
            Line::from(format!("> {}", controller.input().input())),
            Line::from(""),
        ];
        lines.extend(panel.draft.iter().enumerate().map(|(idx, filter)| {
            let line = Line::from(filter.to_string());
            if idx == controller.panel_cursor() {
                line.style(Style::new().reversed())
            } else {
                line
            }
        }));
        if panel.draft.is_empty() {
            lines.push(Line::from("No filters").dim());
        }

        let block = Block::bordered()
            .title(Line::from(" Filters ").bold().centered())
            .title_bottom(Line::from(" enter apply | esc cancel ").centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
        frame.set_cursor_position(Position {
            x: area.x + 3 + controller.input().cursor_pos() as u16,
            y: area.y + 1,
        });
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}
