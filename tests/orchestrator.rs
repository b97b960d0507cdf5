use std::sync::Arc;

use datagrid::{
    ColumnDescriptor, Dismissal, GlobalEvent, GridConfig, GridEvent, GridModel, Message,
    OverlayKind, PageLabel, SortState, StructuredFilter, ViewState,
};

#[derive(Debug)]
struct Deal {
    name: String,
    amount: f64,
    stage: &'static str,
}

fn deals() -> Arc<[Deal]> {
    (0..25)
        .map(|i| {
            let name = match i {
                3 => "Acme Corp".to_string(),
                11 => "ACME Logistics".to_string(),
                19 => "Northwind (acme)".to_string(),
                _ => format!("Client {i}"),
            };
            Deal {
                name,
                amount: ((i * 37) % 100) as f64,
                stage: if i % 3 == 0 { "won" } else { "open" },
            }
        })
        .collect::<Vec<_>>()
        .into()
}

fn columns() -> Vec<ColumnDescriptor<Deal>> {
    vec![
        ColumnDescriptor::new("name", "Name", |d: &Deal| d.name.as_str().into())
            .searchable(true)
            .sortable(true),
        ColumnDescriptor::new("amount", "Amount", |d: &Deal| d.amount.into())
            .sortable(true)
            .formatter(|d: &Deal| format!("${:.2}", d.amount)),
        ColumnDescriptor::new("stage", "Stage", |d: &Deal| d.stage.into()),
    ]
}

#[test]
fn search_sort_and_visible_columns_compose() {
    let config = GridConfig::default()
        .page_size(10)
        .initial_visible_columns(vec!["name".into(), "amount".into()]);
    let mut grid = GridModel::new(columns(), Some(deals()), config).unwrap();
    assert_eq!(grid.view().total_pages, 3);

    grid.update(Message::SetSearchText("acme".into()));
    grid.update(Message::SortBy("amount".into()));
    grid.update(Message::SortBy("amount".into()));
    assert_eq!(grid.sort_state(), Some(&SortState::descending("amount")));

    let view = grid.view();
    assert_eq!(view.state, ViewState::Rows);
    let keys: Vec<&str> = view.visible_columns.iter().map(|c| c.key()).collect();
    assert_eq!(keys, vec!["name", "amount"]);

    assert_eq!(view.page_rows.len(), 3);
    let amounts: Vec<f64> = view.page_rows.iter().map(|r| r.row.amount).collect();
    assert!(amounts.windows(2).all(|w| w[0] >= w[1]), "{amounts:?}");
    assert_eq!(view.total_pages, 1);
    assert!(!view.pagination_visible);
    assert_eq!(view.page_labels, vec![PageLabel::Page(1)]);
    assert_eq!(
        view.summary.map(|s| s.to_string()),
        Some("Showing 1-3 of 3".to_string())
    );

    let first = &view.page_rows[0];
    assert_eq!(view.cell_text(first, view.visible_columns[1]), format!("${:.2}", first.row.amount));
}

#[test]
fn events_report_each_transition_once() {
    let mut grid = GridModel::new(columns(), Some(deals()), GridConfig::default()).unwrap();
    assert!(grid.take_events().is_empty());

    grid.update(Message::NextPage);
    grid.update(Message::GoToPage(2));
    grid.update(Message::ToggleColumn("stage".into()));
    grid.update(Message::SetSearchText("client".into()));

    let events = grid.take_events();
    assert_eq!(events.len(), 4, "{events:?}");
    assert!(matches!(events[0], GridEvent::PageChanged(c) if c.from == 1 && c.to == 2));
    assert_eq!(
        events[1],
        GridEvent::ColumnVisibilityChanged {
            visible: vec!["name".into(), "amount".into()]
        }
    );
    assert_eq!(events[2], GridEvent::SearchTextChanged("client".into()));
    assert!(matches!(events[3], GridEvent::PageChanged(c) if c.to == 1));
    assert!(grid.take_events().is_empty());
}

#[test]
fn filter_panel_round_trip() {
    let config = GridConfig::default().structured_filters(true);
    let mut grid = GridModel::new(columns(), Some(deals()), config).unwrap();

    grid.update(Message::OpenOverlay(OverlayKind::FilterPanel));
    grid.update(Message::SetDraftFilter(StructuredFilter::equals("stage", "WON")));
    grid.update(Message::SetDraftFilter(StructuredFilter::range("amount", "", "50")));
    assert_eq!(grid.working_rows().len(), 25);

    grid.update(Message::ApplyFilters);
    let expected: Vec<usize> = (0..25)
        .filter(|i| i % 3 == 0 && (i * 37) % 100 <= 50)
        .collect();
    assert_eq!(grid.working_rows(), expected.as_slice());
    assert!(grid.view().filter_panel.is_none());

    // Escape throws the draft away.
    grid.update(Message::OpenOverlay(OverlayKind::FilterPanel));
    grid.update(Message::RemoveDraftFilter("stage".into()));
    grid.update(Message::Global(GlobalEvent::Escape));
    assert_eq!(grid.filters().filters().len(), 2);

    grid.update(Message::ResetFilters);
    assert_eq!(grid.working_rows().len(), 25);
    let events = grid.take_events();
    assert!(events.contains(&GridEvent::OverlayClosed(
        OverlayKind::FilterPanel,
        Dismissal::Escape
    )));
    assert!(events.contains(&GridEvent::FiltersReset));
}

#[test]
fn dropping_the_grid_while_overlays_are_open() {
    let config = GridConfig::default().structured_filters(true);
    let mut grid = GridModel::new(columns(), None, config).unwrap();
    grid.update(Message::OpenOverlay(OverlayKind::ColumnPicker));
    grid.update(Message::OpenOverlay(OverlayKind::FilterPanel));
    assert_eq!(grid.listeners().len(), 2);
    assert!(grid.view().is_loading());
    drop(grid);
}
