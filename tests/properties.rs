//! Property tests for the grid engine.
//!
//! 1. The page list always holds page 1 and the last page exactly once.
//! 2. At most one ellipsis on each side of the current page.
//! 3. Repeating a page request never emits a second change.
//! 4. Visible keys stay a subset of the declared keys.
//! 5. An empty query with no filters is the identity.
//! 6. Search then filters equals one combined pass.
//! 7. Sorting asc, desc, asc keeps the input order of equal keys.
//! 8. The summary end never passes the item count.

use datagrid::filter;
use datagrid::sort::sort_indices;
use datagrid::{
    CellValue, ColumnDescriptor, ColumnSet, ColumnVisibility, PageLabel, PaginationController,
    SortDirection, StructuredFilter, compute_range,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Item {
    name: String,
    score: Option<i64>,
}

fn item_strategy() -> impl Strategy<Value = Item> {
    ("[a-c]{0,3}", proptest::option::of(0i64..5)).prop_map(|(name, score)| Item { name, score })
}

fn columns() -> ColumnSet<Item> {
    ColumnSet::new(vec![
        ColumnDescriptor::new("name", "Name", |i: &Item| i.name.as_str().into()).searchable(true),
        ColumnDescriptor::new("score", "Score", |i: &Item| i.score.into()).sortable(true),
    ])
    .unwrap()
}

#[derive(Debug, Clone)]
enum VisibilityOp {
    Toggle(String),
    ShowAll,
    HideAll,
}

fn visibility_op() -> impl Strategy<Value = VisibilityOp> {
    prop_oneof![
        "[a-e]".prop_map(VisibilityOp::Toggle),
        Just(VisibilityOp::ShowAll),
        Just(VisibilityOp::HideAll),
    ]
}

// ── Page range ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn page_range_keeps_both_ends(total in 1usize..200, current in 1usize..200, delta in 0usize..4) {
        let current = current.min(total);
        let labels = compute_range(current, total, delta);
        let count = |p: usize| labels.iter().filter(|l| **l == PageLabel::Page(p)).count();
        prop_assert_eq!(count(1), 1);
        prop_assert_eq!(count(total), 1);
        prop_assert_eq!(count(current), 1);
    }

    #[test]
    fn page_range_has_one_ellipsis_per_side(total in 1usize..200, current in 1usize..200) {
        let current = current.min(total);
        let labels = compute_range(current, total, 1);
        let pos = labels.iter().position(|l| *l == PageLabel::Page(current)).unwrap();
        let before = labels[..pos].iter().filter(|l| **l == PageLabel::Ellipsis).count();
        let after = labels[pos..].iter().filter(|l| **l == PageLabel::Ellipsis).count();
        prop_assert!(before <= 1 && after <= 1, "{:?}", labels);

        let pages: Vec<usize> = labels.iter().filter_map(PageLabel::page).collect();
        prop_assert!(pages.windows(2).all(|w| w[0] < w[1]), "{:?}", labels);
    }
}

// ── Pagination ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn repeated_page_request_is_a_noop(total in 0usize..500, size in 1usize..50, page in 0usize..60) {
        let mut pagination = PaginationController::new(size, total);
        pagination.go_to_page(page);
        prop_assert_eq!(pagination.go_to_page(page), None);
        prop_assert!(pagination.current_page() >= 1);
        prop_assert!(pagination.current_page() <= pagination.total_pages().max(1));
    }

    #[test]
    fn summary_stays_within_items(total in 1usize..500, size in 1usize..50) {
        let mut pagination = PaginationController::new(size, total);
        pagination.last_page();
        let summary = pagination.summary_range().unwrap();
        prop_assert_eq!(summary.end, total);
        prop_assert!(summary.start <= summary.end);
        prop_assert_eq!(summary.end - summary.start + 1, pagination.page_bounds().len());
    }
}

// ── Column visibility ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn visible_keys_stay_declared(ops in proptest::collection::vec(visibility_op(), 0..30)) {
        let all = ["a", "b", "c"];
        let mut visibility = ColumnVisibility::new(all, None);
        for op in ops {
            match op {
                VisibilityOp::Toggle(key) => { visibility.toggle(&key); }
                VisibilityOp::ShowAll => { visibility.show_all(); }
                VisibilityOp::HideAll => { visibility.hide_all(); }
            }
            prop_assert!(visibility.visible_keys().all(|k| all.contains(&k)));
            prop_assert!(visibility.visible_count() <= all.len());
        }
    }
}

// ── Filter and search ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn blank_query_is_identity(rows in proptest::collection::vec(item_strategy(), 0..40)) {
        let columns = columns();
        let expected: Vec<usize> = (0..rows.len()).collect();
        prop_assert_eq!(filter::apply(&rows, &columns, "", &[]), expected.clone());
        prop_assert_eq!(filter::apply(&rows, &columns, "   ", &[]), expected);
    }

    #[test]
    fn search_and_filters_compose(
        rows in proptest::collection::vec(item_strategy(), 0..40),
        query in "[a-c]{0,2}",
        min in 0i64..5,
    ) {
        let columns = columns();
        let filters = [StructuredFilter::range("score", min.to_string(), "")];

        let combined = filter::apply(&rows, &columns, &query, &filters);

        let searched: Vec<Item> = filter::matching_rows(&rows, &columns, &query, &[])
            .into_iter()
            .cloned()
            .collect();
        let staged = filter::apply(&searched, &columns, "", &filters);
        prop_assert_eq!(combined.len(), staged.len());

        let swapped: Vec<Item> = filter::matching_rows(&rows, &columns, "", &filters)
            .into_iter()
            .cloned()
            .collect();
        let reordered = filter::apply(&swapped, &columns, &query, &[]);
        prop_assert_eq!(combined.len(), reordered.len());

        for idx in combined {
            prop_assert!(rows[idx].score.is_some_and(|s| s >= min));
            prop_assert!(rows[idx].name.contains(query.as_str()));
        }
    }
}

// ── Sort ────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sort_round_trip_is_stable(rows in proptest::collection::vec(item_strategy(), 0..40)) {
        let columns = columns();
        let score = columns.get("score").unwrap();
        let mut indices: Vec<usize> = (0..rows.len()).collect();

        sort_indices(&rows, &mut indices, score, SortDirection::Ascending);
        sort_indices(&rows, &mut indices, score, SortDirection::Descending);
        sort_indices(&rows, &mut indices, score, SortDirection::Ascending);

        for pair in indices.windows(2) {
            let (a, b) = (&rows[pair[0]], &rows[pair[1]]);
            let order = CellValue::from(a.score).compare(&CellValue::from(b.score));
            prop_assert!(order.is_le());
            if order.is_eq() {
                prop_assert!(pair[0] < pair[1], "equal keys out of input order: {:?}", indices);
            }
        }
    }
}
