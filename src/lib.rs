//! A generic tabular data-grid engine.
//!
//! `GridModel` turns a row slice and a list of typed column descriptors into a
//! paginated, filtered, sorted and column-customizable view. The building
//! blocks (`compute_range`, `PaginationController`, `ColumnVisibility`,
//! `FilterState`, `SortToggle`, `Overlay`) are usable on their own.
//!
//! ```
//! use std::sync::Arc;
//! use datagrid::{ColumnDescriptor, GridConfig, GridModel, Message};
//!
//! struct Invoice { client: &'static str, total: f64 }
//!
//! let rows: Arc<[Invoice]> = vec![
//!     Invoice { client: "Acme", total: 120.0 },
//!     Invoice { client: "Globex", total: 80.0 },
//! ].into();
//! let columns = vec![
//!     ColumnDescriptor::new("client", "Client", |i: &Invoice| i.client.into()).searchable(true),
//!     ColumnDescriptor::new("total", "Total", |i: &Invoice| i.total.into()).sortable(true),
//! ];
//! let mut grid = GridModel::new(columns, Some(rows), GridConfig::default()).unwrap();
//! grid.update(Message::SetSearchText("acme".into()));
//! assert_eq!(grid.view().page_rows.len(), 1);
//! ```

pub mod cell;
pub mod column;
pub mod domain;
pub mod filter;
pub mod loader;
pub mod model;
pub mod overlay;
pub mod page_range;
pub mod pagination;
pub mod sort;
pub mod visibility;

pub use cell::CellValue;
pub use column::{Align, ColumnDescriptor, ColumnSet};
pub use domain::{GridConfig, GridError, GridEvent, Message};
pub use filter::{FilterList, FilterState, StructuredFilter};
pub use model::{GridModel, GridView, PageRow, ViewState};
pub use overlay::{DismissListeners, Dismissal, GlobalEvent, Overlay, OverlayKind};
pub use page_range::{PageLabel, compute_range};
pub use pagination::{PaginationController, PaginationPolicy, SummaryRange};
pub use sort::{SortDirection, SortState, SortToggle};
pub use visibility::ColumnVisibility;
