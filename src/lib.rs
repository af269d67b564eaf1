//! # gridflow
//!
//! Reactive datagrid pipeline: derives the columns and rows of a tabular
//! grid from a modeling-tool schema, user column/index configuration and
//! optional scenario-comparison data, and drives an external renderer with
//! the result.
//!
//! The grid widget itself is a collaborator behind the
//! [`renderer`] capability traits; the value of this crate is the reactive
//! transformation pipeline between configuration and widget:
//!
//! ```text
//! options / column_options → index & column derivation → column definitions
//! schema + selections + scenario data → data transform → row records
//! (table, columns, data) → set_columns / set_data / redraw
//! ```
//!
//! ## Architecture
//!
//! - [`observable`] - single-threaded reactive cells and the pure
//!   combinators (`map`, `filter`, `combine_latest`, deep-equality dedup)
//!   the graph is assembled from
//! - [`options`] - caller-supplied configuration snapshots
//! - [`schema`] - injected capabilities: entity catalog, scenario label
//!   resolver, scenario data source
//! - [`columns`] - pure index/column derivation
//! - [`transform`] - pure row-record production
//! - [`renderer`] - the external widget boundary
//! - [`pipeline`] - the [`Datagrid`](pipeline::Datagrid) assembler wiring it
//!   all together
//!
//! Propagation is fully synchronous and single-threaded: updating a root
//! observable re-evaluates every downstream stage in dependency order before
//! the call returns.

pub mod columns;
pub mod observable;
pub mod options;
pub mod pipeline;
pub mod renderer;
pub mod schema;
pub mod transform;

pub use columns::{
    ColumnDef, ColumnIndices, EntityColumn, IndexColumnSpec, IndexSelection, IndexSet,
    display_title, entity_columns, get_all_column_indices, get_display_indices, index_columns,
    index_field, materialize_index_specs,
};
pub use observable::{
    MaybeEmpty, Observable, Phase, SomeEmpty, Subscription, combine_latest2, combine_latest3,
    combine_latest4, combine_map2, combine_map3, combine_map4, filter, map, not_some_empty,
    observable, start_with, with_deep_equals,
};
pub use options::{
    ColumnOptions, DEFAULT_PLACEHOLDER, DatagridOptions, EntityOptions, IndexOptions,
    IndicesOptions,
};
pub use pipeline::{Datagrid, DatagridDeps};
pub use renderer::{
    RendererError, RendererFactory, RendererHandle, RendererOptions, SetDataDone,
};
pub use schema::{
    EntityDef, LabelResolver, MemorySchema, ScenarioData, ScenarioSource, Schema,
};
pub use transform::{RowRecord, TransformContext, data_transform};
