//! Caller-supplied grid configuration.
//!
//! These structures describe what the grid IS: which entities become columns,
//! how repeated index dimensions are titled and keyed, and which render
//! target the grid mounts to. They are plain serializable snapshots of user
//! intent; everything derived from them is recomputed, never mutated in
//! place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder text shown by the renderer until data arrives.
pub const DEFAULT_PLACEHOLDER: &str = "Waiting for data";

/// Top-level grid options (the `options` observable).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatagridOptions {
    /// Render target identity. `None` means no renderer is created and the
    /// pipeline stays idle.
    pub table_id: Option<String>,
    /// Overrides [`DEFAULT_PLACEHOLDER`].
    pub placeholder: Option<String>,
}

/// One entity-level column selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOptions {
    /// Schema entity name to expose.
    pub name: String,
    /// Explicit field key; defaults to the entity name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    /// Explicit display title; falls back to the entity abbreviation, then
    /// the raw name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
}

impl EntityOptions {
    pub fn named(name: impl Into<String>) -> Self {
        EntityOptions {
            name: name.into(),
            id: None,
            title: None,
        }
    }
}

/// Per index-name/position display overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOptions {
    /// Explicit field key; defaults to `{name}_{position}`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    /// Explicit display title.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
}

/// Overrides keyed by index name, then by position within the index tuple.
pub type IndicesOptions = BTreeMap<String, BTreeMap<usize, IndexOptions>>;

/// Column configuration (the `columnOptions` observable).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnOptions {
    /// Entity-level column selections, in display order.
    pub column_options: Vec<EntityOptions>,
    /// Per index-name/position overrides.
    pub indices_options: IndicesOptions,
}
