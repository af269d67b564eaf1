//! Index/column derivation.
//!
//! Pure functions that turn the schema plus the entity selections into the
//! set of index dimensions exposed as columns, and resolve each column's
//! display title and field key.
//!
//! Resolution is deterministic and fails soft: an unresolvable or ambiguous
//! selection is omitted from the derived set, never guessed and never raised
//! as an error.
//!
//! Title precedence: explicit option title, else the entity abbreviation,
//! else the raw name. Field keys: explicit override id, else the generated
//! `{name}_{position}`, unique per (name, position) pair.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::options::{EntityOptions, IndicesOptions};
use crate::schema::{LabelResolver, Schema};

/// One index dimension of an entity, with its candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSet {
    pub name: String,
    pub elements: Vec<String>,
}

/// Index metadata of one resolvable selected entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndices {
    pub entity: String,
    /// Index sets in tuple order; a repeated name means the dimension occurs
    /// at several positions.
    pub sets: Vec<IndexSet>,
}

/// One dimension/position pair exposed as a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSelection {
    pub name: String,
    /// Occurrence of the dimension within one entity's index tuple.
    pub position: usize,
}

/// An [`IndexSelection`] joined with its display overrides; the field id is
/// always materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumnSpec {
    pub name: String,
    pub position: usize,
    pub id: String,
    pub title: Option<String>,
}

/// Maps a raw cell value to its display form. Pure: parameterized by the
/// resolved schema/scenario context captured at construction.
pub type CellMutator = Rc<dyn Fn(&str) -> String>;

/// Rendering-agnostic column descriptor handed to the renderer.
#[derive(Clone)]
pub struct ColumnDef {
    pub title: String,
    pub field: String,
    pub mutator: Option<CellMutator>,
}

impl ColumnDef {
    pub fn new(title: impl Into<String>, field: impl Into<String>) -> Self {
        ColumnDef {
            title: title.into(),
            field: field.into(),
            mutator: None,
        }
    }
}

impl std::fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDef")
            .field("title", &self.title)
            .field("field", &self.field)
            .field("mutator", &self.mutator.as_ref().map(|_| ".."))
            .finish()
    }
}

/// A plain entity value column. Keeps the entity name alongside the derived
/// title/field so the data transformer can look values up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityColumn {
    pub name: String,
    pub title: String,
    pub field: String,
}

impl From<&EntityColumn> for ColumnDef {
    fn from(column: &EntityColumn) -> Self {
        ColumnDef::new(column.title.clone(), column.field.clone())
    }
}

/// Generated field key for an index column without an explicit override.
pub fn index_field(name: &str, position: usize) -> String {
    format!("{name}_{position}")
}

/// Display title precedence: explicit title, else abbreviation, else name.
/// Blank strings count as absent.
pub fn display_title(title: Option<&str>, abbreviation: Option<&str>, name: &str) -> String {
    title
        .filter(|t| !t.is_empty())
        .or(abbreviation.filter(|a| !a.is_empty()))
        .unwrap_or(name)
        .to_string()
}

/// Every index dimension potentially exposable as a column, per resolvable
/// selected entity.
///
/// A set entity indexes itself; an array entity names its index sets, each of
/// which must resolve to a set entity with elements. Unresolvable index sets
/// are dropped, and an entity with no resolvable index is omitted entirely.
pub fn get_all_column_indices(
    schema: &dyn Schema,
    entities: &[EntityOptions],
) -> Vec<ColumnIndices> {
    entities
        .iter()
        .filter_map(|options| {
            let entity = schema.entity(&options.name)?;
            let index_names: Vec<String> = if !entity.index_sets.is_empty() {
                entity.index_sets.clone()
            } else if entity.is_set() {
                vec![entity.name.clone()]
            } else {
                return None;
            };

            let sets: Vec<IndexSet> = index_names
                .iter()
                .filter_map(|index_name| {
                    let index_entity = schema.entity(index_name)?;
                    if index_entity.elements.is_empty() {
                        return None;
                    }
                    Some(IndexSet {
                        name: index_entity.name,
                        elements: index_entity.elements,
                    })
                })
                .collect();

            if sets.is_empty() {
                return None;
            }
            Some(ColumnIndices {
                entity: options.name.clone(),
                sets,
            })
        })
        .collect()
}

/// Which (dimension, position) pairs become distinct columns for the current
/// selections.
///
/// Positions number the occurrences of a dimension within one entity's index
/// tuple, so an entity indexed `(City, City)` yields `City@0` and `City@1`.
/// Pairs are deduplicated across entities, first-seen order preserved.
pub fn get_display_indices(
    column_indices: &[ColumnIndices],
    entities: &[EntityOptions],
) -> Vec<IndexSelection> {
    let mut seen: HashSet<(String, usize)> = HashSet::new();
    let mut out = Vec::new();

    for options in entities {
        let Some(indices) = column_indices.iter().find(|ci| ci.entity == options.name) else {
            continue;
        };
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for set in &indices.sets {
            let slot = occurrences.entry(set.name.as_str()).or_insert(0);
            let position = *slot;
            *slot += 1;

            if seen.insert((set.name.clone(), position)) {
                out.push(IndexSelection {
                    name: set.name.clone(),
                    position,
                });
            }
        }
    }
    out
}

/// Join each selection with its per-position override, materializing the
/// default field id where none is configured.
pub fn materialize_index_specs(
    selections: &[IndexSelection],
    indices_options: &IndicesOptions,
) -> Vec<IndexColumnSpec> {
    selections
        .iter()
        .map(|selection| {
            let override_options = indices_options
                .get(&selection.name)
                .and_then(|positions| positions.get(&selection.position));
            IndexColumnSpec {
                name: selection.name.clone(),
                position: selection.position,
                id: override_options
                    .and_then(|o| o.id.clone())
                    .unwrap_or_else(|| index_field(&selection.name, selection.position)),
                title: override_options.and_then(|o| o.title.clone()),
            }
        })
        .collect()
}

/// Column descriptors for the index columns.
///
/// With scenario context present, each column carries a mutator resolving raw
/// index values to display labels through the injected resolver. Selections
/// whose dimension entity cannot be resolved are omitted.
pub fn index_columns(
    schema: &Rc<dyn Schema>,
    labels: &Rc<dyn LabelResolver>,
    specs: &[IndexColumnSpec],
    all_scenarios: &Option<Vec<String>>,
) -> Vec<ColumnDef> {
    specs
        .iter()
        .filter_map(|spec| {
            let entity = schema.entity(&spec.name)?;
            let title =
                display_title(spec.title.as_deref(), entity.abbreviation.as_deref(), &spec.name);

            let mutator = all_scenarios.as_ref().map(|scenarios| {
                let schema = Rc::clone(schema);
                let labels = Rc::clone(labels);
                let scenarios = scenarios.clone();
                let entity = entity.clone();
                Rc::new(move |raw: &str| labels.label(&*schema, &scenarios, &entity, raw))
                    as CellMutator
            });

            Some(ColumnDef {
                title,
                field: spec.id.clone(),
                mutator,
            })
        })
        .collect()
}

/// Value columns for the selected array entities.
///
/// Set entities surface as index columns only; unresolvable entities are
/// omitted.
pub fn entity_columns(schema: &dyn Schema, entities: &[EntityOptions]) -> Vec<EntityColumn> {
    entities
        .iter()
        .filter_map(|options| {
            let entity = schema.entity(&options.name)?;
            if entity.is_set() {
                return None;
            }
            Some(EntityColumn {
                name: options.name.clone(),
                title: display_title(
                    options.title.as_deref(),
                    entity.abbreviation.as_deref(),
                    &options.name,
                ),
                field: options.id.clone().unwrap_or_else(|| options.name.clone()),
            })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
