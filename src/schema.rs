//! External capabilities the pipeline consumes.
//!
//! The schema, the scenario label resolver and the scenario data source are
//! host-owned collaborators. They are injected into the
//! [`Datagrid`](crate::pipeline::Datagrid) constructor rather than looked up
//! from ambient state, so the whole pipeline can be driven with in-memory
//! fakes.
//!
//! An entity is either an *array* (its `index_sets` name the set entities it
//! is indexed by) or a *set* (it carries its own `elements` and indexes
//! itself). Only array entities contribute value columns; set entities
//! surface as index columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observable::Observable;
use crate::options::ColumnOptions;

/// Read-only entity catalog.
pub trait Schema {
    /// Look up an entity by name.
    fn entity(&self, name: &str) -> Option<EntityDef>;

    /// Raw cell value of an array entity at one index key, if any.
    fn value(&self, entity: &str, key: &[String]) -> Option<Value>;
}

/// Definition of one schema entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityDef {
    pub name: String,
    pub abbreviation: Option<String>,
    /// For array entities: names of the set entities indexing it, in tuple
    /// order (a repeated name means the dimension occurs at several
    /// positions).
    pub index_sets: Vec<String>,
    /// For set entities: member values, in display order.
    pub elements: Vec<String>,
}

impl EntityDef {
    /// A set entity indexes itself.
    pub fn is_set(&self) -> bool {
        self.index_sets.is_empty() && !self.elements.is_empty()
    }
}

/// Resolves the display label of an index value in scenario context.
pub trait LabelResolver {
    fn label(
        &self,
        schema: &dyn Schema,
        scenarios: &[String],
        entity: &EntityDef,
        raw: &str,
    ) -> String;
}

/// Observable-producing capability yielding scenario-comparison data.
/// An emission of `None` means the grid shows a single, non-comparison view.
pub trait ScenarioSource {
    fn scenario_data(
        &self,
        column_options: &Observable<ColumnOptions>,
    ) -> Observable<Option<ScenarioData>>;
}

/// Scenario-comparison configuration: the default scenario plus a mapping
/// from display label to scenario id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioData {
    pub default_scenario: String,
    pub scenarios: BTreeMap<String, String>,
}

impl ScenarioData {
    /// The default scenario followed by every comparison scenario id,
    /// deduplicated, first occurrence wins.
    pub fn all_scenarios(&self) -> Vec<String> {
        let mut out = vec![self.default_scenario.clone()];
        for id in self.scenarios.values() {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        out
    }
}

/// In-memory [`Schema`] for tests and simple hosts.
#[derive(Debug, Clone, Default)]
pub struct MemorySchema {
    entities: BTreeMap<String, EntityDef>,
    values: BTreeMap<(String, Vec<String>), Value>,
}

impl MemorySchema {
    pub fn new() -> Self {
        MemorySchema::default()
    }

    pub fn insert_entity(&mut self, entity: EntityDef) -> &mut Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    pub fn insert_value(
        &mut self,
        entity: impl Into<String>,
        key: &[&str],
        value: Value,
    ) -> &mut Self {
        let key = key.iter().map(|k| (*k).to_string()).collect();
        self.values.insert((entity.into(), key), value);
        self
    }
}

impl Schema for MemorySchema {
    fn entity(&self, name: &str) -> Option<EntityDef> {
        self.entities.get(name).cloned()
    }

    fn value(&self, entity: &str, key: &[String]) -> Option<Value> {
        self.values.get(&(entity.to_string(), key.to_vec())).cloned()
    }
}
