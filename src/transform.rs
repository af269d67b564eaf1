//! Data transformation: schema + selections + scenario data → row records.
//!
//! [`data_transform`] is pure: the same inputs (including the injected
//! capabilities in [`TransformContext`]) always yield the same row sequence
//! in the same order.

use std::rc::Rc;

use serde_json::Value;

use crate::columns::{ColumnIndices, EntityColumn, IndexColumnSpec};
use crate::observable::MaybeEmpty;
use crate::schema::{LabelResolver, Schema, ScenarioData};

/// Mapping from column field key to cell value.
pub type RowRecord = serde_json::Map<String, Value>;

/// Capabilities `data_transform` resolves values through, injected by the
/// pipeline owner.
#[derive(Clone)]
pub struct TransformContext {
    pub schema: Rc<dyn Schema>,
    pub labels: Rc<dyn LabelResolver>,
}

/// Reshape index metadata, entity columns and scenario data into one row
/// record per combination of index values.
///
/// - The row domain is the cartesian product of the element lists behind the
///   index column specs, in spec order; the first spec varies slowest.
/// - Index fields hold the raw element when no scenario data is present, and
///   the resolver's display label otherwise.
/// - Entity fields hold the schema's raw value at the row's full index key,
///   passed through unmodified; entities without a value at a key omit the
///   field.
/// - Specs whose dimension has no resolvable element list are skipped.
pub fn data_transform(
    ctx: &TransformContext,
    all_column_indices: &[ColumnIndices],
    entity_cols: &[EntityColumn],
    specs: &[IndexColumnSpec],
    scenario_data: Option<&ScenarioData>,
) -> Vec<RowRecord> {
    // Resolve each spec to its element list and dimension entity.
    let active: Vec<_> = specs
        .iter()
        .filter_map(|spec| {
            let elements = all_column_indices
                .iter()
                .flat_map(|ci| ci.sets.iter())
                .find(|set| set.name == spec.name)
                .map(|set| set.elements.as_slice())?;
            Some((spec, elements, ctx.schema.entity(&spec.name)))
        })
        .collect();

    if active.is_empty() {
        return Vec::new();
    }

    let all_scenarios = scenario_data.map(ScenarioData::all_scenarios);
    let element_lists: Vec<&[String]> = active.iter().map(|(_, elements, _)| *elements).collect();

    let mut rows = Vec::new();
    for key in cartesian(&element_lists) {
        let mut record = RowRecord::new();

        for (i, (spec, _, entity)) in active.iter().enumerate() {
            let raw = &key[i];
            let value = match (&all_scenarios, entity) {
                (Some(scenarios), Some(entity)) => {
                    ctx.labels.label(&*ctx.schema, scenarios, entity, raw)
                }
                _ => raw.clone(),
            };
            record.insert(spec.id.clone(), Value::String(value));
        }

        for column in entity_cols {
            if let Some(value) = ctx.schema.value(&column.name, &key) {
                record.insert(column.field.clone(), value);
            }
        }

        rows.push(record);
    }
    rows
}

// Cartesian product in list order, first list slowest. An empty element list
// produces no combinations at all.
fn cartesian(lists: &[&[String]]) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = vec![Vec::new()];
    for list in lists {
        let mut next = Vec::with_capacity(out.len() * list.len());
        for prefix in &out {
            for element in *list {
                let mut key = prefix.clone();
                key.push(element.clone());
                next.push(key);
            }
        }
        out = next;
    }
    out
}

impl MaybeEmpty for Option<Vec<RowRecord>> {
    fn is_empty_value(&self) -> bool {
        match self {
            None => true,
            Some(rows) => rows.is_empty(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{get_all_column_indices, get_display_indices, materialize_index_specs};
    use crate::options::{EntityOptions, IndicesOptions};
    use crate::schema::{EntityDef, MemorySchema};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn flow_schema() -> MemorySchema {
        let mut schema = MemorySchema::new();
        schema.insert_entity(EntityDef {
            name: String::from("Origin"),
            abbreviation: Some(String::from("O")),
            elements: vec![String::from("Rome"), String::from("Paris")],
            ..Default::default()
        });
        schema.insert_entity(EntityDef {
            name: String::from("Dest"),
            abbreviation: Some(String::from("D")),
            elements: vec![String::from("Lyon")],
            ..Default::default()
        });
        schema.insert_entity(EntityDef {
            name: String::from("flow"),
            index_sets: vec![String::from("Origin"), String::from("Dest")],
            ..Default::default()
        });
        schema.insert_value("flow", &["Rome", "Lyon"], json!(5));
        schema.insert_value("flow", &["Paris", "Lyon"], json!(9));
        schema
    }

    fn context(schema: MemorySchema) -> TransformContext {
        TransformContext {
            schema: Rc::new(schema),
            labels: Rc::new(TaggingLabels),
        }
    }

    struct TaggingLabels;
    impl LabelResolver for TaggingLabels {
        fn label(
            &self,
            _schema: &dyn Schema,
            scenarios: &[String],
            _entity: &EntityDef,
            raw: &str,
        ) -> String {
            format!("{raw}|{}", scenarios.join(","))
        }
    }

    fn derive(
        schema: &MemorySchema,
        selections: &[EntityOptions],
    ) -> (Vec<ColumnIndices>, Vec<EntityColumn>, Vec<IndexColumnSpec>) {
        let indices = get_all_column_indices(schema, selections);
        let display = get_display_indices(&indices, selections);
        let specs = materialize_index_specs(&display, &IndicesOptions::new());
        let entity_cols = crate::columns::entity_columns(schema, selections);
        (indices, entity_cols, specs)
    }

    #[test]
    fn test_rows_cover_the_index_product_in_order() {
        let schema = flow_schema();
        let selections = vec![EntityOptions::named("flow")];
        let (indices, entity_cols, specs) = derive(&schema, &selections);
        let ctx = context(schema);

        let rows = data_transform(&ctx, &indices, &entity_cols, &specs, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Origin_0"], json!("Rome"));
        assert_eq!(rows[0]["Dest_0"], json!("Lyon"));
        assert_eq!(rows[0]["flow"], json!(5));
        assert_eq!(rows[1]["Origin_0"], json!("Paris"));
        assert_eq!(rows[1]["flow"], json!(9));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let schema = flow_schema();
        let selections = vec![EntityOptions::named("flow")];
        let (indices, entity_cols, specs) = derive(&schema, &selections);
        let ctx = context(schema);

        let first = data_transform(&ctx, &indices, &entity_cols, &specs, None);
        let second = data_transform(&ctx, &indices, &entity_cols, &specs, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_scenario_data_routes_index_values_through_resolver() {
        let schema = flow_schema();
        let selections = vec![EntityOptions::named("flow")];
        let (indices, entity_cols, specs) = derive(&schema, &selections);
        let ctx = context(schema);
        let scenario_data = ScenarioData {
            default_scenario: String::from("Base"),
            scenarios: BTreeMap::from([
                (String::from("A"), String::from("s1")),
                (String::from("B"), String::from("s2")),
            ]),
        };

        let rows = data_transform(&ctx, &indices, &entity_cols, &specs, Some(&scenario_data));
        assert_eq!(rows[0]["Origin_0"], json!("Rome|Base,s1,s2"));
        // Entity values pass through unmodified even in scenario context;
        // the resolver sees raw keys.
        assert_eq!(rows[0]["flow"], json!(5));
    }

    #[test]
    fn test_missing_entity_values_omit_the_field() {
        let mut schema = flow_schema();
        schema.insert_entity(EntityDef {
            name: String::from("cost"),
            index_sets: vec![String::from("Origin")],
            ..Default::default()
        });
        let selections = vec![EntityOptions::named("cost")];
        let (indices, entity_cols, specs) = derive(&schema, &selections);
        let ctx = context(schema);

        let rows = data_transform(&ctx, &indices, &entity_cols, &specs, None);
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("cost"));
    }

    #[test]
    fn test_no_active_specs_yields_no_rows() {
        let schema = flow_schema();
        let ctx = context(schema);
        let rows = data_transform(&ctx, &[], &[], &[], None);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unresolvable_spec_is_skipped() {
        let schema = flow_schema();
        let selections = vec![EntityOptions::named("flow")];
        let (indices, entity_cols, mut specs) = derive(&schema, &selections);
        specs.push(IndexColumnSpec {
            name: String::from("Ghost"),
            position: 0,
            id: String::from("Ghost_0"),
            title: None,
        });
        let ctx = context(schema);

        let rows = data_transform(&ctx, &indices, &entity_cols, &specs, None);
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("Ghost_0"));
    }

    #[test]
    fn test_empty_element_list_produces_no_rows() {
        let lists: Vec<&[String]> = vec![&[], &[]];
        assert!(cartesian(&lists).is_empty());

        let rome = [String::from("Rome")];
        let empty: [String; 0] = [];
        let lists: Vec<&[String]> = vec![&rome, &empty];
        assert!(cartesian(&lists).is_empty());
    }

    #[test]
    fn test_cartesian_first_list_varies_slowest() {
        let ab = [String::from("a"), String::from("b")];
        let xy = [String::from("x"), String::from("y")];
        let lists: Vec<&[String]> = vec![&ab, &xy];
        let product = cartesian(&lists);
        assert_eq!(
            product,
            vec![
                vec![String::from("a"), String::from("x")],
                vec![String::from("a"), String::from("y")],
                vec![String::from("b"), String::from("x")],
                vec![String::from("b"), String::from("y")],
            ]
        );
    }

    #[test]
    fn test_row_record_emptiness() {
        assert!(None::<Vec<RowRecord>>.is_empty_value());
        assert!(Some(Vec::<RowRecord>::new()).is_empty_value());
        assert!(!Some(vec![RowRecord::new()]).is_empty_value());
    }
}
