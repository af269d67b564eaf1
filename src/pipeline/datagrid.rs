//! Datagrid assembler - wires the reactive graph for one grid instance.
//!
//! # Pipeline Architecture
//!
//! ```text
//! column_options ─┬─ indices_options ───────────────────────────┐
//!                 └─ entities_options ─┬─ all_column_indices ─┐ │
//!                                      │          │           │ │
//!                                      └──────────┴─ display index specs
//! scenario source ── scenarios ── all_scenarios ──┬─ index columns
//! entities_options ── entity columns ─────────────┴─ columns
//! options ── table (renderer construction) ──┐
//!                                            ├─ render step
//! index metadata + columns + scenarios ── data ──┘
//! ```
//!
//! Every combine is guarded before consumption: a stage only advances once
//! its required inputs carry real values, so the renderer is never driven
//! with a partially initialized column or data set. The grid has two
//! effective states - Idle (guards hold everything back) and Rendered - and
//! no terminal state while the instance is alive.
//!
//! # Ordering
//!
//! The table stream's `BeforeChange` subscriber destroys a superseded
//! renderer, and completes, before default-phase subscribers see the
//! replacement; two live renderers can never write to the same mount point.
//! Renderer instances are additionally tagged with a generation so a
//! `set_data` completion arriving after its renderer was superseded is
//! discarded instead of repainting a dead widget.
//!
//! # Failure
//!
//! Nothing here is fatal: a renderer that fails to construct or rejects a
//! data set is logged and the pipeline waits for the next valid tuple.

use std::cell::Cell;
use std::rc::Rc;

use crate::columns::{
    ColumnDef, ColumnIndices, EntityColumn, IndexColumnSpec, IndexSelection, entity_columns,
    get_all_column_indices, get_display_indices, index_columns, materialize_index_specs,
};
use crate::observable::{
    Observable, Phase, Subscription, combine_latest2, combine_latest3, combine_latest4,
    combine_map2, filter, map, not_some_empty, start_with, with_deep_equals,
};
use crate::options::{
    ColumnOptions, DEFAULT_PLACEHOLDER, DatagridOptions, EntityOptions, IndicesOptions,
};
use crate::renderer::{RendererFactory, RendererHandle, RendererOptions};
use crate::schema::{LabelResolver, ScenarioData, ScenarioSource, Schema};
use crate::transform::{RowRecord, TransformContext, data_transform};

/// Capabilities injected into a [`Datagrid`]. All host-owned collaborators;
/// the pipeline can be driven entirely with in-memory fakes.
#[derive(Clone)]
pub struct DatagridDeps {
    pub schema: Rc<dyn Schema>,
    pub labels: Rc<dyn LabelResolver>,
    pub scenarios: Rc<dyn ScenarioSource>,
    pub renderers: Rc<dyn RendererFactory>,
    /// Invoked exactly once per renderer instance, after construction and
    /// before any data is set; for attaching auxiliary controls.
    pub on_built: Option<Rc<dyn Fn()>>,
}

/// One grid instance: the assembled dataflow graph plus exclusive ownership
/// of the current renderer handle.
///
/// Construction begins the dataflow immediately; there is no explicit
/// `start()`. Dropping the instance destroys the live renderer and releases
/// the whole graph.
pub struct Datagrid {
    options: Observable<DatagridOptions>,
    column_options: Observable<ColumnOptions>,
    table: Observable<Option<Rc<dyn RendererHandle>>>,
    generation: Rc<Cell<u64>>,
    _teardown: Subscription,
    _render: Observable<()>,
}

impl Datagrid {
    pub fn new(
        deps: DatagridDeps,
        options: Observable<DatagridOptions>,
        column_options: Observable<ColumnOptions>,
    ) -> Self {
        let generation = Rc::new(Cell::new(0u64));

        // Structurally equal reconfigurations must not rebuild anything.
        let options_in = with_deep_equals(&options);
        let column_options_in = with_deep_equals(&column_options);

        // Scenario data. `None` is the valid single-view state; a comparison
        // emission only takes effect once it names a default scenario.
        let scenarios_data = {
            let raw = deps.scenarios.scenario_data(&column_options_in);
            let seeded = start_with(None, &raw);
            filter(
                |data: &Option<ScenarioData>| {
                    data.as_ref().is_none_or(|d| !d.default_scenario.is_empty())
                },
                &seeded,
            )
        };

        let indices_options = map(
            |config: &ColumnOptions| config.indices_options.clone(),
            &column_options_in,
        );
        let entities_options = map(
            |config: &ColumnOptions| config.column_options.clone(),
            &column_options_in,
        );

        let all_column_indices = {
            let schema = Rc::clone(&deps.schema);
            map(
                move |entities: &Vec<EntityOptions>| get_all_column_indices(&*schema, entities),
                &entities_options,
            )
        };

        let set_name_posns = combine_map2(
            |(indices, entities): &(Vec<ColumnIndices>, Vec<EntityOptions>)| {
                get_display_indices(indices, entities)
            },
            &all_column_indices,
            &entities_options,
        );

        let index_specs = combine_map2(
            |(selections, overrides): &(Vec<IndexSelection>, IndicesOptions)| {
                materialize_index_specs(selections, overrides)
            },
            &set_name_posns,
            &indices_options,
        );

        let all_scenarios = map(
            |data: &Option<ScenarioData>| data.as_ref().map(ScenarioData::all_scenarios),
            &scenarios_data,
        );

        let indices_columns = {
            let combined = combine_latest2(&index_specs, &all_scenarios);
            let guarded = filter(
                |(specs, _): &(Vec<IndexColumnSpec>, Option<Vec<String>>)| !specs.is_empty(),
                &combined,
            );
            // Dedup here is what spares the renderer a teardown/recreate
            // cycle when upstream churn leaves the column metadata unchanged.
            let deduped = with_deep_equals(&guarded);
            let schema = Rc::clone(&deps.schema);
            let labels = Rc::clone(&deps.labels);
            map(
                move |(specs, scenarios): &(Vec<IndexColumnSpec>, Option<Vec<String>>)| {
                    index_columns(&schema, &labels, specs, scenarios)
                },
                &deduped,
            )
        };

        let entity_cols = {
            let schema = Rc::clone(&deps.schema);
            map(
                move |entities: &Vec<EntityOptions>| entity_columns(&*schema, entities),
                &entities_options,
            )
        };

        // Index columns first, then entity value columns. A set-entity-only
        // grid legitimately has no entity columns, so the stage is valid as
        // soon as the flattened set is non-empty.
        let columns = {
            let combined = combine_latest2(&indices_columns, &entity_cols);
            let guarded = filter(
                |(index_cols, entity_cols): &(Vec<ColumnDef>, Vec<EntityColumn>)| {
                    !(index_cols.is_empty() && entity_cols.is_empty())
                },
                &combined,
            );
            map(
                |(index_cols, entity_cols): &(Vec<ColumnDef>, Vec<EntityColumn>)| {
                    let mut out = index_cols.clone();
                    out.extend(entity_cols.iter().map(ColumnDef::from));
                    out
                },
                &guarded,
            )
        };

        // Mount target and construction options come from the same snapshot,
        // so one options change constructs at most one renderer.
        let table: Observable<Option<Rc<dyn RendererHandle>>> = {
            let factory = Rc::clone(&deps.renderers);
            let generation = Rc::clone(&generation);
            let on_built = deps.on_built.clone();
            map(
                move |o: &DatagridOptions| {
                    // Every table transition invalidates in-flight set-data
                    // completions, including unmounts and failed rebuilds.
                    generation.set(generation.get() + 1);
                    let target = o.table_id.as_deref()?;
                    let renderer_options = RendererOptions {
                        placeholder: o
                            .placeholder
                            .clone()
                            .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
                        on_built: on_built.clone(),
                        ..RendererOptions::default()
                    };
                    match factory.create(target, &renderer_options) {
                        Ok(handle) => Some(handle),
                        Err(err) => {
                            log::warn!("renderer construction failed on '{target}': {err}");
                            None
                        }
                    }
                },
                &options_in,
            )
        };

        // Teardown runs at BeforeChange: the old renderer is fully destroyed
        // before default-phase subscribers observe its replacement.
        let teardown = table.subscribe_phase(
            Phase::BeforeChange,
            |old: &Option<Rc<dyn RendererHandle>>| {
                if let Some(old) = old {
                    old.destroy();
                }
            },
        );

        let data = {
            let combined = combine_latest4(
                &all_column_indices,
                &entity_cols,
                &index_specs,
                &scenarios_data,
            );
            let guarded = filter(
                |(indices, _, specs, _): &(
                    Vec<ColumnIndices>,
                    Vec<EntityColumn>,
                    Vec<IndexColumnSpec>,
                    Option<ScenarioData>,
                )| { !indices.is_empty() && !specs.is_empty() },
                &combined,
            );
            let ctx = TransformContext {
                schema: Rc::clone(&deps.schema),
                labels: Rc::clone(&deps.labels),
            };
            let transformed = map(
                move |(indices, entity_cols, specs, scenario): &(
                    Vec<ColumnIndices>,
                    Vec<EntityColumn>,
                    Vec<IndexColumnSpec>,
                    Option<ScenarioData>,
                )| {
                    if indices.is_empty() || specs.is_empty() {
                        return None;
                    }
                    Some(data_transform(&ctx, indices, entity_cols, specs, scenario.as_ref()))
                },
                &guarded,
            );
            with_deep_equals(&transformed)
        };

        let render = {
            let combined = combine_latest3(&table, &columns, &data);
            let ready = filter(not_some_empty, &combined);
            let generation = Rc::clone(&generation);
            map(
                move |(table, columns, rows): &(
                    Option<Rc<dyn RendererHandle>>,
                    Vec<ColumnDef>,
                    Option<Vec<RowRecord>>,
                )| {
                    let (Some(table), Some(rows)) = (table, rows) else {
                        return;
                    };
                    if columns.is_empty() || rows.is_empty() {
                        return;
                    }
                    table.set_columns(columns);

                    let current = generation.get();
                    let done_generation = Rc::clone(&generation);
                    let done_table = Rc::clone(table);
                    table.set_data(
                        rows.clone(),
                        Box::new(move |result| {
                            if done_generation.get() != current {
                                log::debug!(
                                    "ignoring set-data completion from a superseded renderer"
                                );
                                return;
                            }
                            match result {
                                Ok(()) => done_table.redraw(),
                                Err(err) => log::warn!("renderer rejected data: {err}"),
                            }
                        }),
                    );
                },
                &ready,
            )
        };

        Datagrid {
            options,
            column_options,
            table,
            generation,
            _teardown: teardown,
            _render: render,
        }
    }

    /// Root options observable, shared with the host.
    pub fn options(&self) -> &Observable<DatagridOptions> {
        &self.options
    }

    /// Root column-configuration observable, shared with the host.
    pub fn column_options(&self) -> &Observable<ColumnOptions> {
        &self.column_options
    }

    /// The live renderer, if the grid is currently mounted.
    pub fn renderer(&self) -> Option<Rc<dyn RendererHandle>> {
        self.table.read()
    }
}

impl Drop for Datagrid {
    fn drop(&mut self) {
        // Invalidate pending set-data completions, then tear down the widget.
        self.generation.set(self.generation.get() + 1);
        if let Some(table) = self.table.read() {
            table.destroy();
        }
    }
}
