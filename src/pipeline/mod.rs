//! Reactive Pipeline
//!
//! Connects the configuration observables to the external renderer.
//!
//! # Data Flow
//!
//! 1. **Derivation** - pure stages compute index metadata, column specs and
//!    column definitions from the schema and the configuration
//! 2. **Transformation** - the data stage reshapes everything into row
//!    records
//! 3. **Render step** - the only effectful stage: drives `set_columns`,
//!    `set_data` and `redraw` on the renderer handle
//!
//! Side effects live exclusively in the render step and the table stream's
//! teardown subscriber; every other stage is a pure computation over its
//! inputs.

pub mod datagrid;

pub use datagrid::{Datagrid, DatagridDeps};
