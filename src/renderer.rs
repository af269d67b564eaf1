//! Renderer boundary.
//!
//! The grid widget itself is an external collaborator; this module defines
//! the capability surface the pipeline drives it through. A renderer handle
//! is exclusively owned by the [`Datagrid`](crate::pipeline::Datagrid) that
//! created it - no other component may construct or destroy one.
//!
//! `set_data` completes through a callback so a renderer whose data
//! application is asynchronous can report success or rejection after the
//! call returns. The pipeline tags every renderer with a generation and
//! ignores completions from superseded generations.

use std::rc::Rc;

use thiserror::Error;

use crate::columns::ColumnDef;
use crate::observable::MaybeEmpty;
use crate::transform::RowRecord;

/// Completion callback for [`RendererHandle::set_data`].
pub type SetDataDone = Box<dyn FnOnce(Result<(), RendererError>)>;

/// Failures at the renderer boundary. All recoverable: the pipeline logs and
/// waits for the next valid tuple.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("renderer construction failed: {0}")]
    Construct(String),
    #[error("data application rejected: {0}")]
    SetData(String),
    #[error("renderer already destroyed")]
    Destroyed,
}

/// A live grid widget instance.
pub trait RendererHandle {
    /// Replace the column set.
    fn set_columns(&self, columns: &[ColumnDef]);

    /// Apply a new row set. `done` is invoked exactly once, possibly after
    /// this call returns.
    fn set_data(&self, rows: Vec<RowRecord>, done: SetDataDone);

    /// Repaint with the current columns and data.
    fn redraw(&self);

    /// Tear the widget down. Must complete synchronously; the pipeline
    /// relies on destruction finishing before a successor receives data.
    fn destroy(&self);
}

/// Creates renderer instances for a mount target.
pub trait RendererFactory {
    /// Build a widget on `target`. The factory must invoke
    /// `options.on_built` exactly once, after the instance is fully
    /// constructed and before any data is set on it.
    fn create(
        &self,
        target: &str,
        options: &RendererOptions,
    ) -> Result<Rc<dyn RendererHandle>, RendererError>;
}

/// Construction options passed to the renderer factory.
#[derive(Clone)]
pub struct RendererOptions {
    /// Text shown until the first data set arrives.
    pub placeholder: String,
    /// Stretch columns to the available width.
    pub fit_columns: bool,
    /// Whether row groups start expanded.
    pub group_start_open: bool,
    /// Show a loading indicator while data is applied.
    pub lazy_load: bool,
    /// Hook for attaching auxiliary controls once the widget exists.
    pub on_built: Option<Rc<dyn Fn()>>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        RendererOptions {
            placeholder: crate::options::DEFAULT_PLACEHOLDER.to_string(),
            fit_columns: true,
            group_start_open: false,
            lazy_load: true,
            on_built: None,
        }
    }
}

impl std::fmt::Debug for RendererOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererOptions")
            .field("placeholder", &self.placeholder)
            .field("fit_columns", &self.fit_columns)
            .field("group_start_open", &self.group_start_open)
            .field("lazy_load", &self.lazy_load)
            .field("on_built", &self.on_built.as_ref().map(|_| ".."))
            .finish()
    }
}

// A missing renderer is an empty slot in the render tuple.
impl MaybeEmpty for Option<Rc<dyn RendererHandle>> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}
