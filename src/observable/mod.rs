//! Reactive Values
//!
//! A minimal single-threaded observable library: cells that can be read,
//! subscribed to and updated, plus the pure combinators the datagrid
//! pipeline is assembled from.
//!
//! # Data Flow
//!
//! ```text
//! Observable roots → map/filter/start_with → combine_latest → guarded map → effects
//! ```
//!
//! Propagation is fully synchronous and runs in dependency order; see
//! [`cell`] for the phase and ordering guarantees.

pub mod cell;
pub mod combinators;
pub mod guards;

pub use cell::{Observable, Phase, Subscription, WeakObservable, observable};
pub use combinators::{
    combine_latest2, combine_latest3, combine_latest4, combine_map2, combine_map3, combine_map4,
    filter, map, start_with, with_deep_equals,
};
pub use guards::{MaybeEmpty, SomeEmpty, not_some_empty};
