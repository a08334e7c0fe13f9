//! Filter to predicate translation.
//!
//! - [`path`] - Dotted property id resolution
//! - [`converter`] - Recursive conversion of filter trees into predicates
//! - [`support`] - Per-container filter state, validation and listeners

pub mod converter;
pub mod path;
pub mod support;

pub use converter::{FilterConverter, FilterTranslator};
pub use path::{resolve_join, resolve_path};
pub use support::{AdvancedFilterableSupport, FiltersAppliedListener, ListenerId};
