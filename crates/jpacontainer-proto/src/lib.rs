//! JPAContainer filter expression types.
//!
//! This crate defines the query-engine independent building blocks shared by
//! the container core and its callers:
//!
//! - [`value`] - Runtime values used as filter operands
//! - [`filter`] - The filter expression tree
//! - [`filters`] - Factory functions for building filter trees
//! - [`error`] - Encoding error types
//!
//! Filters serialize to JSON with `serde`, tagged by a `type` field:
//!
//! ```
//! use jpacontainer_proto::{filters, Filter};
//!
//! let filter = filters::eq("name", "Alice");
//! let json = filter.to_json().unwrap();
//! assert_eq!(Filter::from_json(&json).unwrap(), filter);
//! ```

pub mod error;
pub mod filter;
pub mod filters;
pub mod value;

pub use error::Error;
pub use filter::{CompareOp, Filter};
pub use value::Value;
