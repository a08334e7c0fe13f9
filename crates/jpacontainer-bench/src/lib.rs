//! JPAContainer Benchmark Suite
//!
//! Criterion benchmarks for the metadata engine and filter conversion.
//!
//! # Benchmark Categories
//!
//! - **Metadata**: Cold factory builds, cached lookups, nested path resolution
//! - **Conversion**: Filter to predicate translation, predicate evaluation

pub mod fixtures;

pub use fixtures::{chain_registry, composite_filter, sample_rows, wide_registry, Scale};
