//! JPAContainer Core - Entity metadata and filter translation.
//!
//! This crate provides the two engines behind a filterable entity container:
//! the metadata engine, which derives the persistent-property model of mapped
//! classes from type descriptions, and the translation of filter trees into
//! query predicates.

pub mod config;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod metadata;

pub use config::ContainerConfig;
pub use criteria::{CriteriaBuilder, CriteriaQuery, JpqlBuilder, PredicateEvaluator};
pub use error::Error;
pub use filter::{
    AdvancedFilterableSupport, FilterConverter, FilterTranslator, FiltersAppliedListener,
    ListenerId,
};
pub use metadata::{
    AccessType, ClassMetadata, EntityClassMetadata, MetadataFactory, PropertyKind,
    PropertyMetadata, TypeDescriptor, TypeRegistry,
};

/// Re-export filter expression types.
pub use jpacontainer_proto as proto;
