//! Entity metadata engine.
//!
//! Derives the persistent-property model of mapped classes from declarative
//! type descriptions:
//!
//! - [`descriptor`] - Class, field and method descriptions with annotations
//! - [`registry`] - The set of descriptions, loadable from JSON or a binary snapshot
//! - [`property`] - Per-property metadata and kind classification
//! - [`class`] - Class and entity metadata
//! - [`factory`] - Memoizing, cycle-safe metadata construction

pub mod class;
pub mod descriptor;
pub mod factory;
pub mod property;
pub mod registry;

pub use class::{AccessType, ClassKind, ClassMetadata, EntityClassMetadata};
pub use descriptor::{
    Annotation, AnnotationKind, FieldDescriptor, MethodDescriptor, Modifiers, TypeDescriptor,
};
pub use factory::MetadataFactory;
pub use property::{PropertyAccess, PropertyKind, PropertyMetadata};
pub use registry::TypeRegistry;
