//! Property metadata.

use super::class::ClassMetadata;
use super::descriptor::{Annotation, AnnotationKind};
use std::fmt;
use std::sync::{Arc, Weak};

/// Mapping shape of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Basic value stored in a column.
    Simple,
    /// Embeddable value stored in the owner's table.
    Embedded,
    /// Reference to a single entity, owning side.
    ManyToOne,
    /// Reference to a single entity.
    OneToOne,
    /// Collection of entities.
    OneToMany,
    /// Collection of entities shared between owners.
    ManyToMany,
    /// Collection of basic or embeddable values.
    ElementCollection,
    /// Exposed by accessors but not persistent.
    NonPersistent,
}

impl PropertyKind {
    /// Check if the property is persistent.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, PropertyKind::NonPersistent)
    }

    /// Check if the property references a single entity.
    pub fn is_reference(&self) -> bool {
        matches!(self, PropertyKind::ManyToOne | PropertyKind::OneToOne)
    }

    /// Check if the property holds a collection.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            PropertyKind::OneToMany | PropertyKind::ManyToMany | PropertyKind::ElementCollection
        )
    }

    /// Check if the property carries metadata of its value type.
    pub fn has_type_metadata(&self) -> bool {
        matches!(self, PropertyKind::Embedded) || self.is_reference()
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Simple => "simple",
            PropertyKind::Embedded => "embedded",
            PropertyKind::ManyToOne => "many-to-one",
            PropertyKind::OneToOne => "one-to-one",
            PropertyKind::OneToMany => "one-to-many",
            PropertyKind::ManyToMany => "many-to-many",
            PropertyKind::ElementCollection => "element-collection",
            PropertyKind::NonPersistent => "non-persistent",
        };
        f.write_str(name)
    }
}

/// How a property value is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAccess {
    /// Direct field access.
    Field {
        /// Field name.
        field: String,
    },
    /// Getter and optional setter.
    Accessor {
        /// Getter method name.
        getter: String,
        /// Setter method name, absent for read-only properties.
        setter: Option<String>,
    },
}

/// Metadata of one property of a mapped class.
///
/// Created once during class introspection and immutable afterwards.
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    name: String,
    type_name: String,
    kind: PropertyKind,
    access: PropertyAccess,
    annotations: Vec<Annotation>,
    type_metadata: Option<Weak<ClassMetadata>>,
}

impl PropertyMetadata {
    pub(crate) fn new(
        name: String,
        type_name: String,
        kind: PropertyKind,
        access: PropertyAccess,
        annotations: Vec<Annotation>,
        type_metadata: Option<Weak<ClassMetadata>>,
    ) -> Self {
        Self {
            name,
            type_name,
            kind,
            access,
            annotations,
            type_metadata,
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Mapping shape.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Access strategy.
    pub fn access(&self) -> &PropertyAccess {
        &self.access
    }

    /// Annotations on the field or getter.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Check if the property carries an annotation.
    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }

    /// Check if the property is persistent.
    pub fn is_persistent(&self) -> bool {
        self.kind.is_persistent()
    }

    /// Check if the property can be written.
    ///
    /// Field properties are always writable since final fields are never
    /// mapped. Accessor properties need a setter.
    pub fn is_writable(&self) -> bool {
        match &self.access {
            PropertyAccess::Field { .. } => true,
            PropertyAccess::Accessor { setter, .. } => setter.is_some(),
        }
    }

    /// Metadata of the value type for embedded and to-one properties.
    ///
    /// The returned metadata may be the owner itself for self references.
    pub fn type_metadata(&self) -> Option<Arc<ClassMetadata>> {
        self.type_metadata.as_ref().and_then(Weak::upgrade)
    }
}
