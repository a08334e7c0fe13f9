//! Class metadata.

use super::property::{PropertyKind, PropertyMetadata};
use crate::error::Error;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Where persistent state is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Declared fields.
    Field,
    /// Getter/setter pairs.
    Method,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessType::Field => f.write_str("field"),
            AccessType::Method => f.write_str("method"),
        }
    }
}

/// Whether a mapped class is an entity or an embeddable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassKind {
    /// An entity with its entity name.
    Entity {
        /// Explicit entity name or the simple class name.
        entity_name: String,
    },
    /// A value type embedded into entities.
    Embeddable,
}

/// Class metadata by class name, owned by a factory and shared with its entity views.
pub(crate) type MetadataCache = DashMap<String, Arc<ClassMetadata>>;

/// Properties of a class once introspection has finished.
#[derive(Debug, Default)]
pub(crate) struct ClassShape {
    pub(crate) properties: HashMap<String, PropertyMetadata>,
    pub(crate) identifier: Option<String>,
    pub(crate) version: Option<String>,
}

/// Introspected shape of a mapped class.
///
/// Instances are registered in the factory cache before their properties are
/// known, so that self and mutually referencing classes resolve to the same
/// instance. Properties become visible in one step once introspection has
/// finished; until then every property lookup returns nothing.
#[derive(Debug)]
pub struct ClassMetadata {
    mapped_class: String,
    kind: ClassKind,
    access_type: AccessType,
    shape: OnceLock<ClassShape>,
    published: AtomicBool,
}

impl ClassMetadata {
    pub(crate) fn new(mapped_class: impl Into<String>, kind: ClassKind, access_type: AccessType) -> Self {
        Self {
            mapped_class: mapped_class.into(),
            kind,
            access_type,
            shape: OnceLock::new(),
            published: AtomicBool::new(false),
        }
    }

    /// Freeze the introspected properties.
    pub(crate) fn populate(&self, shape: ClassShape) {
        let _ = self.shape.set(shape);
    }

    /// Mark the metadata as complete, together with everything it references.
    pub(crate) fn publish(&self) {
        self.published.store(true, Ordering::Release);
    }

    pub(crate) fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    /// Name of the mapped class.
    pub fn mapped_class(&self) -> &str {
        &self.mapped_class
    }

    /// Entity or embeddable.
    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    /// Check if the class is an entity.
    pub fn is_entity(&self) -> bool {
        matches!(self.kind, ClassKind::Entity { .. })
    }

    /// Entity name, `None` for embeddables.
    pub fn entity_name(&self) -> Option<&str> {
        match &self.kind {
            ClassKind::Entity { entity_name } => Some(entity_name),
            ClassKind::Embeddable => None,
        }
    }

    /// Access strategy used to introspect the class.
    pub fn access_type(&self) -> AccessType {
        self.access_type
    }

    /// Check if the properties have been introspected.
    pub fn is_populated(&self) -> bool {
        self.shape.get().is_some()
    }

    /// Get a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.shape.get()?.properties.get(name)
    }

    /// Check if the class has a property.
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// All properties, in no particular order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
        self.shape
            .get()
            .into_iter()
            .flat_map(|shape| shape.properties.values())
    }

    /// Persistent properties.
    pub fn persistent_properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
        self.properties().filter(|p| p.is_persistent())
    }

    /// Non-persistent properties.
    pub fn transient_properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
        self.properties().filter(|p| !p.is_persistent())
    }

    /// Property names, sorted.
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties().map(PropertyMetadata::name).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a dotted property path through embedded and referenced types.
    pub fn nested_property(&self, path: &str) -> Option<PropertyMetadata> {
        let mut segments = path.split('.');
        let mut current = self.property(segments.next()?)?.clone();
        for segment in segments {
            let owner = current.type_metadata()?;
            current = owner.property(segment)?.clone();
        }
        Some(current)
    }

    /// Identifier property.
    pub fn identifier_property(&self) -> Option<&PropertyMetadata> {
        let shape = self.shape.get()?;
        shape
            .identifier
            .as_deref()
            .and_then(|name| shape.properties.get(name))
    }

    /// Version property.
    pub fn version_property(&self) -> Option<&PropertyMetadata> {
        let shape = self.shape.get()?;
        shape
            .version
            .as_deref()
            .and_then(|name| shape.properties.get(name))
    }

    /// Check if an identifier property was found.
    pub fn has_identifier_property(&self) -> bool {
        self.identifier_property().is_some()
    }

    /// Check if a version property was found.
    pub fn has_version_property(&self) -> bool {
        self.version_property().is_some()
    }

    /// Check if the identifier is an embedded value.
    pub fn has_embedded_identifier(&self) -> bool {
        self.identifier_property()
            .is_some_and(|p| p.kind() == PropertyKind::Embedded)
    }
}

/// Metadata of a class known to be an entity.
///
/// Holds on to the cache of the factory it came from, so embedded and
/// referenced types stay reachable through property links.
#[derive(Debug, Clone)]
pub struct EntityClassMetadata {
    inner: Arc<ClassMetadata>,
    cache: Arc<MetadataCache>,
}

impl EntityClassMetadata {
    pub(crate) fn from_class(inner: Arc<ClassMetadata>, cache: Arc<MetadataCache>) -> Result<Self, Error> {
        if !inner.is_entity() {
            return Err(Error::NotAnEntity(inner.mapped_class().to_string()));
        }
        Ok(Self { inner, cache })
    }

    pub(crate) fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Entity name: the explicit annotation value or the simple class name.
    pub fn entity_name(&self) -> &str {
        self.inner.entity_name().unwrap_or(self.inner.mapped_class())
    }

    /// The shared class metadata instance.
    pub fn as_class_metadata(&self) -> &Arc<ClassMetadata> {
        &self.inner
    }

    /// Unwrap into the shared class metadata instance.
    ///
    /// Property links of the result only resolve while the factory, or
    /// another entity view from it, is alive.
    pub fn into_class_metadata(self) -> Arc<ClassMetadata> {
        self.inner
    }
}

impl Deref for EntityClassMetadata {
    type Target = ClassMetadata;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::property::PropertyAccess;

    fn simple(name: &str) -> PropertyMetadata {
        PropertyMetadata::new(
            name.into(),
            "String".into(),
            PropertyKind::Simple,
            PropertyAccess::Field { field: name.into() },
            vec![],
            None,
        )
    }

    #[test]
    fn test_unpopulated_metadata_has_no_properties() {
        let metadata = ClassMetadata::new("Person", ClassKind::Embeddable, AccessType::Field);
        assert!(!metadata.is_populated());
        assert!(metadata.property("name").is_none());
        assert_eq!(metadata.properties().count(), 0);
        assert!(!metadata.has_identifier_property());
    }

    #[test]
    fn test_populate_is_frozen() {
        let metadata = ClassMetadata::new("Person", ClassKind::Embeddable, AccessType::Field);

        let mut shape = ClassShape::default();
        shape.properties.insert("name".into(), simple("name"));
        metadata.populate(shape);

        let mut second = ClassShape::default();
        second.properties.insert("other".into(), simple("other"));
        metadata.populate(second);

        assert!(metadata.is_populated());
        assert_eq!(metadata.property_names(), vec!["name"]);
    }

    #[test]
    fn test_entity_wrapper_rejects_embeddables() {
        let embeddable = Arc::new(ClassMetadata::new("Address", ClassKind::Embeddable, AccessType::Field));
        assert!(matches!(
            EntityClassMetadata::from_class(embeddable, Arc::default()),
            Err(Error::NotAnEntity(_))
        ));

        let entity = Arc::new(ClassMetadata::new(
            "com.example.Person",
            ClassKind::Entity {
                entity_name: "Person".into(),
            },
            AccessType::Method,
        ));
        let wrapped = EntityClassMetadata::from_class(Arc::clone(&entity), Arc::default()).unwrap();
        assert_eq!(wrapped.entity_name(), "Person");
        assert!(Arc::ptr_eq(wrapped.as_class_metadata(), &entity));
        assert_eq!(wrapped.access_type(), AccessType::Method);
    }
}
