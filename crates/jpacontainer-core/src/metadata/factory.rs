//! Metadata factory.
//!
//! Derives [`ClassMetadata`] from the type descriptions in a [`TypeRegistry`]
//! and memoizes the result per class.
//!
//! # Cycles
//!
//! A class is inserted into the cache before its properties are introspected.
//! A property referring back to a class that is still being built (a
//! `manager: Person` on `Person`, or an embeddable referring to its owner)
//! resolves to that placeholder instead of starting another build.
//!
//! # Concurrency
//!
//! Builds run under a re-entrant lock: the building thread may observe its own
//! placeholders while recursing, other threads wait until the whole build has
//! finished. Lookups that hit a published entry never take the lock.
//!
//! # Lifetime
//!
//! Links between classes are weak. The cache owning the linked metadata is
//! shared with every [`EntityClassMetadata`] handed out, so the links stay
//! resolvable after the factory itself is dropped.

use super::class::{AccessType, ClassKind, ClassMetadata, ClassShape, EntityClassMetadata, MetadataCache};
use super::descriptor::{Annotation, AnnotationKind, TypeDescriptor};
use super::property::{PropertyAccess, PropertyKind, PropertyMetadata};
use super::registry::TypeRegistry;
use crate::error::Error;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace, warn};

static GLOBAL: OnceLock<MetadataFactory> = OnceLock::new();

/// Bookkeeping for the build currently running on the lock-holding thread.
#[derive(Debug, Default)]
struct BuildState {
    depth: usize,
    inserted: Vec<String>,
}

/// Memoizing factory of class metadata.
pub struct MetadataFactory {
    registry: Arc<TypeRegistry>,
    cache: Arc<MetadataCache>,
    build: ReentrantMutex<RefCell<BuildState>>,
}

impl MetadataFactory {
    /// Create a factory over a registry.
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    /// Create a factory over a shared registry.
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            cache: Arc::new(DashMap::new()),
            build: ReentrantMutex::new(RefCell::new(BuildState::default())),
        }
    }

    /// Install the process-wide factory.
    ///
    /// The first call wins; later calls keep the installed factory and
    /// discard their registry.
    pub fn install(registry: TypeRegistry) -> &'static MetadataFactory {
        let mut installed = false;
        let factory = GLOBAL.get_or_init(|| {
            installed = true;
            MetadataFactory::new(registry)
        });
        if !installed {
            warn!("Metadata factory already installed, ignoring new registry");
        }
        factory
    }

    /// The process-wide factory, if installed.
    pub fn global() -> Option<&'static MetadataFactory> {
        GLOBAL.get()
    }

    /// The type descriptions this factory reads.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Number of cached classes.
    pub fn cached_classes(&self) -> usize {
        self.cache.len()
    }

    /// Metadata of an entity class.
    ///
    /// The access type is the one of the first identifier annotation found,
    /// looking at declared fields before declared methods, from the class up
    /// through its mapped superclasses.
    pub fn get_entity_class_metadata(&self, class: &str) -> Result<EntityClassMetadata, Error> {
        let descriptor = self.registry.require(class)?;
        if !descriptor.has_annotation(AnnotationKind::Entity) {
            return Err(Error::NotAnEntity(class.to_string()));
        }
        let access_type = self.determine_access_type(descriptor)?;
        let metadata = self.get_class_metadata(class, access_type)?;
        EntityClassMetadata::from_class(metadata, Arc::clone(&self.cache))
    }

    /// Metadata of an entity or embeddable class.
    ///
    /// Repeated calls return the same instance. The access type only matters
    /// for the first call; cached metadata keeps the access type it was built
    /// with. Links to embedded and referenced classes resolve as long as the
    /// factory, or an [`EntityClassMetadata`] obtained from it, is alive.
    pub fn get_class_metadata(
        &self,
        class: &str,
        access_type: AccessType,
    ) -> Result<Arc<ClassMetadata>, Error> {
        if let Some(metadata) = self.published(class) {
            return Ok(metadata);
        }

        let guard = self.build.lock();
        // Either another thread finished the build while we waited, or this
        // thread is recursing into a class it is still building.
        if let Some(metadata) = self.cache.get(class).map(|m| Arc::clone(&m)) {
            return Ok(metadata);
        }

        guard.borrow_mut().depth += 1;
        let result = self.build_class(class, access_type);

        let mut state = guard.borrow_mut();
        state.depth -= 1;
        if state.depth == 0 {
            let inserted = std::mem::take(&mut state.inserted);
            match &result {
                Ok(_) => {
                    for key in &inserted {
                        if let Some(metadata) = self.cache.get(key) {
                            metadata.publish();
                        }
                    }
                }
                Err(e) => {
                    warn!(class, error = %e, discarded = inserted.len(), "Class metadata build failed");
                    for key in &inserted {
                        self.cache.remove(key);
                    }
                }
            }
        }
        result
    }

    fn published(&self, class: &str) -> Option<Arc<ClassMetadata>> {
        self.cache
            .get(class)
            .filter(|m| m.is_published())
            .map(|m| Arc::clone(&m))
    }

    fn determine_access_type(&self, descriptor: &TypeDescriptor) -> Result<AccessType, Error> {
        let is_identifier = |annotations: &[Annotation]| {
            annotations
                .iter()
                .any(|a| matches!(a.kind, AnnotationKind::Id | AnnotationKind::EmbeddedId))
        };

        let hierarchy = self.registry.superclass_chain(descriptor)?;
        for t in mapped_hierarchy(&hierarchy) {
            if t.fields.iter().any(|f| is_identifier(&f.annotations)) {
                return Ok(AccessType::Field);
            }
            if t.methods.iter().any(|m| is_identifier(&m.annotations)) {
                return Ok(AccessType::Method);
            }
        }
        Err(Error::MissingIdentifier(descriptor.name.clone()))
    }

    fn build_class(&self, class: &str, access_type: AccessType) -> Result<Arc<ClassMetadata>, Error> {
        let descriptor = self.registry.require(class)?;
        let kind = if descriptor.has_annotation(AnnotationKind::Entity) {
            let entity_name = descriptor
                .annotation_value(AnnotationKind::Entity)
                .unwrap_or_else(|| descriptor.simple_name())
                .to_string();
            ClassKind::Entity { entity_name }
        } else if descriptor.has_annotation(AnnotationKind::Embeddable) {
            ClassKind::Embeddable
        } else {
            return Err(Error::NotMapped(class.to_string()));
        };

        let hierarchy = self.registry.superclass_chain(descriptor)?;

        debug!(class, %access_type, "Building class metadata");
        let metadata = Arc::new(ClassMetadata::new(class, kind, access_type));
        self.cache.insert(class.to_string(), Arc::clone(&metadata));
        self.build.lock().borrow_mut().inserted.push(class.to_string());

        let mut shape = ShapeBuilder::default();
        for t in mapped_hierarchy(&hierarchy) {
            match access_type {
                AccessType::Field => self.extract_from_fields(t, &mut shape)?,
                AccessType::Method => self.extract_from_methods(&hierarchy, t, &mut shape)?,
            }
        }

        let shape = shape.finish();
        debug!(
            class,
            properties = shape.properties.len(),
            identifier = shape.identifier.as_deref(),
            version = shape.version.as_deref(),
            "Class metadata built"
        );
        metadata.populate(shape);
        Ok(metadata)
    }

    fn extract_from_fields(&self, t: &TypeDescriptor, shape: &mut ShapeBuilder) -> Result<(), Error> {
        for field in &t.fields {
            let m = field.modifiers;
            if m.is_static || m.is_final || m.is_transient || field.has_annotation(AnnotationKind::Transient) {
                trace!(class = %t.name, field = %field.name, "Skipping non-persistent field");
                continue;
            }
            if shape.contains(&field.name) {
                continue;
            }

            let (kind, type_metadata) =
                self.classify(&field.annotations, &field.type_name, AccessType::Field)?;
            trace!(class = %t.name, field = %field.name, %kind, "Field property");
            shape.add(PropertyMetadata::new(
                field.name.clone(),
                field.type_name.clone(),
                kind,
                PropertyAccess::Field {
                    field: field.name.clone(),
                },
                field.annotations.clone(),
                type_metadata,
            ));
        }
        Ok(())
    }

    fn extract_from_methods(
        &self,
        hierarchy: &[&TypeDescriptor],
        t: &TypeDescriptor,
        shape: &mut ShapeBuilder,
    ) -> Result<(), Error> {
        for method in &t.methods {
            let Some(name) = method.getter_property() else {
                continue;
            };
            if shape.contains(&name) {
                continue;
            }
            let type_name = method.return_type.clone().unwrap_or_default();
            let setter = find_setter(hierarchy, &name);
            let access = PropertyAccess::Accessor {
                getter: method.name.clone(),
                setter: setter.clone(),
            };

            let (kind, type_metadata) =
                if setter.is_none() || method.has_annotation(AnnotationKind::Transient) {
                    (PropertyKind::NonPersistent, None)
                } else {
                    self.classify(&method.annotations, &type_name, AccessType::Method)?
                };
            trace!(class = %t.name, property = %name, %kind, "Accessor property");
            shape.add(PropertyMetadata::new(
                name,
                type_name,
                kind,
                access,
                method.annotations.clone(),
                type_metadata,
            ));
        }
        Ok(())
    }

    fn classify(
        &self,
        annotations: &[Annotation],
        type_name: &str,
        access_type: AccessType,
    ) -> Result<(PropertyKind, Option<Weak<ClassMetadata>>), Error> {
        let has = |kind| annotations.iter().any(|a: &Annotation| a.kind == kind);

        if has(AnnotationKind::Embedded) || has(AnnotationKind::EmbeddedId) {
            let embedded = self.get_class_metadata(type_name, access_type)?;
            return Ok((PropertyKind::Embedded, Some(Arc::downgrade(&embedded))));
        }
        for (annotation, kind) in [
            (AnnotationKind::ManyToOne, PropertyKind::ManyToOne),
            (AnnotationKind::OneToOne, PropertyKind::OneToOne),
        ] {
            if has(annotation) {
                let target = self.get_entity_class_metadata(type_name)?;
                return Ok((kind, Some(Arc::downgrade(target.as_class_metadata()))));
            }
        }
        for (annotation, kind) in [
            (AnnotationKind::OneToMany, PropertyKind::OneToMany),
            (AnnotationKind::ManyToMany, PropertyKind::ManyToMany),
            (AnnotationKind::ElementCollection, PropertyKind::ElementCollection),
        ] {
            if has(annotation) {
                return Ok((kind, None));
            }
        }
        Ok((PropertyKind::Simple, None))
    }
}

/// The class and the superclasses above it that contribute mapped state.
fn mapped_hierarchy<'a>(hierarchy: &'a [&'a TypeDescriptor]) -> &'a [&'a TypeDescriptor] {
    let mapped = hierarchy
        .iter()
        .skip(1)
        .take_while(|s| {
            s.has_annotation(AnnotationKind::MappedSuperclass)
                || s.has_annotation(AnnotationKind::Entity)
        })
        .count();
    &hierarchy[..hierarchy.len().min(mapped + 1)]
}

/// Setter declared on the class or any of its described superclasses.
fn find_setter(hierarchy: &[&TypeDescriptor], property: &str) -> Option<String> {
    hierarchy
        .iter()
        .find_map(|t| t.find_setter(property))
        .map(|setter| setter.name.clone())
}

/// Accumulates properties while walking a class and its superclasses.
#[derive(Default)]
struct ShapeBuilder {
    order: Vec<String>,
    properties: std::collections::HashMap<String, PropertyMetadata>,
}

impl ShapeBuilder {
    fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    fn add(&mut self, property: PropertyMetadata) {
        self.order.push(property.name().to_string());
        self.properties.insert(property.name().to_string(), property);
    }

    /// Locate identifier and version among the persistent properties.
    fn finish(self) -> ClassShape {
        let mut identifier = None;
        let mut version = None;
        for name in &self.order {
            if identifier.is_some() && version.is_some() {
                break;
            }
            let Some(property) = self.properties.get(name) else {
                continue;
            };
            if !property.is_persistent() {
                continue;
            }
            if identifier.is_none()
                && (property.has_annotation(AnnotationKind::Id)
                    || property.has_annotation(AnnotationKind::EmbeddedId))
            {
                identifier = Some(name.clone());
            }
            if version.is_none() && property.has_annotation(AnnotationKind::Version) {
                version = Some(name.clone());
            }
        }
        ClassShape {
            properties: self.properties,
            identifier,
            version,
        }
    }
}

impl std::fmt::Debug for MetadataFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataFactory")
            .field("types", &self.registry.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}
