//! Integration tests for the metadata engine.

use jpacontainer_core::metadata::{
    AccessType, Annotation, AnnotationKind, FieldDescriptor, MetadataFactory, MethodDescriptor, PropertyKind,
    TypeDescriptor, TypeRegistry,
};
use jpacontainer_core::Error;
use std::sync::Arc;
use std::thread;

fn company_registry() -> TypeRegistry {
    TypeRegistry::new()
        .with_type(
            TypeDescriptor::mapped_superclass("com.example.BaseEntity")
                .with_field(FieldDescriptor::new("id", "long").annotated(AnnotationKind::Id))
                .with_field(FieldDescriptor::new("version", "int").annotated(AnnotationKind::Version)),
        )
        .with_type(
            TypeDescriptor::entity("com.example.Employee")
                .extends("com.example.BaseEntity")
                .with_field(FieldDescriptor::new("name", "String"))
                .with_field(
                    FieldDescriptor::new("address", "com.example.Address")
                        .annotated(AnnotationKind::Embedded),
                )
                .with_field(
                    FieldDescriptor::new("department", "com.example.Department")
                        .annotated(AnnotationKind::ManyToOne),
                )
                .with_field(
                    FieldDescriptor::new("skills", "java.util.Set").annotated(AnnotationKind::ManyToMany),
                )
                .with_field(
                    FieldDescriptor::new("nicknames", "java.util.List")
                        .annotated(AnnotationKind::ElementCollection),
                ),
        )
        .with_type(
            TypeDescriptor::entity("com.example.Department")
                .extends("com.example.BaseEntity")
                .with_field(FieldDescriptor::new("title", "String"))
                .with_field(
                    FieldDescriptor::new("head", "com.example.Employee").annotated(AnnotationKind::OneToOne),
                )
                .with_field(
                    FieldDescriptor::new("members", "java.util.List").annotated(AnnotationKind::OneToMany),
                ),
        )
        .with_type(
            TypeDescriptor::embeddable("com.example.Address")
                .with_field(FieldDescriptor::new("street", "String"))
                .with_field(
                    FieldDescriptor::new("location", "com.example.Location")
                        .annotated(AnnotationKind::Embedded),
                ),
        )
        .with_type(
            TypeDescriptor::embeddable("com.example.Location")
                .with_field(FieldDescriptor::new("latitude", "double"))
                .with_field(FieldDescriptor::new("longitude", "double")),
        )
}

#[test]
fn test_mapped_superclass_properties() {
    let factory = MetadataFactory::new(company_registry());
    let employee = factory
        .get_entity_class_metadata("com.example.Employee")
        .unwrap();

    assert_eq!(employee.entity_name(), "Employee");
    assert_eq!(employee.access_type(), AccessType::Field);
    assert_eq!(employee.identifier_property().unwrap().name(), "id");
    assert_eq!(employee.version_property().unwrap().name(), "version");
    assert_eq!(
        employee.property_names(),
        vec!["address", "department", "id", "name", "nicknames", "skills", "version"]
    );

    assert_eq!(employee.property("skills").unwrap().kind(), PropertyKind::ManyToMany);
    assert_eq!(
        employee.property("nicknames").unwrap().kind(),
        PropertyKind::ElementCollection
    );
    assert!(employee.property("skills").unwrap().type_metadata().is_none());
}

#[test]
fn test_mutually_referencing_entities() {
    let factory = MetadataFactory::new(company_registry());
    let employee = factory
        .get_entity_class_metadata("com.example.Employee")
        .unwrap();
    let department = factory
        .get_entity_class_metadata("com.example.Department")
        .unwrap();

    let via_employee = employee.property("department").unwrap().type_metadata().unwrap();
    assert!(Arc::ptr_eq(&via_employee, department.as_class_metadata()));

    let head = department.property("head").unwrap();
    assert_eq!(head.kind(), PropertyKind::OneToOne);
    assert!(Arc::ptr_eq(
        &head.type_metadata().unwrap(),
        employee.as_class_metadata()
    ));

    let street = employee.nested_property("department.head.address.street").unwrap();
    assert_eq!(street.type_name(), "String");
}

#[test]
fn test_nested_embedded_path() {
    let factory = MetadataFactory::new(company_registry());
    let employee = factory
        .get_entity_class_metadata("com.example.Employee")
        .unwrap();

    let latitude = employee.nested_property("address.location.latitude").unwrap();
    assert_eq!(latitude.name(), "latitude");
    assert_eq!(latitude.kind(), PropertyKind::Simple);

    let location = employee
        .property("address")
        .and_then(|p| p.type_metadata())
        .and_then(|a| a.property("location").and_then(|p| p.type_metadata()))
        .unwrap();
    assert!(!location.is_entity());
    assert_eq!(location.property_names(), vec!["latitude", "longitude"]);
}

#[test]
fn test_embedded_identifier() {
    let registry = TypeRegistry::new()
        .with_type(
            TypeDescriptor::new("OrderLine")
                .annotated(Annotation::with_value(
                    AnnotationKind::Entity,
                    "Line",
                ))
                .with_accessors("key", "OrderLineKey", [AnnotationKind::EmbeddedId])
                .with_accessors("quantity", "int", []),
        )
        .with_type(
            TypeDescriptor::embeddable("OrderLineKey")
                .with_accessors("orderId", "long", [])
                .with_accessors("lineNumber", "int", []),
        );
    let factory = MetadataFactory::new(registry);
    let line = factory.get_entity_class_metadata("OrderLine").unwrap();

    assert_eq!(line.entity_name(), "Line");
    assert_eq!(line.access_type(), AccessType::Method);
    assert!(line.has_embedded_identifier());
    assert!(!line.has_version_property());
    assert_eq!(line.identifier_property().unwrap().kind(), PropertyKind::Embedded);
    assert!(line.nested_property("key.lineNumber").is_some());
}

#[test]
fn test_transient_accessors() {
    let registry = TypeRegistry::new().with_type(
        TypeDescriptor::entity("Account")
            .with_accessors("id", "long", [AnnotationKind::Id])
            .with_accessors("balance", "long", [])
            .with_accessors("cachedScore", "int", [AnnotationKind::Transient])
            .with_method(MethodDescriptor::new(
                "isOverdrawn",
                Some("boolean".into()),
                vec![],
            )),
    );
    let factory = MetadataFactory::new(registry);
    let account = factory.get_entity_class_metadata("Account").unwrap();

    let overdrawn = account.property("overdrawn").unwrap();
    assert_eq!(overdrawn.kind(), PropertyKind::NonPersistent);
    assert!(!overdrawn.is_writable());

    let cached = account.property("cachedScore").unwrap();
    assert_eq!(cached.kind(), PropertyKind::NonPersistent);
    assert!(cached.is_writable());

    let mut persistent: Vec<&str> = account.persistent_properties().map(|p| p.name()).collect();
    persistent.sort_unstable();
    assert_eq!(persistent, vec!["balance", "id"]);
}

#[test]
fn test_identifier_in_superclass_methods() {
    let registry = TypeRegistry::new()
        .with_type(
            TypeDescriptor::mapped_superclass("Base").with_accessors("id", "long", [AnnotationKind::Id]),
        )
        .with_type(
            TypeDescriptor::entity("Child")
                .extends("Base")
                .with_accessors("label", "String", []),
        );
    let factory = MetadataFactory::new(registry);
    let child = factory.get_entity_class_metadata("Child").unwrap();

    assert_eq!(child.access_type(), AccessType::Method);
    assert_eq!(child.identifier_property().unwrap().name(), "id");
    assert!(child.property("id").unwrap().is_writable());
}

#[test]
fn test_argument_errors() {
    let factory = MetadataFactory::new(company_registry());

    let err = factory.get_entity_class_metadata("com.example.Address").unwrap_err();
    assert!(matches!(err, Error::NotAnEntity(_)));

    let err = factory.get_entity_class_metadata("com.example.Missing").unwrap_err();
    assert!(matches!(err, Error::UnknownType(_)));
    assert!(err.is_argument_error());

    let err = factory
        .get_class_metadata("com.example.BaseEntity", AccessType::Field)
        .unwrap_err();
    assert!(matches!(err, Error::NotMapped(_)));
}

#[test]
fn test_concurrent_lookups_share_one_instance() {
    let factory = Arc::new(MetadataFactory::new(company_registry()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let factory = Arc::clone(&factory);
            thread::spawn(move || {
                let class = if i % 2 == 0 {
                    "com.example.Employee"
                } else {
                    "com.example.Department"
                };
                let metadata = factory.get_entity_class_metadata(class).unwrap();
                // Entries returned to other threads are always complete.
                assert!(metadata.is_populated());
                assert!(metadata.has_identifier_property());
                factory
                    .get_entity_class_metadata("com.example.Employee")
                    .unwrap()
                    .into_class_metadata()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(instance, &instances[0]));
    }
    assert_eq!(factory.cached_classes(), 4);
}

#[test]
fn test_registry_file_drives_factory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("company.json");
    std::fs::write(&path, company_registry().to_json().unwrap()).unwrap();

    let factory = MetadataFactory::new(TypeRegistry::load(&path).unwrap());
    let department = factory
        .get_entity_class_metadata("com.example.Department")
        .unwrap();
    assert_eq!(department.entity_name(), "Department");
    assert_eq!(
        department.property("members").unwrap().kind(),
        PropertyKind::OneToMany
    );
}
