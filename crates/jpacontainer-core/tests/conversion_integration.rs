//! Integration tests for filter conversion.

use jpacontainer_core::criteria::{CriteriaBuilder, CriteriaQuery, JpqlBuilder, Path, PredicateEvaluator};
use jpacontainer_core::metadata::{AnnotationKind, MetadataFactory, TypeDescriptor, TypeRegistry};
use jpacontainer_core::{AdvancedFilterableSupport, ContainerConfig, Error, FilterConverter, FilterTranslator};
use jpacontainer_proto::filters::*;
use jpacontainer_proto::{Filter, Value};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

fn person_factory() -> MetadataFactory {
    MetadataFactory::new(
        TypeRegistry::new()
            .with_type(
                TypeDescriptor::mapped_superclass("Base")
                    .with_accessors("id", "long", [AnnotationKind::Id])
                    .with_accessors("address", "Address", [AnnotationKind::Embedded]),
            )
            .with_type(
                TypeDescriptor::entity("Person")
                    .extends("Base")
                    .with_accessors("firstName", "String", [])
                    .with_accessors("age", "int", [])
                    .with_accessors("manager", "Person", [AnnotationKind::ManyToOne])
                    .with_accessors("skills", "List", [AnnotationKind::OneToMany]),
            )
            .with_type(
                TypeDescriptor::embeddable("Address")
                    .with_accessors("street", "String", [])
                    .with_accessors("city", "String", [])
                    .with_accessors("residents", "List", [AnnotationKind::OneToMany]),
            ),
    )
}

fn convert(filter: &Filter) -> CriteriaQuery {
    let converters: Vec<std::sync::Arc<dyn FilterConverter<JpqlBuilder>>> = Vec::new();
    let translator = FilterTranslator::new(&converters, None);
    let mut cb = JpqlBuilder::new("Person");
    let root = cb.root();
    let predicate = translator.convert(filter, &mut cb, &root).unwrap();
    cb.finish(Some(predicate))
}

fn row(fields: &[(&str, Value)]) -> Vec<(String, Value)> {
    fields.iter().map(|(n, v)| (n.to_string(), v.clone())).collect()
}

fn matches(query: &CriteriaQuery, fields: &[(&str, Value)]) -> bool {
    PredicateEvaluator::new(query).matches(&row(fields)).unwrap()
}

fn hash_of(filter: &Filter) -> u64 {
    let mut hasher = DefaultHasher::new();
    filter.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_conversion_matches_hand_built_predicate() {
    let converted = convert(&and(vec![eq("x", 1), gt("y", 2)]));

    let mut cb = JpqlBuilder::new("Person");
    let root = cb.root();
    let x = cb.expression(&cb.get(&root, "x"));
    let y = cb.expression(&cb.get(&root, "y"));
    let one = cb.parameter(&Value::Int32(1));
    let two = cb.parameter(&Value::Int32(2));
    let expected = cb.and(vec![cb.equal(x, one), cb.greater_than(y, two)]);
    let expected = cb.finish(Some(expected));

    assert_eq!(converted, expected);
}

#[test]
fn test_eq_null_converts_like_is_null() {
    let eq_null = convert(&eq("x", Value::Null));
    let is_null = convert(&is_null("x"));
    assert_eq!(eq_null, is_null);
    assert!(!eq_null.to_string().contains("= NULL"));
    assert!(eq_null.parameters.is_empty());

    assert!(matches(&eq_null, &[("x", Value::Null)]));
    assert!(!matches(&eq_null, &[("x", Value::Int32(0))]));
}

#[test]
fn test_interval_boundaries() {
    let start_only = convert(&between("x", 5, 10, true, false));
    assert!(matches(&start_only, &[("x", Value::Int32(5))]));
    assert!(!matches(&start_only, &[("x", Value::Int32(10))]));

    let end_only = convert(&between("x", 5, 10, false, true));
    assert!(!matches(&end_only, &[("x", Value::Int32(5))]));
    assert!(matches(&end_only, &[("x", Value::Int32(10))]));

    let native = convert(&between_inclusive("x", 5, 10));
    assert!(native.to_string().contains("BETWEEN"));
    assert!(matches(&native, &[("x", Value::Int32(5))]));
    assert!(matches(&native, &[("x", Value::Int32(10))]));
}

#[test]
fn test_outside_is_complement_without_nulls() {
    let inside = convert(&between("x", 5, 10, true, false));
    let outside = convert(&outside("x", 5, 10, false, true));

    for x in 0..15 {
        let fields = [("x", Value::Int32(x))];
        assert_ne!(matches(&inside, &fields), matches(&outside, &fields), "x = {}", x);
    }

    // Neither side matches a null property.
    assert!(!matches(&inside, &[("x", Value::Null)]));
    assert!(!matches(&outside, &[("x", Value::Null)]));
}

#[test]
fn test_string_pattern_matching() {
    let prefix = convert(&like("name", "abc", true));
    assert_eq!(prefix.parameter("p1"), Some(&Value::from("abc%")));
    assert!(matches(&prefix, &[("name", Value::from("abcdef"))]));
    assert!(!matches(&prefix, &[("name", Value::from("xabc"))]));

    let contains = convert(&like("name", "abc", false));
    assert_eq!(contains.parameter("p1"), Some(&Value::from("%abc%")));
    assert!(matches(&contains, &[("name", Value::from("xabcx"))]));

    let ignore_case = convert(&like_ignore_case("name", "abc", true));
    assert_eq!(
        ignore_case.to_string(),
        "SELECT e FROM Person e WHERE UPPER(CONCAT(e.name, '')) LIKE UPPER(:p1)"
    );
    assert!(matches(&ignore_case, &[("name", Value::from("ABCdef"))]));
    assert!(!matches(&prefix, &[("name", Value::from("ABCdef"))]));

    // Non-string properties are compared through their text form.
    let numeric = convert(&like("zip", "90", true));
    assert!(matches(&numeric, &[("zip", Value::Int32(90210))]));
}

#[test]
fn test_empty_filters() {
    let empty = convert(&is_empty("name"));
    assert!(matches(&empty, &[("name", Value::Null)]));
    assert!(matches(&empty, &[("name", Value::from(""))]));
    assert!(!matches(&empty, &[("name", Value::from("x"))]));

    let not_empty = convert(&is_not_empty("name"));
    assert!(matches(&not_empty, &[("name", Value::from("x"))]));
    assert!(!matches(&not_empty, &[("name", Value::from(""))]));
}

#[test]
fn test_nested_path_takes_two_navigation_steps() {
    let factory = person_factory();
    let person = factory.get_entity_class_metadata("Person").unwrap();
    let support = AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&person, ContainerConfig::default());

    let mut cb = JpqlBuilder::new("Person");
    let root = cb.root();
    let predicate = support
        .convert_filter(&eq("address.street", "Main"), &mut cb, &root)
        .unwrap();

    let jpacontainer_core::criteria::Predicate::Comparison { left, .. } = predicate else {
        panic!("expected comparison");
    };
    let jpacontainer_core::criteria::Expression::Path(Path::Attribute { parent, name }) = left else {
        panic!("expected attribute path");
    };
    assert_eq!(name, "street");
    assert_eq!(
        *parent,
        Path::Attribute {
            parent: Box::new(root),
            name: "address".into()
        }
    );
}

#[test]
fn test_collection_paths_join_through_metadata() {
    let factory = person_factory();
    let person = factory.get_entity_class_metadata("Person").unwrap();
    let mut support = AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&person, ContainerConfig::default());
    support.add_filter(eq("skills.name", "Rust")).unwrap();
    support.add_filter(join_filter("skills", vec![gteq("level", 3)])).unwrap();

    let query = support.build_query(person.entity_name()).unwrap();
    assert_eq!(
        query.to_string(),
        "SELECT e FROM Person e JOIN e.skills j1 JOIN e.skills j2 WHERE (j1.name = :p1 AND j2.level >= :p2)"
    );
    assert!(matches(
        &query,
        &[("skills.name", Value::from("Rust")), ("skills.level", Value::Int32(4))]
    ));
}

#[test]
fn test_trailing_collection_segment_is_navigated() {
    let factory = person_factory();
    let person = factory.get_entity_class_metadata("Person").unwrap();
    let mut support = AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&person, ContainerConfig::default());
    support.add_filter(is_null("skills")).unwrap();

    let query = support.build_query(person.entity_name()).unwrap();
    assert_eq!(query.to_string(), "SELECT e FROM Person e WHERE e.skills IS NULL");
}

#[test]
fn test_support_resolves_paths_after_factory_is_dropped() {
    let mut support = {
        let factory = person_factory();
        let person = factory.get_entity_class_metadata("Person").unwrap();
        AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&person, ContainerConfig::default())
    };
    support.add_filter(eq("address.residents.name", "Ann")).unwrap();

    let query = support.build_query("Person").unwrap();
    assert_eq!(
        query.to_string(),
        "SELECT e FROM Person e JOIN e.address.residents j1 WHERE j1.name = :p1"
    );
}

#[test]
fn test_filterable_properties_from_metadata() {
    let factory = person_factory();
    let person = factory.get_entity_class_metadata("Person").unwrap();
    let support = AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&person, ContainerConfig::default());

    for id in ["id", "firstName", "age", "address", "address.city", "manager", "manager.firstName"] {
        assert!(support.is_filterable(id), "{} should be filterable", id);
    }
    assert!(!support.is_filterable("skills"));
    assert!(!support.is_filterable("address.residents"));
    assert!(!support.is_filterable("manager.skills"));
    assert!(!support.is_filterable("manager.address.city"));

    assert!(support.is_valid_filter(&and(vec![eq("firstName", "Al"), is_null("manager.age")])));
    assert!(!support.is_valid_filter(&eq("skills", "x")));
}

#[test]
fn test_structurally_equal_filters_are_interchangeable() {
    let a = eq("x", 5);
    let b = eq("x", 5);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let composite_a = and(vec![like_ignore_case("name", "jo", true), between("age", 1.5, 2.5, true, true)]);
    let composite_b = and(vec![like_ignore_case("name", "jo", true), between("age", 1.5, 2.5, true, true)]);
    assert_eq!(hash_of(&composite_a), hash_of(&composite_b));

    let set: HashSet<Filter> = [a, b, composite_a, composite_b, eq("x", 6)].into_iter().collect();
    assert_eq!(set.len(), 3);

    // Parameter names are assigned per conversion, so both convert identically.
    assert_eq!(convert(&eq("x", 5)), convert(&eq("x", 5)));
}

#[test]
fn test_custom_filter_needs_converter() {
    struct InList;

    impl FilterConverter<JpqlBuilder> for InList {
        fn can_convert(&self, filter: &Filter) -> bool {
            matches!(filter, Filter::Custom { kind, .. } if kind == "in")
        }

        fn to_predicate(
            &self,
            filter: &Filter,
            builder: &mut JpqlBuilder,
            root: &Path,
            translator: &FilterTranslator<'_, JpqlBuilder>,
        ) -> Result<jpacontainer_core::criteria::Predicate, Error> {
            let Filter::Custom {
                property_id,
                arguments,
                ..
            } = filter
            else {
                return Err(Error::UnsupportedFilter(filter.to_string()));
            };
            let alternatives = arguments
                .iter()
                .map(|value| translator.convert(&eq(property_id.as_str(), value.clone()), builder, root))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(builder.or(alternatives))
        }
    }

    let filter = custom("in", "age", vec![Value::Int32(30), Value::Int32(40)]);

    let mut plain = AdvancedFilterableSupport::<JpqlBuilder>::default();
    plain.add_filter(filter.clone()).unwrap();
    let err = plain.build_query("Person").unwrap_err();
    assert!(matches!(err, Error::UnsupportedFilter(_)));
    assert!(!err.is_argument_error());

    let mut extended = AdvancedFilterableSupport::<JpqlBuilder>::default();
    extended.add_converter(InList);
    extended.add_filter(filter).unwrap();
    let query = extended.build_query("Person").unwrap();
    assert_eq!(
        query.to_string(),
        "SELECT e FROM Person e WHERE (e.age = :p1 OR e.age = :p2)"
    );
    assert!(matches(&query, &[("age", Value::Int32(40))]));
    assert!(!matches(&query, &[("age", Value::Int32(35))]));
}

#[test]
fn test_filter_json_roundtrip_converts_identically() {
    let filter = and(vec![
        string_eq("firstName", "ann", false),
        not(eq("age", Value::Null)),
        join_filter("skills", vec![like("name", "Ru", true)]),
    ]);
    let decoded = Filter::from_json(&filter.to_json().unwrap()).unwrap();
    assert_eq!(convert(&decoded), convert(&filter));
}
