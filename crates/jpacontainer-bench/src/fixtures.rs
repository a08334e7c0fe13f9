//! Type registries and filters for benchmark reproducibility.

use jpacontainer_core::metadata::{AnnotationKind, TypeDescriptor, TypeRegistry};
use jpacontainer_proto::filters::*;
use jpacontainer_proto::{Filter, Value};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug)]
pub enum Scale {
    /// A handful of classes and rows, for quick iteration.
    Tiny,
    /// ~50 classes or rows
    Small,
    /// ~500 classes or rows
    Medium,
}

impl Scale {
    /// Get the element count for this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 5,
            Scale::Small => 50,
            Scale::Medium => 500,
        }
    }

    /// Label used in benchmark ids.
    pub fn label(&self) -> &'static str {
        match self {
            Scale::Tiny => "tiny",
            Scale::Small => "small",
            Scale::Medium => "medium",
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Small
    }
}

/// Entities `Node0..NodeN` where each refers to the next and the last refers
/// back to the first, plus one embeddable shared by all of them.
pub fn chain_registry(len: usize) -> TypeRegistry {
    let len = len.max(1);
    let mut registry = TypeRegistry::new().with_type(
        TypeDescriptor::embeddable("bench.Address")
            .with_accessors("street", "String", [])
            .with_accessors("city", "String", []),
    );

    for i in 0..len {
        let next = format!("bench.Node{}", (i + 1) % len);
        registry = registry.with_type(
            TypeDescriptor::entity(format!("bench.Node{}", i))
                .with_accessors("id", "long", [AnnotationKind::Id])
                .with_accessors("version", "int", [AnnotationKind::Version])
                .with_accessors("name", "String", [])
                .with_accessors("address", "bench.Address", [AnnotationKind::Embedded])
                .with_accessors("next", &next, [AnnotationKind::ManyToOne])
                .with_accessors("children", "java.util.List", [AnnotationKind::OneToMany]),
        );
    }
    registry
}

/// One entity with `width` simple properties named `p0..pN`.
pub fn wide_registry(width: usize) -> TypeRegistry {
    let entity = (0..width).fold(
        TypeDescriptor::entity("bench.Wide").with_accessors("id", "long", [AnnotationKind::Id]),
        |descriptor, i| descriptor.with_accessors(&format!("p{}", i), "int", []),
    );
    TypeRegistry::new().with_type(entity)
}

/// A filter tree touching every built-in conversion rule at least once.
pub fn composite_filter() -> Filter {
    and(vec![
        eq("name", "Node_7"),
        not(is_null("address.city")),
        or(vec![
            between("age", 18, 65, true, false),
            outside_inclusive("score", 10.0, 90.0),
        ]),
        like_ignore_case("address.street", "main", false),
        string_eq("name", "node_7", false),
        is_not_empty("next.name"),
        join_filter("children", vec![gteq("level", 3)]),
    ])
}

/// Flat rows keyed by property path, as the predicate evaluator reads them.
pub fn sample_rows(count: usize) -> Vec<Vec<(String, Value)>> {
    (0..count)
        .map(|i| {
            vec![
                ("name".to_string(), Value::String(format!("Node_{}", i % 10))),
                ("age".to_string(), Value::Int32((i % 80) as i32)),
                ("score".to_string(), Value::Float64((i % 100) as f64)),
                (
                    "address.city".to_string(),
                    if i % 3 == 0 {
                        Value::Null
                    } else {
                        Value::String("Turku".to_string())
                    },
                ),
                (
                    "address.street".to_string(),
                    Value::String(format!("{} Main Street", i)),
                ),
                ("next.name".to_string(), Value::String(format!("Node_{}", i + 1))),
                ("children.level".to_string(), Value::Int32((i % 5) as i32)),
            ]
        })
        .collect()
}
