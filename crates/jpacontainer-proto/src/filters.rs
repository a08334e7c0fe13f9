//! Factory functions for building filter trees.
//!
//! ```
//! use jpacontainer_proto::filters::{and, eq, gt, like};
//!
//! let filter = and(vec![eq("active", true), gt("age", 18), like("name", "Jo", true)]);
//! assert_eq!(filter.property_ids().len(), 3);
//! ```

use crate::filter::{CompareOp, Filter};
use crate::value::Value;

fn compare(property_id: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Filter {
    Filter::Compare {
        property_id: property_id.into(),
        op,
        value: value.into(),
    }
}

/// Property equals value. A null value matches null properties.
pub fn eq(property_id: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(property_id, CompareOp::Equal, value)
}

/// Property does not equal value.
pub fn neq(property_id: impl Into<String>, value: impl Into<Value>) -> Filter {
    not(eq(property_id, value))
}

/// Property greater than value.
pub fn gt(property_id: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(property_id, CompareOp::Greater, value)
}

/// Property greater than or equal to value.
pub fn gteq(property_id: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(property_id, CompareOp::GreaterOrEqual, value)
}

/// Property less than value.
pub fn lt(property_id: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(property_id, CompareOp::Less, value)
}

/// Property less than or equal to value.
pub fn lteq(property_id: impl Into<String>, value: impl Into<Value>) -> Filter {
    compare(property_id, CompareOp::LessOrEqual, value)
}

/// Property within `start..end` with explicit inclusivity per bound.
pub fn between(
    property_id: impl Into<String>,
    start: impl Into<Value>,
    end: impl Into<Value>,
    include_start: bool,
    include_end: bool,
) -> Filter {
    Filter::Interval {
        property_id: property_id.into(),
        start: start.into(),
        end: end.into(),
        include_start,
        include_end,
    }
}

/// Property within `start..=end`, using the engine's native BETWEEN.
pub fn between_inclusive(
    property_id: impl Into<String>,
    start: impl Into<Value>,
    end: impl Into<Value>,
) -> Filter {
    Filter::Between {
        property_id: property_id.into(),
        start: start.into(),
        end: end.into(),
    }
}

/// Property strictly between `start` and `end`.
pub fn between_exclusive(
    property_id: impl Into<String>,
    start: impl Into<Value>,
    end: impl Into<Value>,
) -> Filter {
    between(property_id, start, end, false, false)
}

/// Property outside `start..end`. An included bound is an accepted value.
pub fn outside(
    property_id: impl Into<String>,
    start: impl Into<Value>,
    end: impl Into<Value>,
    include_start: bool,
    include_end: bool,
) -> Filter {
    Filter::Outside {
        property_id: property_id.into(),
        start: start.into(),
        end: end.into(),
        include_start,
        include_end,
    }
}

/// Property outside the range, accepting both bounds.
pub fn outside_inclusive(
    property_id: impl Into<String>,
    start: impl Into<Value>,
    end: impl Into<Value>,
) -> Filter {
    outside(property_id, start, end, true, true)
}

/// Property outside the range, rejecting both bounds.
pub fn outside_exclusive(
    property_id: impl Into<String>,
    start: impl Into<Value>,
    end: impl Into<Value>,
) -> Filter {
    outside(property_id, start, end, false, false)
}

/// Property is null.
pub fn is_null(property_id: impl Into<String>) -> Filter {
    Filter::IsNull {
        property_id: property_id.into(),
    }
}

/// Property is not null.
pub fn is_not_null(property_id: impl Into<String>) -> Filter {
    not(is_null(property_id))
}

/// Property is null or the empty string.
pub fn is_empty(property_id: impl Into<String>) -> Filter {
    let property_id = property_id.into();
    or(vec![is_null(property_id.clone()), eq(property_id, "")])
}

/// Property is neither null nor the empty string.
pub fn is_not_empty(property_id: impl Into<String>) -> Filter {
    not(is_empty(property_id))
}

/// Case-sensitive prefix or substring match.
pub fn like(property_id: impl Into<String>, text: impl Into<String>, only_match_prefix: bool) -> Filter {
    Filter::StringMatch {
        property_id: property_id.into(),
        text: text.into(),
        ignore_case: false,
        only_match_prefix,
    }
}

/// Case-insensitive prefix or substring match.
pub fn like_ignore_case(
    property_id: impl Into<String>,
    text: impl Into<String>,
    only_match_prefix: bool,
) -> Filter {
    Filter::StringMatch {
        property_id: property_id.into(),
        text: text.into(),
        ignore_case: true,
        only_match_prefix,
    }
}

/// Raw LIKE pattern match (`%` and `_` wildcards).
pub fn pattern(
    property_id: impl Into<String>,
    pattern: impl Into<String>,
    case_sensitive: bool,
) -> Filter {
    Filter::Like {
        property_id: property_id.into(),
        pattern: pattern.into(),
        case_sensitive,
    }
}

/// String equality with case sensitivity.
pub fn string_eq(
    property_id: impl Into<String>,
    value: impl Into<String>,
    case_sensitive: bool,
) -> Filter {
    string_compare(property_id, CompareOp::Equal, value, case_sensitive)
}

/// String comparison with an explicit operator.
pub fn string_compare(
    property_id: impl Into<String>,
    op: CompareOp,
    value: impl Into<String>,
    case_sensitive: bool,
) -> Filter {
    Filter::StringCompare {
        property_id: property_id.into(),
        op,
        value: value.into(),
        case_sensitive,
    }
}

/// Conjunction of filters.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::And { filters }
}

/// Disjunction of filters.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or { filters }
}

/// Negation of a filter.
pub fn not(filter: Filter) -> Filter {
    Filter::Not {
        filter: Box::new(filter),
    }
}

/// Filters applied to the entity reached by joining `join_property`.
pub fn join_filter(join_property: impl Into<String>, filters: Vec<Filter>) -> Filter {
    Filter::Join {
        join_property: join_property.into(),
        filters,
    }
}

/// Application-defined leaf filter.
pub fn custom(
    kind: impl Into<String>,
    property_id: impl Into<String>,
    arguments: Vec<Value>,
) -> Filter {
    Filter::Custom {
        kind: kind.into(),
        property_id: property_id.into(),
        arguments,
    }
}
