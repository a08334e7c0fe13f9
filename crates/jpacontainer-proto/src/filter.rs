//! Filter expression tree.
//!
//! A [`Filter`] is an immutable node of a boolean expression over entity
//! properties. It carries no query-engine state: parameter names and joins
//! are only produced when a filter is converted into a predicate.
//!
//! Equality and hashing are structural, so two independently built filters
//! with the same shape are interchangeable as cache keys.

use crate::error::Error;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Comparison operator of a property comparison leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `=`
    Equal,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
}

impl CompareOp {
    /// JPQL operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::Greater => ">",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::Less => "<",
            CompareOp::LessOrEqual => "<=",
        }
    }
}

/// A node in a filter expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Property compared against a value.
    Compare {
        property_id: String,
        op: CompareOp,
        value: Value,
    },
    /// Inclusive range using the engine's native BETWEEN.
    Between {
        property_id: String,
        start: Value,
        end: Value,
    },
    /// Range with explicit inclusivity per bound.
    Interval {
        property_id: String,
        start: Value,
        end: Value,
        include_start: bool,
        include_end: bool,
    },
    /// Complement of a range. An included bound is part of the accepted values.
    Outside {
        property_id: String,
        start: Value,
        end: Value,
        include_start: bool,
        include_end: bool,
    },
    /// Property is null.
    IsNull { property_id: String },
    /// Property matches a raw LIKE pattern.
    Like {
        property_id: String,
        pattern: String,
        case_sensitive: bool,
    },
    /// Property starts with or contains a text.
    StringMatch {
        property_id: String,
        text: String,
        ignore_case: bool,
        only_match_prefix: bool,
    },
    /// String property compared against a string value.
    StringCompare {
        property_id: String,
        op: CompareOp,
        value: String,
        case_sensitive: bool,
    },
    /// All children must match.
    And { filters: Vec<Filter> },
    /// At least one child must match.
    Or { filters: Vec<Filter> },
    /// The child must not match.
    Not { filter: Box<Filter> },
    /// Children are evaluated, as a conjunction, against a joined property.
    Join {
        join_property: String,
        filters: Vec<Filter>,
    },
    /// Application-defined leaf, only convertible by a registered converter.
    Custom {
        kind: String,
        property_id: String,
        arguments: Vec<Value>,
    },
}

impl Filter {
    /// Name of the filter variant, used in diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Filter::Compare { .. } => "Compare",
            Filter::Between { .. } => "Between",
            Filter::Interval { .. } => "Interval",
            Filter::Outside { .. } => "Outside",
            Filter::IsNull { .. } => "IsNull",
            Filter::Like { .. } => "Like",
            Filter::StringMatch { .. } => "StringMatch",
            Filter::StringCompare { .. } => "StringCompare",
            Filter::And { .. } => "And",
            Filter::Or { .. } => "Or",
            Filter::Not { .. } => "Not",
            Filter::Join { .. } => "Join",
            Filter::Custom { .. } => "Custom",
        }
    }

    /// Property id of a leaf filter, `None` for composites.
    pub fn property_id(&self) -> Option<&str> {
        match self {
            Filter::Compare { property_id, .. }
            | Filter::Between { property_id, .. }
            | Filter::Interval { property_id, .. }
            | Filter::Outside { property_id, .. }
            | Filter::IsNull { property_id }
            | Filter::Like { property_id, .. }
            | Filter::StringMatch { property_id, .. }
            | Filter::StringCompare { property_id, .. }
            | Filter::Custom { property_id, .. } => Some(property_id),
            Filter::And { .. } | Filter::Or { .. } | Filter::Not { .. } | Filter::Join { .. } => {
                None
            }
        }
    }

    /// Check if this filter has child filters.
    pub fn is_composite(&self) -> bool {
        self.property_id().is_none()
    }

    /// Direct children of a composite filter.
    pub fn children(&self) -> &[Filter] {
        match self {
            Filter::And { filters } | Filter::Or { filters } | Filter::Join { filters, .. } => {
                filters
            }
            Filter::Not { filter } => std::slice::from_ref(filter.as_ref()),
            _ => &[],
        }
    }

    /// All property ids referenced by the filter tree.
    ///
    /// Ids below a join filter are prefixed with the join property.
    pub fn property_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        self.collect_property_ids(None, &mut ids);
        ids
    }

    fn collect_property_ids(&self, prefix: Option<&str>, ids: &mut BTreeSet<String>) {
        match self {
            Filter::Join {
                join_property,
                filters,
            } => {
                let scoped = match prefix {
                    Some(p) => format!("{}.{}", p, join_property),
                    None => join_property.clone(),
                };
                for f in filters {
                    f.collect_property_ids(Some(&scoped), ids);
                }
            }
            _ => {
                if let Some(id) = self.property_id() {
                    ids.insert(match prefix {
                        Some(p) => format!("{}.{}", p, id),
                        None => id.to_string(),
                    });
                }
                for child in self.children() {
                    child.collect_property_ids(prefix, ids);
                }
            }
        }
    }

    /// Decode a filter from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Encode the filter as JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn write_junction(f: &mut fmt::Formatter<'_>, filters: &[Filter], token: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", token)?;
        }
        write!(f, "{}", filter)?;
    }
    write!(f, ")")
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare {
                property_id,
                op,
                value,
            } => write!(f, "{} {} {}", property_id, op.symbol(), value),
            Filter::Between {
                property_id,
                start,
                end,
            } => write!(f, "{} BETWEEN {} AND {}", property_id, start, end),
            Filter::Interval {
                property_id,
                start,
                end,
                include_start,
                include_end,
            } => write!(
                f,
                "{} IN {}{}, {}{}",
                property_id,
                if *include_start { '[' } else { '(' },
                start,
                end,
                if *include_end { ']' } else { ')' }
            ),
            Filter::Outside {
                property_id,
                start,
                end,
                include_start,
                include_end,
            } => write!(
                f,
                "{} NOT IN {}{}, {}{}",
                property_id,
                if *include_start { '(' } else { '[' },
                start,
                end,
                if *include_end { ')' } else { ']' }
            ),
            Filter::IsNull { property_id } => write!(f, "{} IS NULL", property_id),
            Filter::Like {
                property_id,
                pattern,
                case_sensitive,
            } => write!(
                f,
                "{} {} {}",
                property_id,
                if *case_sensitive { "LIKE" } else { "ILIKE" },
                Value::String(pattern.clone())
            ),
            Filter::StringMatch {
                property_id,
                text,
                ignore_case,
                only_match_prefix,
            } => write!(
                f,
                "{} {} {}{}",
                property_id,
                if *only_match_prefix { "STARTS WITH" } else { "CONTAINS" },
                Value::String(text.clone()),
                if *ignore_case { " IGNORE CASE" } else { "" }
            ),
            Filter::StringCompare {
                property_id,
                op,
                value,
                case_sensitive,
            } => write!(
                f,
                "{} {} {}{}",
                property_id,
                op.symbol(),
                Value::String(value.clone()),
                if *case_sensitive { "" } else { " IGNORE CASE" }
            ),
            Filter::And { filters } => write_junction(f, filters, "AND"),
            Filter::Or { filters } => write_junction(f, filters, "OR"),
            Filter::Not { filter } => write!(f, "NOT ({})", filter),
            Filter::Join {
                join_property,
                filters,
            } => {
                write!(f, "JOIN {} ", join_property)?;
                write_junction(f, filters, "AND")
            }
            Filter::Custom {
                kind,
                property_id,
                arguments,
            } => {
                write!(f, "{}({}", kind, property_id)?;
                for arg in arguments {
                    write!(f, ", {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(filter: &Filter) -> u64 {
        let mut hasher = DefaultHasher::new();
        filter.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_independent_filters_are_equal() {
        let a = eq("x", 5);
        let b = eq("x", 5);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let a = and(vec![eq("x", 1), gt("y", 2)]);
        let b = and(vec![eq("x", 1), gt("y", 2)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_child_order_matters() {
        let a = and(vec![eq("x", 1), gt("y", 2)]);
        let b = and(vec![gt("y", 2), eq("x", 1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_and_or_are_distinct() {
        assert_ne!(and(vec![eq("x", 1)]), or(vec![eq("x", 1)]));
    }

    #[test]
    fn test_property_ids() {
        let filter = and(vec![
            eq("name", "Alice"),
            not(is_null("address.street")),
            join_filter("skills", vec![eq("level", 3), like("name", "Ru", true)]),
        ]);

        let ids: Vec<String> = filter.property_ids().into_iter().collect();
        assert_eq!(
            ids,
            vec!["address.street", "name", "skills.level", "skills.name"]
        );
    }

    #[test]
    fn test_children() {
        let filter = not(eq("x", 1));
        assert_eq!(filter.children(), &[eq("x", 1)]);
        assert!(filter.is_composite());
        assert!(eq("x", 1).children().is_empty());
    }

    #[test]
    fn test_json_roundtrip_and_shape() {
        let filter = or(vec![
            between("age", 18, 65, true, false),
            string_eq("name", "bob", false),
        ]);
        let json = filter.to_json().unwrap();
        assert!(json.contains("\"type\":\"or\""));
        assert_eq!(Filter::from_json(&json).unwrap(), filter);
    }

    #[test]
    fn test_from_json_rejects_unknown_variant() {
        let err = Filter::from_json(r#"{"type":"xor","filters":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(eq("x", 5).to_string(), "x = 5");
        assert_eq!(
            between("x", 5, 10, true, false).to_string(),
            "x IN [5, 10)"
        );
        assert_eq!(
            and(vec![eq("x", 1), gt("y", 2)]).to_string(),
            "(x = 1 AND y > 2)"
        );
        assert_eq!(
            like("name", "abc", true).to_string(),
            "name STARTS WITH 'abc'"
        );
    }
}
