//! Filter to predicate conversion.
//!
//! [`FilterTranslator::convert`] is a recursive-descent dispatcher: registered
//! [`FilterConverter`]s are offered each node first, in registration order, and
//! the first one whose `can_convert` accepts it wins. Nodes no converter claims
//! go through the built-in translation, an exhaustive match over [`Filter`].

use super::path::{resolve_join, resolve_path, target_metadata};
use crate::criteria::CriteriaBuilder;
use crate::error::Error;
use crate::metadata::ClassMetadata;
use jpacontainer_proto::{CompareOp, Filter, Value};
use std::sync::Arc;
use tracing::trace;

/// A user-supplied translation for some filter nodes.
pub trait FilterConverter<B: CriteriaBuilder>: Send + Sync {
    /// Check if this converter handles the filter.
    fn can_convert(&self, filter: &Filter) -> bool;

    /// Translate the filter. Child filters go back through `translator`.
    fn to_predicate(
        &self,
        filter: &Filter,
        builder: &mut B,
        root: &B::Path,
        translator: &FilterTranslator<'_, B>,
    ) -> Result<B::Predicate, Error>;
}

/// Dispatches filter nodes to converters against one query context.
pub struct FilterTranslator<'a, B: CriteriaBuilder> {
    converters: &'a [Arc<dyn FilterConverter<B>>],
    metadata: Option<Arc<ClassMetadata>>,
}

impl<'a, B: CriteriaBuilder> FilterTranslator<'a, B> {
    /// Create a translator.
    ///
    /// `metadata` describes the class at the root path; it drives join
    /// decisions during path resolution.
    pub fn new(
        converters: &'a [Arc<dyn FilterConverter<B>>],
        metadata: Option<Arc<ClassMetadata>>,
    ) -> Self {
        Self {
            converters,
            metadata,
        }
    }

    /// Metadata of the class at the root path.
    pub fn metadata(&self) -> Option<&Arc<ClassMetadata>> {
        self.metadata.as_ref()
    }

    /// Convert a filter tree into a single predicate.
    pub fn convert(
        &self,
        filter: &Filter,
        builder: &mut B,
        root: &B::Path,
    ) -> Result<B::Predicate, Error> {
        if let Some(converter) = self.converters.iter().find(|c| c.can_convert(filter)) {
            trace!(variant = filter.variant_name(), "Converting filter with registered converter");
            return converter.to_predicate(filter, builder, root, self);
        }
        self.convert_builtin(filter, builder, root)
    }

    /// Convert every filter against the same root.
    pub fn convert_all(
        &self,
        filters: &[Filter],
        builder: &mut B,
        root: &B::Path,
    ) -> Result<Vec<B::Predicate>, Error> {
        filters
            .iter()
            .map(|f| self.convert(f, builder, root))
            .collect()
    }

    /// Resolve a dotted property id against the root.
    pub fn resolve_path(&self, builder: &mut B, root: &B::Path, property_id: &str) -> B::Path {
        resolve_path(builder, root, property_id, self.metadata.as_ref())
    }

    /// The expression of a dotted property id.
    pub fn property_expression(
        &self,
        builder: &mut B,
        root: &B::Path,
        property_id: &str,
    ) -> B::Expression {
        let path = self.resolve_path(builder, root, property_id);
        builder.expression(&path)
    }

    fn convert_builtin(
        &self,
        filter: &Filter,
        builder: &mut B,
        root: &B::Path,
    ) -> Result<B::Predicate, Error> {
        trace!(variant = filter.variant_name(), "Converting filter");
        match filter {
            Filter::And { filters } => {
                let predicates = self.convert_all(filters, builder, root)?;
                Ok(builder.and(predicates))
            }
            Filter::Or { filters } => {
                let predicates = self.convert_all(filters, builder, root)?;
                Ok(builder.or(predicates))
            }
            Filter::Not { filter } => {
                let predicate = self.convert(filter, builder, root)?;
                Ok(builder.not(predicate))
            }
            Filter::Compare {
                property_id,
                op,
                value,
            } => {
                let path = self.property_expression(builder, root, property_id);
                if *op == CompareOp::Equal && value.is_null() {
                    return Ok(builder.is_null(path));
                }
                let value = builder.parameter(value);
                Ok(Self::compare(builder, *op, path, value))
            }
            Filter::Between {
                property_id,
                start,
                end,
            } => {
                let path = self.property_expression(builder, root, property_id);
                let start = builder.parameter(start);
                let end = builder.parameter(end);
                Ok(builder.between(path, start, end))
            }
            Filter::Interval {
                property_id,
                start,
                end,
                include_start,
                include_end,
            } => {
                let path = self.property_expression(builder, root, property_id);
                let start = builder.parameter(start);
                let end = builder.parameter(end);
                let lower = if *include_start {
                    builder.greater_than_or_equal_to(path.clone(), start)
                } else {
                    builder.greater_than(path.clone(), start)
                };
                let upper = if *include_end {
                    builder.less_than_or_equal_to(path, end)
                } else {
                    builder.less_than(path, end)
                };
                Ok(builder.and(vec![lower, upper]))
            }
            Filter::Outside {
                property_id,
                start,
                end,
                include_start,
                include_end,
            } => {
                let path = self.property_expression(builder, root, property_id);
                let start = builder.parameter(start);
                let end = builder.parameter(end);
                let below = if *include_start {
                    builder.less_than_or_equal_to(path.clone(), start)
                } else {
                    builder.less_than(path.clone(), start)
                };
                let above = if *include_end {
                    builder.greater_than_or_equal_to(path, end)
                } else {
                    builder.greater_than(path, end)
                };
                Ok(builder.or(vec![below, above]))
            }
            Filter::IsNull { property_id } => {
                let path = self.property_expression(builder, root, property_id);
                Ok(builder.is_null(path))
            }
            Filter::Like {
                property_id,
                pattern,
                case_sensitive,
            } => {
                let path = self.property_expression(builder, root, property_id);
                let pattern = builder.parameter(&Value::String(pattern.clone()));
                Ok(Self::like(builder, path, pattern, !*case_sensitive))
            }
            Filter::StringMatch {
                property_id,
                text,
                ignore_case,
                only_match_prefix,
            } => {
                let path = self.property_expression(builder, root, property_id);
                // Concatenating with "" yields a string expression for any property type.
                let empty = builder.literal(&Value::String(String::new()));
                let text_path = builder.concat(path, empty);
                let pattern = if *only_match_prefix {
                    format!("{}%", text)
                } else {
                    format!("%{}%", text)
                };
                let pattern = builder.parameter(&Value::String(pattern));
                Ok(Self::like(builder, text_path, pattern, *ignore_case))
            }
            Filter::StringCompare {
                property_id,
                op,
                value,
                case_sensitive,
            } => {
                let mut path = self.property_expression(builder, root, property_id);
                let mut value = builder.parameter(&Value::String(value.clone()));
                if !*case_sensitive {
                    path = builder.upper(path);
                    value = builder.upper(value);
                }
                Ok(Self::compare(builder, *op, path, value))
            }
            Filter::Join {
                join_property,
                filters,
            } => {
                let joined = self.join(builder, root, join_property);
                let scoped = FilterTranslator {
                    converters: self.converters,
                    metadata: target_metadata(self.metadata.as_ref(), join_property),
                };
                let predicates = scoped.convert_all(filters, builder, &joined)?;
                Ok(builder.and(predicates))
            }
            Filter::Custom { kind, .. } => Err(Error::UnsupportedFilter(format!(
                "{}({})",
                filter.variant_name(),
                kind
            ))),
        }
    }

    /// Join the last segment of a dotted property id.
    fn join(&self, builder: &mut B, root: &B::Path, join_property: &str) -> B::Path {
        resolve_join(builder, root, join_property, self.metadata.as_ref())
    }

    fn compare(
        builder: &B,
        op: CompareOp,
        left: B::Expression,
        right: B::Expression,
    ) -> B::Predicate {
        match op {
            CompareOp::Equal => builder.equal(left, right),
            CompareOp::Greater => builder.greater_than(left, right),
            CompareOp::GreaterOrEqual => builder.greater_than_or_equal_to(left, right),
            CompareOp::Less => builder.less_than(left, right),
            CompareOp::LessOrEqual => builder.less_than_or_equal_to(left, right),
        }
    }

    fn like(
        builder: &B,
        expression: B::Expression,
        pattern: B::Expression,
        ignore_case: bool,
    ) -> B::Predicate {
        if ignore_case {
            builder.like(builder.upper(expression), builder.upper(pattern))
        } else {
            builder.like(expression, pattern)
        }
    }
}
