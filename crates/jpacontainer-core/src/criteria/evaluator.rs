//! In-memory evaluation of criteria queries.
//!
//! Evaluates the restriction of a [`CriteriaQuery`] against a row of property
//! values with SQL three-valued logic: any comparison involving NULL is
//! unknown, and a row only matches when the restriction is true.
//!
//! Rows are flat `(path, value)` lists keyed by dotted property paths relative
//! to the root (`"address.city"`). A joined path resolves to the path of its
//! join, so `j1.name` for `JOIN e.skills j1` reads `"skills.name"`. Absent
//! keys read as NULL.

use super::jpql::{ComparisonOp, CriteriaQuery, Expression, Path, Predicate};
use crate::error::Error;
use jpacontainer_proto::Value;
use std::cmp::Ordering;

/// Evaluates query restrictions against property rows.
pub struct PredicateEvaluator<'q> {
    query: &'q CriteriaQuery,
}

impl<'q> PredicateEvaluator<'q> {
    /// Create an evaluator for a query.
    pub fn new(query: &'q CriteriaQuery) -> Self {
        Self { query }
    }

    /// Check if a row satisfies the query restriction.
    ///
    /// A query without restriction matches every row.
    pub fn matches(&self, row: &[(String, Value)]) -> Result<bool, Error> {
        match &self.query.predicate {
            Some(predicate) => Ok(self.evaluate(predicate, row)? == Some(true)),
            None => Ok(true),
        }
    }

    /// Evaluate a predicate. `None` is the unknown truth value.
    pub fn evaluate(
        &self,
        predicate: &Predicate,
        row: &[(String, Value)],
    ) -> Result<Option<bool>, Error> {
        match predicate {
            Predicate::Comparison { op, left, right } => {
                let left = self.evaluate_expression(left, row)?;
                let right = self.evaluate_expression(right, row)?;
                Ok(Self::compare(*op, &left, &right))
            }
            Predicate::Like {
                expression,
                pattern,
            } => {
                let value = self.evaluate_expression(expression, row)?;
                let pattern = self.evaluate_expression(pattern, row)?;
                Ok(match (value, pattern) {
                    (Value::String(v), Value::String(p)) => Some(Self::like_match(&v, &p)),
                    _ => None,
                })
            }
            Predicate::IsNull(expression) => {
                Ok(Some(self.evaluate_expression(expression, row)?.is_null()))
            }
            Predicate::Between {
                expression,
                start,
                end,
            } => {
                let value = self.evaluate_expression(expression, row)?;
                let start = self.evaluate_expression(start, row)?;
                let end = self.evaluate_expression(end, row)?;
                Ok(Self::and_truth([
                    Self::compare(ComparisonOp::GreaterThanOrEqualTo, &value, &start),
                    Self::compare(ComparisonOp::LessThanOrEqualTo, &value, &end),
                ]))
            }
            Predicate::And(predicates) => {
                let truths = predicates
                    .iter()
                    .map(|p| self.evaluate(p, row))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::and_truth(truths))
            }
            Predicate::Or(predicates) => {
                let truths = predicates
                    .iter()
                    .map(|p| self.evaluate(p, row))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::or_truth(truths))
            }
            Predicate::Not(inner) => Ok(self.evaluate(inner, row)?.map(|b| !b)),
        }
    }

    fn evaluate_expression(
        &self,
        expression: &Expression,
        row: &[(String, Value)],
    ) -> Result<Value, Error> {
        match expression {
            Expression::Path(path) => {
                let key = self.path_key(path)?;
                Ok(Self::get_field_value(row, &key).cloned().unwrap_or(Value::Null))
            }
            Expression::Parameter(name) => self
                .query
                .parameter(name)
                .cloned()
                .ok_or_else(|| Error::Evaluation(format!("unbound parameter :{}", name))),
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Upper(inner) => Ok(match self.evaluate_expression(inner, row)? {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other,
            }),
            Expression::Concat(left, right) => {
                let left = self.evaluate_expression(left, row)?;
                let right = self.evaluate_expression(right, row)?;
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::String(format!("{}{}", Self::text(&left), Self::text(&right))))
            }
        }
    }

    /// Dotted row key of a path, relative to the root.
    fn path_key(&self, path: &Path) -> Result<String, Error> {
        match path {
            Path::Root { .. } => Ok(String::new()),
            Path::Attribute { parent, name } => {
                let parent = self.path_key(parent)?;
                Ok(Self::child_key(parent, name))
            }
            Path::Join { alias } => {
                let join = self
                    .query
                    .join(alias)
                    .ok_or_else(|| Error::Evaluation(format!("unknown join alias {}", alias)))?;
                let parent = self.path_key(&join.parent)?;
                Ok(Self::child_key(parent, &join.attribute))
            }
        }
    }

    fn child_key(parent: String, name: &str) -> String {
        if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", parent, name)
        }
    }

    fn get_field_value<'a>(row: &'a [(String, Value)], field: &str) -> Option<&'a Value> {
        row.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }

    fn compare(op: ComparisonOp, a: &Value, b: &Value) -> Option<bool> {
        if a.is_null() || b.is_null() {
            return None;
        }
        match op {
            ComparisonOp::Equal => Some(Self::values_equal(a, b)),
            ComparisonOp::NotEqual => Some(!Self::values_equal(a, b)),
            ComparisonOp::GreaterThan => Self::compare_values(a, b).map(Ordering::is_gt),
            ComparisonOp::GreaterThanOrEqualTo => Self::compare_values(a, b).map(Ordering::is_ge),
            ComparisonOp::LessThan => Self::compare_values(a, b).map(Ordering::is_lt),
            ComparisonOp::LessThanOrEqualTo => Self::compare_values(a, b).map(Ordering::is_le),
        }
    }

    fn and_truth(truths: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
        let mut result = Some(true);
        for truth in truths {
            match truth {
                Some(false) => return Some(false),
                None => result = None,
                Some(true) => {}
            }
        }
        result
    }

    fn or_truth(truths: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
        let mut result = Some(false);
        for truth in truths {
            match truth {
                Some(true) => return Some(true),
                None => result = None,
                Some(false) => {}
            }
        }
        result
    }

    /// Check if two non-null values are equal, widening numeric types.
    fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
                a.as_i64() == b.as_i64()
            }
            (Value::Float32(_) | Value::Float64(_), Value::Float32(_) | Value::Float64(_)) => {
                a.as_f64() == b.as_f64()
            }
            _ => Self::compare_values(a, b) == Some(Ordering::Equal) || a == b,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
                Some(a.as_i64()?.cmp(&b.as_i64()?))
            }
            (Value::Float32(_) | Value::Float64(_), Value::Float32(_) | Value::Float64(_)) => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// String form of a value inside `CONCAT`.
    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int32(i) => i.to_string(),
            Value::Int64(i) | Value::Timestamp(i) => i.to_string(),
            Value::Float32(f) => f.to_string(),
            Value::Float64(f) => f.to_string(),
            other => other.to_string(),
        }
    }

    /// Match a string against a SQL LIKE pattern.
    ///
    /// Supports:
    /// - `%` matches zero or more characters
    /// - `_` matches exactly one character
    /// - `\\%` matches literal `%`
    /// - `\\_` matches literal `_`
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let mut chars = value.chars().peekable();
        let mut pattern_chars = pattern.chars().peekable();

        Self::like_match_recursive(&mut chars, &mut pattern_chars)
    }

    fn like_match_recursive(
        chars: &mut std::iter::Peekable<std::str::Chars>,
        pattern: &mut std::iter::Peekable<std::str::Chars>,
    ) -> bool {
        loop {
            match (pattern.peek().copied(), chars.peek().copied()) {
                (None, None) => return true,
                (None, Some(_)) => return false,
                (Some('%'), _) => {
                    pattern.next();
                    if pattern.peek().is_none() {
                        return true;
                    }

                    // Try matching % with 0, 1, 2, ... characters
                    loop {
                        let mut pattern_clone = pattern.clone();
                        let mut chars_clone = chars.clone();
                        if Self::like_match_recursive(&mut chars_clone, &mut pattern_clone) {
                            return true;
                        }
                        if chars.next().is_none() {
                            return false;
                        }
                    }
                }
                (Some('_'), Some(_)) => {
                    pattern.next();
                    chars.next();
                }
                (Some('_'), None) => return false,
                (Some('\\'), _) => {
                    pattern.next();
                    match (pattern.peek().copied(), chars.peek().copied()) {
                        (Some(p), Some(c)) if p == c => {
                            pattern.next();
                            chars.next();
                        }
                        _ => return false,
                    }
                }
                (Some(p), Some(c)) => {
                    if p != c {
                        return false;
                    }
                    pattern.next();
                    chars.next();
                }
                (Some(_), None) => return false,
            }
        }
    }
}
