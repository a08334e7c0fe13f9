//! Query-building seam.
//!
//! Filter conversion targets the [`CriteriaBuilder`] trait rather than a
//! concrete query engine. [`JpqlBuilder`] is the bundled implementation; it
//! produces a [`CriteriaQuery`] that renders as JPQL and can be evaluated
//! against in-memory rows with [`PredicateEvaluator`].

pub mod evaluator;
pub mod jpql;

pub use evaluator::PredicateEvaluator;
pub use jpql::{ComparisonOp, CriteriaQuery, Expression, JoinClause, JpqlBuilder, Path, Predicate};

use jpacontainer_proto::Value;

/// Builder of query-engine native paths, expressions and predicates.
///
/// Mirrors the subset of a criteria API the filter converters rely on.
/// Methods taking `&mut self` record state in the query under construction
/// (joins, bound parameters); the rest are pure constructors.
pub trait CriteriaBuilder {
    /// Navigable path (root, attribute or join).
    type Path: Clone;
    /// Scalar expression.
    type Expression: Clone;
    /// Boolean expression.
    type Predicate: Clone;

    /// Navigate to an attribute of a path.
    fn get(&self, parent: &Self::Path, attribute: &str) -> Self::Path;

    /// Join an attribute of a path, typically a collection.
    fn join(&mut self, parent: &Self::Path, attribute: &str) -> Self::Path;

    /// Use a path as an expression.
    fn expression(&self, path: &Self::Path) -> Self::Expression;

    /// Bind a value to a freshly named query parameter.
    fn parameter(&mut self, value: &Value) -> Self::Expression;

    /// Inline a value as a literal.
    fn literal(&self, value: &Value) -> Self::Expression;

    /// Uppercase a string expression.
    fn upper(&self, expression: Self::Expression) -> Self::Expression;

    /// Concatenate two string expressions.
    fn concat(&self, left: Self::Expression, right: Self::Expression) -> Self::Expression;

    /// `left = right`
    fn equal(&self, left: Self::Expression, right: Self::Expression) -> Self::Predicate;

    /// `left <> right`
    fn not_equal(&self, left: Self::Expression, right: Self::Expression) -> Self::Predicate;

    /// `left > right`
    fn greater_than(&self, left: Self::Expression, right: Self::Expression) -> Self::Predicate;

    /// `left >= right`
    fn greater_than_or_equal_to(
        &self,
        left: Self::Expression,
        right: Self::Expression,
    ) -> Self::Predicate;

    /// `left < right`
    fn less_than(&self, left: Self::Expression, right: Self::Expression) -> Self::Predicate;

    /// `left <= right`
    fn less_than_or_equal_to(
        &self,
        left: Self::Expression,
        right: Self::Expression,
    ) -> Self::Predicate;

    /// `expression LIKE pattern`
    fn like(&self, expression: Self::Expression, pattern: Self::Expression) -> Self::Predicate;

    /// `expression IS NULL`
    fn is_null(&self, expression: Self::Expression) -> Self::Predicate;

    /// `expression BETWEEN start AND end`, both bounds inclusive.
    fn between(
        &self,
        expression: Self::Expression,
        start: Self::Expression,
        end: Self::Expression,
    ) -> Self::Predicate;

    /// Conjunction. An empty conjunction is always true.
    fn and(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    /// Disjunction. An empty disjunction is always false.
    fn or(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    /// Negation.
    fn not(&self, predicate: Self::Predicate) -> Self::Predicate;
}
