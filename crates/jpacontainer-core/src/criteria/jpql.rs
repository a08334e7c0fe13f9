//! JPQL criteria implementation.

use super::CriteriaBuilder;
use crate::config::{ContainerConfig, DEFAULT_PARAMETER_PREFIX, DEFAULT_ROOT_ALIAS};
use jpacontainer_proto::Value;
use std::fmt;

/// A navigable path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    /// The query root.
    Root { alias: String },
    /// Attribute of another path.
    Attribute { parent: Box<Path>, name: String },
    /// A joined path, referenced by its alias.
    Join { alias: String },
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root { alias } | Path::Join { alias } => f.write_str(alias),
            Path::Attribute { parent, name } => write!(f, "{}.{}", parent, name),
        }
    }
}

/// A scalar expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// Value of a path.
    Path(Path),
    /// Named parameter bound in the query.
    Parameter(String),
    /// Inlined literal.
    Literal(Value),
    /// `UPPER(..)`
    Upper(Box<Expression>),
    /// `CONCAT(.., ..)`
    Concat(Box<Expression>, Box<Expression>),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Path(path) => write!(f, "{}", path),
            Expression::Parameter(name) => write!(f, ":{}", name),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Upper(inner) => write!(f, "UPPER({})", inner),
            Expression::Concat(left, right) => write!(f, "CONCAT({}, {})", left, right),
        }
    }
}

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
}

impl ComparisonOp {
    /// JPQL operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqualTo => ">=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqualTo => "<=",
        }
    }
}

/// A boolean expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Comparison {
        op: ComparisonOp,
        left: Expression,
        right: Expression,
    },
    Like {
        expression: Expression,
        pattern: Expression,
    },
    IsNull(Expression),
    Between {
        expression: Expression,
        start: Expression,
        end: Expression,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn fmt_junction(
        f: &mut fmt::Formatter<'_>,
        predicates: &[Predicate],
        keyword: &str,
        identity: &str,
    ) -> fmt::Result {
        match predicates {
            [] => f.write_str(identity),
            [single] => write!(f, "{}", single),
            _ => {
                f.write_str("(")?;
                for (i, p) in predicates.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", keyword)?;
                    }
                    write!(f, "{}", p)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Predicate::Like {
                expression,
                pattern,
            } => write!(f, "{} LIKE {}", expression, pattern),
            Predicate::IsNull(expression) => write!(f, "{} IS NULL", expression),
            Predicate::Between {
                expression,
                start,
                end,
            } => write!(f, "{} BETWEEN {} AND {}", expression, start, end),
            Predicate::And(predicates) => Self::fmt_junction(f, predicates, "AND", "1 = 1"),
            Predicate::Or(predicates) => Self::fmt_junction(f, predicates, "OR", "1 = 0"),
            Predicate::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

/// `JOIN parent.attribute alias`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub alias: String,
    pub parent: Path,
    pub attribute: String,
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JOIN {}.{} {}", self.parent, self.attribute, self.alias)
    }
}

/// A finished select query over one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaQuery {
    pub entity_name: String,
    pub root_alias: String,
    pub joins: Vec<JoinClause>,
    pub predicate: Option<Predicate>,
    pub parameters: Vec<(String, Value)>,
}

impl CriteriaQuery {
    /// Value bound to a parameter name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Find a join by alias.
    pub fn join(&self, alias: &str) -> Option<&JoinClause> {
        self.joins.iter().find(|j| j.alias == alias)
    }
}

impl fmt::Display for CriteriaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {alias} FROM {} {alias}",
            self.entity_name,
            alias = self.root_alias
        )?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {}", predicate)?;
        }
        Ok(())
    }
}

/// [`CriteriaBuilder`] producing JPQL queries.
///
/// One builder is used per query: it numbers joins (`j1`, `j2`, ...) and
/// parameters (`p1`, `p2`, ...) in the order they are created.
#[derive(Debug, Clone)]
pub struct JpqlBuilder {
    entity_name: String,
    root_alias: String,
    parameter_prefix: String,
    joins: Vec<JoinClause>,
    parameters: Vec<(String, Value)>,
}

impl JpqlBuilder {
    /// Create a builder for a query over an entity.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            root_alias: DEFAULT_ROOT_ALIAS.to_string(),
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
            joins: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Create a builder using the aliases of a container configuration.
    pub fn with_config(entity_name: impl Into<String>, config: &ContainerConfig) -> Self {
        Self {
            root_alias: config.root_alias.clone(),
            parameter_prefix: config.parameter_prefix.clone(),
            ..Self::new(entity_name)
        }
    }

    /// The query root.
    pub fn root(&self) -> Path {
        Path::Root {
            alias: self.root_alias.clone(),
        }
    }

    /// Entity the query selects.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Joins created so far.
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Parameters bound so far.
    pub fn parameters(&self) -> &[(String, Value)] {
        &self.parameters
    }

    /// Finish the query with an optional restriction.
    pub fn finish(self, predicate: Option<Predicate>) -> CriteriaQuery {
        CriteriaQuery {
            entity_name: self.entity_name,
            root_alias: self.root_alias,
            joins: self.joins,
            predicate,
            parameters: self.parameters,
        }
    }

    fn compare(op: ComparisonOp, left: Expression, right: Expression) -> Predicate {
        Predicate::Comparison { op, left, right }
    }
}

impl CriteriaBuilder for JpqlBuilder {
    type Path = Path;
    type Expression = Expression;
    type Predicate = Predicate;

    fn get(&self, parent: &Path, attribute: &str) -> Path {
        Path::Attribute {
            parent: Box::new(parent.clone()),
            name: attribute.to_string(),
        }
    }

    fn join(&mut self, parent: &Path, attribute: &str) -> Path {
        let alias = format!("j{}", self.joins.len() + 1);
        self.joins.push(JoinClause {
            alias: alias.clone(),
            parent: parent.clone(),
            attribute: attribute.to_string(),
        });
        Path::Join { alias }
    }

    fn expression(&self, path: &Path) -> Expression {
        Expression::Path(path.clone())
    }

    fn parameter(&mut self, value: &Value) -> Expression {
        let name = format!("{}{}", self.parameter_prefix, self.parameters.len() + 1);
        self.parameters.push((name.clone(), value.clone()));
        Expression::Parameter(name)
    }

    fn literal(&self, value: &Value) -> Expression {
        Expression::Literal(value.clone())
    }

    fn upper(&self, expression: Expression) -> Expression {
        Expression::Upper(Box::new(expression))
    }

    fn concat(&self, left: Expression, right: Expression) -> Expression {
        Expression::Concat(Box::new(left), Box::new(right))
    }

    fn equal(&self, left: Expression, right: Expression) -> Predicate {
        Self::compare(ComparisonOp::Equal, left, right)
    }

    fn not_equal(&self, left: Expression, right: Expression) -> Predicate {
        Self::compare(ComparisonOp::NotEqual, left, right)
    }

    fn greater_than(&self, left: Expression, right: Expression) -> Predicate {
        Self::compare(ComparisonOp::GreaterThan, left, right)
    }

    fn greater_than_or_equal_to(&self, left: Expression, right: Expression) -> Predicate {
        Self::compare(ComparisonOp::GreaterThanOrEqualTo, left, right)
    }

    fn less_than(&self, left: Expression, right: Expression) -> Predicate {
        Self::compare(ComparisonOp::LessThan, left, right)
    }

    fn less_than_or_equal_to(&self, left: Expression, right: Expression) -> Predicate {
        Self::compare(ComparisonOp::LessThanOrEqualTo, left, right)
    }

    fn like(&self, expression: Expression, pattern: Expression) -> Predicate {
        Predicate::Like {
            expression,
            pattern,
        }
    }

    fn is_null(&self, expression: Expression) -> Predicate {
        Predicate::IsNull(expression)
    }

    fn between(&self, expression: Expression, start: Expression, end: Expression) -> Predicate {
        Predicate::Between {
            expression,
            start,
            end,
        }
    }

    fn and(&self, predicates: Vec<Predicate>) -> Predicate {
        Predicate::And(predicates)
    }

    fn or(&self, predicates: Vec<Predicate>) -> Predicate {
        Predicate::Or(predicates)
    }

    fn not(&self, predicate: Predicate) -> Predicate {
        Predicate::Not(Box::new(predicate))
    }
}
