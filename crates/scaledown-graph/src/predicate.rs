//! Validated property predicates for criteria-driven node selection.
//!
//! A [`PropertyPredicate`] can only be built from criteria whose keys are in
//! [`ALLOWED_PATTERN_PATHS`]. Property paths are therefore the only text ever
//! spliced into Cypher; every value travels as a bound parameter.

use std::collections::BTreeMap;

use neo4rs::BoltType;
use serde_json::Value;

use scaledown_core::Properties;

use crate::client::GraphError;

/// Maximum number of criteria in a single predicate.
pub const MAX_PATTERN_CRITERIA: usize = 20;

/// Closed set of property paths criteria may reference.
pub const ALLOWED_PATTERN_PATHS: &[&str] = &[
    "type",
    "name",
    "location",
    "kind",
    "sku",
    "resource_group",
    "subscription_id",
    "provisioning_state",
    "tags.environment",
    "tags.owner",
    "tags.application",
    "tags.cost_center",
    "tags.project",
    "tags.team",
];

/// A scalar value a criterion may compare against.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl CriterionValue {
    fn from_json(key: &str, value: &Value) -> Result<Self, GraphError> {
        match value {
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n.as_f64().map(Self::Float).ok_or_else(|| {
                    GraphError::InvalidPredicate(format!("unrepresentable number for '{key}'"))
                }),
            },
            _ => Err(GraphError::InvalidPredicate(format!(
                "criterion '{key}' must be a string, boolean, or number"
            ))),
        }
    }

    /// Exact-match comparison against a stored property value.
    pub fn matches(&self, stored: &Value) -> bool {
        match (self, stored) {
            (Self::String(a), Value::String(b)) => a == b,
            (Self::Bool(a), Value::Bool(b)) => a == b,
            (Self::Int(a), Value::Number(b)) => b.as_i64() == Some(*a),
            (Self::Float(a), Value::Number(b)) => b.as_f64() == Some(*a),
            _ => false,
        }
    }

    pub(crate) fn to_bolt(&self) -> BoltType {
        match self {
            Self::String(s) => s.clone().into(),
            Self::Bool(b) => (*b).into(),
            Self::Int(i) => (*i).into(),
            Self::Float(f) => (*f).into(),
        }
    }
}

/// One `path = value` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyClause {
    pub path: &'static str,
    pub value: CriterionValue,
}

/// A conjunction of exact-match clauses over allow-listed property paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPredicate {
    clauses: Vec<PropertyClause>,
}

impl PropertyPredicate {
    /// Validate criteria and build a predicate.
    ///
    /// Rejects empty criteria, more than [`MAX_PATTERN_CRITERIA`] entries, keys
    /// outside [`ALLOWED_PATTERN_PATHS`], and non-scalar values.
    pub fn new(criteria: &BTreeMap<String, Value>) -> Result<Self, GraphError> {
        if criteria.is_empty() {
            return Err(GraphError::InvalidPredicate(
                "criteria must not be empty".to_string(),
            ));
        }
        if criteria.len() > MAX_PATTERN_CRITERIA {
            return Err(GraphError::InvalidPredicate(format!(
                "{} criteria exceeds the limit of {MAX_PATTERN_CRITERIA}",
                criteria.len()
            )));
        }

        let mut clauses = Vec::with_capacity(criteria.len());
        for (key, value) in criteria {
            let path = ALLOWED_PATTERN_PATHS
                .iter()
                .copied()
                .find(|allowed| *allowed == key)
                .ok_or_else(|| {
                    GraphError::InvalidPredicate(format!("property path '{key}' is not allowed"))
                })?;
            clauses.push(PropertyClause {
                path,
                value: CriterionValue::from_json(key, value)?,
            });
        }

        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[PropertyClause] {
        &self.clauses
    }

    /// Render the WHERE fragment for node variable `var` together with its
    /// parameters (`p0`, `p1`, ...).
    pub fn to_cypher(&self, var: &str) -> (String, Vec<(String, BoltType)>) {
        let mut parts = Vec::with_capacity(self.clauses.len());
        let mut params = Vec::with_capacity(self.clauses.len());
        for (i, clause) in self.clauses.iter().enumerate() {
            let name = format!("p{i}");
            parts.push(format!("{var}.`{}` = ${name}", clause.path));
            params.push((name, clause.value.to_bolt()));
        }
        (parts.join(" AND "), params)
    }

    /// Evaluate against an in-memory property map.
    pub fn matches(&self, properties: &Properties) -> bool {
        self.clauses.iter().all(|clause| {
            properties
                .get(clause.path)
                .is_some_and(|stored| clause.value.matches(stored))
        })
    }
}
