//! Filter conditions
//!
//! A condition compares a dot-path field against one or more literal values.
//! Fields go through the path resolver, values are quoted and escaped.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::path::FieldRef;

/// `field <operator> value`, ANDed into the WHERE clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-path, resolved like a breakdown dimension
    pub field: String,
    #[serde(alias = "op")]
    pub operator: Operator,
    #[serde(default)]
    pub value: ConditionValue,
}

impl Condition {
    /// Create a condition
    pub fn new(field: impl Into<String>, operator: Operator, value: ConditionValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Eq, ConditionValue::Single(value.into()))
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Ne, ConditionValue::Single(value.into()))
    }

    /// Substring match
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Contains, ConditionValue::Single(value.into()))
    }

    /// Membership in `values`
    pub fn is_in(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, Operator::In, ConditionValue::Multiple(values))
    }

    /// `field IS NOT NULL`
    pub fn is_set(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsSet, ConditionValue::None)
    }

    /// `field IS NULL`
    pub fn is_not_set(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNotSet, ConditionValue::None)
    }

    /// Render as a WHERE clause
    ///
    /// Fails on an unsafe field path or when the value shape does not fit
    /// the operator.
    pub fn to_sql(&self) -> Result<String> {
        let field = FieldRef::parse(&self.field)?.to_sql();

        let clause = match (&self.operator, &self.value) {
            (Operator::IsSet, _) => format!("{} IS NOT NULL", field),
            (Operator::IsNotSet, _) => format!("{} IS NULL", field),
            (Operator::In, ConditionValue::Multiple(values)) if !values.is_empty() => {
                format!("{} IN ({})", field, quote_list(values))
            }
            (Operator::NotIn, ConditionValue::Multiple(values)) if !values.is_empty() => {
                format!("{} NOT IN ({})", field, quote_list(values))
            }
            (op, ConditionValue::Single(v)) => {
                if let Some(symbol) = op.comparison() {
                    format!("{} {} '{}'", field, symbol, escape_string(v))
                } else if let Some((keyword, lead, trail)) = op.like_pattern() {
                    format!(
                        "{} {} '{}{}{}' ESCAPE '\\'",
                        field,
                        keyword,
                        if lead { "%" } else { "" },
                        escape_like(v),
                        if trail { "%" } else { "" },
                    )
                } else {
                    return Err(self.value_mismatch());
                }
            }
            _ => return Err(self.value_mismatch()),
        };

        Ok(clause)
    }

    fn value_mismatch(&self) -> AnalyticsError {
        AnalyticsError::InvalidFilter(format!(
            "operator {} does not accept value {:?} for field {}",
            self.operator.as_str(),
            self.value,
            self.field
        ))
    }
}

/// Comparison applied by a [`Condition`]
///
/// Serialized by canonical name (`eq`, `not_in`, `is_set`, ...);
/// [`Operator::parse`] also takes the symbolic and legacy spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsSet,
    IsNotSet,
}

/// Operator, canonical name, accepted aliases
const OPERATOR_NAMES: &[(Operator, &str, &[&str])] = &[
    (Operator::Eq, "eq", &["=", "=="]),
    (Operator::Ne, "ne", &["!=", "<>"]),
    (Operator::Gt, "gt", &[">"]),
    (Operator::Gte, "gte", &[">="]),
    (Operator::Lt, "lt", &["<"]),
    (Operator::Lte, "lte", &["<="]),
    (Operator::Contains, "contains", &["like"]),
    (Operator::NotContains, "not_contains", &["not_like"]),
    (Operator::StartsWith, "starts_with", &[]),
    (Operator::EndsWith, "ends_with", &[]),
    (Operator::In, "in", &[]),
    (Operator::NotIn, "not_in", &[]),
    (Operator::IsSet, "is_set", &["isset"]),
    (Operator::IsNotSet, "is_not_set", &["isnotset"]),
];

impl Operator {
    /// Parse a canonical name or alias, case-insensitively
    pub fn parse(s: &str) -> Result<Self> {
        let key = s.to_ascii_lowercase();
        OPERATOR_NAMES
            .iter()
            .find(|(_, name, aliases)| *name == key || aliases.contains(&key.as_str()))
            .map(|(op, _, _)| *op)
            .ok_or_else(|| AnalyticsError::InvalidOperator(s.to_string()))
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        OPERATOR_NAMES
            .iter()
            .find(|(op, _, _)| op == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("eq")
    }

    /// SQL comparison symbol for scalar operators
    fn comparison(&self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Ne => Some("!="),
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            _ => None,
        }
    }

    /// `(keyword, leading %, trailing %)` for pattern operators
    fn like_pattern(&self) -> Option<(&'static str, bool, bool)> {
        match self {
            Self::Contains => Some(("LIKE", true, true)),
            Self::NotContains => Some(("NOT LIKE", true, true)),
            Self::StartsWith => Some(("LIKE", false, true)),
            Self::EndsWith => Some(("LIKE", true, false)),
            _ => None,
        }
    }
}

/// Literal operand: absent, a string, or a list of strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// `is_set` / `is_not_set`
    #[default]
    None,
    Single(String),
    /// `in` / `not_in`
    Multiple(Vec<String>),
}

/// Escape a string value for a standard single-quoted SQL literal
///
/// Only `'` is special; backslashes are ordinary characters.
pub fn escape_string(s: &str) -> String {
    s.replace('\'', "''")
}

/// Escape LIKE pattern special characters for `ESCAPE '\'`
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
        .replace('\'', "''")
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", escape_string(v)))
        .collect::<Vec<_>>()
        .join(", ")
}
