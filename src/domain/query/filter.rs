//! Abstract filter and sort specifications, as submitted by clients.

use serde::Deserialize;
use serde_json::Value;

/// Comparison operator of a single filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    InRange,
}

impl FilterOperator {
    /// Case-insensitive pattern operators, valid on text fields only.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Self::Contains | Self::NotContains | Self::StartsWith | Self::EndsWith
        )
    }

    /// Operators that need an ordering on the field.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
                | Self::InRange
        )
    }
}

/// One `(field, operator, value)` triple. `to` is the upper bound of `inRange`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
    #[serde(default)]
    pub to: Option<Value>,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            to: None,
        }
    }

    pub fn range(field: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::InRange,
            value: from.into(),
            to: Some(to.into()),
        }
    }
}

/// Ordered, conjunctive set of filter conditions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    pub conditions: Vec<FilterCondition>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Requested ordering on one field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}
