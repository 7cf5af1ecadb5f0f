//! Resolution of client filters into a typed, store-agnostic query plan.
//!
//! [`QueryPlan::build`] checks every condition against the entity's field
//! catalogue and coerces values to the field kind, so stores only ever see
//! known columns and well-typed operands. Each [`Comparison`] maps to exactly
//! one store-level predicate.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::cmp::Ordering;

use super::Entity;
use super::filter::{FilterCondition, FilterOperator, FilterSpec, SortDirection, SortSpec};
use super::page::PageRequest;
use super::record::{FieldDef, FieldKind, FieldValue, Record};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Equals(FieldValue),
    NotEqual(FieldValue),
    Contains(String),
    NotContains(String),
    StartsWith(String),
    EndsWith(String),
    LessThan(FieldValue),
    LessThanOrEqual(FieldValue),
    GreaterThan(FieldValue),
    GreaterThanOrEqual(FieldValue),
    InRange(FieldValue, FieldValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: &'static str,
    pub comparison: Comparison,
}

impl Predicate {
    /// In-process evaluation, mirroring the SQL semantics: a null column
    /// never satisfies a predicate.
    pub fn matches(&self, record: &Record) -> bool {
        let value = match record.get(self.field) {
            None | Some(FieldValue::Null) => return false,
            Some(v) => v,
        };

        match &self.comparison {
            Comparison::Equals(v) => value.compare(v) == Some(Ordering::Equal),
            Comparison::NotEqual(v) => matches!(
                value.compare(v),
                Some(Ordering::Less | Ordering::Greater)
            ),
            Comparison::Contains(p) => lowered(value).is_some_and(|s| s.contains(p.as_str())),
            Comparison::NotContains(p) => lowered(value).is_some_and(|s| !s.contains(p.as_str())),
            Comparison::StartsWith(p) => lowered(value).is_some_and(|s| s.starts_with(p.as_str())),
            Comparison::EndsWith(p) => lowered(value).is_some_and(|s| s.ends_with(p.as_str())),
            Comparison::LessThan(v) => value.compare(v) == Some(Ordering::Less),
            Comparison::LessThanOrEqual(v) => matches!(
                value.compare(v),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::GreaterThan(v) => value.compare(v) == Some(Ordering::Greater),
            Comparison::GreaterThanOrEqual(v) => matches!(
                value.compare(v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparison::InRange(from, to) => {
                matches!(value.compare(from), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(value.compare(to), Some(Ordering::Less | Ordering::Equal))
            }
        }
    }
}

fn lowered(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s.to_lowercase()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub descending: bool,
}

/// Everything a store needs to answer a filtered, paginated query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicates: Vec<Predicate>,
    pub sort: Vec<SortKey>,
    pub page: PageRequest,
}

impl QueryPlan {
    /// Builds a plan for entity `E`.
    ///
    /// When `sort` is empty the entity's default sort applies. `id ASC` is
    /// always appended as a tie-breaker so page boundaries are stable across
    /// repeated calls on unchanged data.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a condition or sort key names an
    /// unknown field, uses an operator the field kind does not support, or
    /// carries a value that cannot be coerced to the field kind.
    pub fn build<E: Entity>(
        filter: &FilterSpec,
        sort: &[SortSpec],
        page: PageRequest,
    ) -> Result<Self, AppError> {
        let predicates = filter
            .conditions
            .iter()
            .map(resolve_condition::<E>)
            .collect::<Result<Vec<_>, _>>()?;

        let requested = if sort.is_empty() {
            E::default_sort()
        } else {
            sort.to_vec()
        };

        let mut keys = requested
            .iter()
            .map(|s| {
                let def = lookup::<E>(&s.field)?;
                Ok(SortKey {
                    field: def.name,
                    descending: s.direction == SortDirection::Desc,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if !keys.iter().any(|k| k.field == "id") {
            keys.push(SortKey {
                field: "id",
                descending: false,
            });
        }

        Ok(Self {
            predicates,
            sort: keys,
            page,
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Orders two records by the plan's sort keys.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.sort {
            let left = a.get(key.field).unwrap_or(&FieldValue::Null);
            let right = b.get(key.field).unwrap_or(&FieldValue::Null);

            // Nulls stay last ascending and move first descending, as in PostgreSQL.
            let ordering = left.compare(right).unwrap_or(Ordering::Equal);
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Resolves a client field name. Both `hex_code` and `hexCode` are accepted.
fn lookup<E: Entity>(name: &str) -> Result<FieldDef, AppError> {
    E::field(name).or_else(|| E::field(&snake_case(name))).ok_or_else(|| {
        AppError::bad_request(
            format!("Unknown field '{name}'"),
            json!({
                "field": name,
                "allowed": E::all_fields().map(|f| f.name).collect::<Vec<_>>(),
            }),
        )
    })
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn resolve_condition<E: Entity>(condition: &FilterCondition) -> Result<Predicate, AppError> {
    let def = lookup::<E>(&condition.field)?;
    let op = condition.operator;

    if op.is_pattern() && def.kind != FieldKind::Text {
        return Err(unsupported(&def, op));
    }
    if op.is_ordering() && def.kind == FieldKind::Boolean {
        return Err(unsupported(&def, op));
    }

    let comparison = if op.is_pattern() {
        let pattern = match &condition.value {
            Value::String(s) if !s.is_empty() => s.to_lowercase(),
            _ => {
                return Err(AppError::bad_request(
                    "Pattern filters need a non-empty string value",
                    json!({ "field": def.name }),
                ));
            }
        };
        match op {
            FilterOperator::Contains => Comparison::Contains(pattern),
            FilterOperator::NotContains => Comparison::NotContains(pattern),
            FilterOperator::StartsWith => Comparison::StartsWith(pattern),
            _ => Comparison::EndsWith(pattern),
        }
    } else {
        let value = coerce(&def, &condition.value)?;
        match op {
            FilterOperator::Equals => Comparison::Equals(value),
            FilterOperator::NotEqual => Comparison::NotEqual(value),
            FilterOperator::LessThan => Comparison::LessThan(value),
            FilterOperator::LessThanOrEqual => Comparison::LessThanOrEqual(value),
            FilterOperator::GreaterThan => Comparison::GreaterThan(value),
            FilterOperator::GreaterThanOrEqual => Comparison::GreaterThanOrEqual(value),
            _ => {
                let to = condition.to.as_ref().ok_or_else(|| {
                    AppError::bad_request(
                        "inRange filters need an upper bound in 'to'",
                        json!({ "field": def.name }),
                    )
                })?;
                Comparison::InRange(value, coerce(&def, to)?)
            }
        }
    };

    Ok(Predicate {
        field: def.name,
        comparison,
    })
}

fn unsupported(def: &FieldDef, op: FilterOperator) -> AppError {
    AppError::bad_request(
        format!("Operator {op:?} is not supported on field '{}'", def.name),
        json!({ "field": def.name, "operator": format!("{op:?}") }),
    )
}

fn coerce(def: &FieldDef, value: &Value) -> Result<FieldValue, AppError> {
    let coerced = match (def.kind, value) {
        (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
        (FieldKind::Integer, Value::String(s)) => s.trim().parse().ok().map(FieldValue::Integer),
        (FieldKind::Float, Value::Number(n)) => n.as_f64().map(FieldValue::Float),
        (FieldKind::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float),
        (FieldKind::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
        (FieldKind::Text, Value::Number(n)) => Some(FieldValue::Text(n.to_string())),
        (FieldKind::Boolean, Value::Bool(b)) => Some(FieldValue::Boolean(*b)),
        (FieldKind::Boolean, Value::String(s)) => s.parse().ok().map(FieldValue::Boolean),
        (FieldKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| FieldValue::Timestamp(dt.with_timezone(&Utc))),
        _ => None,
    };

    coerced.ok_or_else(|| {
        AppError::bad_request(
            format!("Invalid filter value for field '{}'", def.name),
            json!({ "field": def.name, "expected": format!("{:?}", def.kind), "value": value }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::record::BASE_FIELDS;

    #[derive(Debug, Clone)]
    struct Gadget;

    impl Entity for Gadget {
        const RESOURCE: &'static str = "gadget";
        const TABLE: &'static str = "gadgets";
        const FIELDS: &'static [FieldDef] = &[
            FieldDef::unique("name", FieldKind::Text),
            FieldDef::new("weight", FieldKind::Float),
            FieldDef::new("active", FieldKind::Boolean),
        ];

        fn id(&self) -> i64 {
            0
        }

        fn from_record(_record: &Record) -> Result<Self, AppError> {
            Ok(Self)
        }
    }

    fn plan(filter: FilterSpec) -> Result<QueryPlan, AppError> {
        QueryPlan::build::<Gadget>(&filter, &[], PageRequest::default())
    }

    #[test]
    fn test_unknown_field_is_validation_error() {
        let err = plan(FilterSpec::new().and(FilterCondition::new(
            "colour",
            FilterOperator::Equals,
            "red",
        )))
        .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_base_fields_are_filterable() {
        assert_eq!(BASE_FIELDS.len(), 3);
        let plan = plan(FilterSpec::new().and(FilterCondition::new(
            "id",
            FilterOperator::GreaterThan,
            "5",
        )))
        .unwrap();

        assert_eq!(
            plan.predicates[0].comparison,
            Comparison::GreaterThan(FieldValue::Integer(5))
        );
    }

    #[test]
    fn test_camel_case_field_names_resolve() {
        let plan = QueryPlan::build::<Gadget>(
            &FilterSpec::new(),
            &[SortSpec::asc("createdAt")],
            PageRequest::default(),
        )
        .unwrap();

        assert_eq!(plan.sort[0].field, "created_at");
    }

    #[test]
    fn test_pattern_operator_on_number_rejected() {
        let err = plan(FilterSpec::new().and(FilterCondition::new(
            "weight",
            FilterOperator::Contains,
            "1",
        )))
        .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_range_requires_upper_bound() {
        let err = plan(FilterSpec::new().and(FilterCondition::new(
            "weight",
            FilterOperator::InRange,
            1.0,
        )))
        .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_uncoercible_value_rejected() {
        let err = plan(FilterSpec::new().and(FilterCondition::new(
            "active",
            FilterOperator::Equals,
            "maybe",
        )))
        .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_id_tiebreaker_appended() {
        let plan = QueryPlan::build::<Gadget>(
            &FilterSpec::new(),
            &[SortSpec::desc("weight")],
            PageRequest::default(),
        )
        .unwrap();

        assert_eq!(plan.sort.len(), 2);
        assert_eq!(plan.sort[0], SortKey { field: "weight", descending: true });
        assert_eq!(plan.sort[1], SortKey { field: "id", descending: false });
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let plan = plan(
            FilterSpec::new()
                .and(FilterCondition::new("name", FilterOperator::Contains, "WID"))
                .and(FilterCondition::range("weight", 1.0, 2.0)),
        )
        .unwrap();

        let hit = Record::new().with("name", "Big widget").with("weight", 1.5);
        let wrong_weight = Record::new().with("name", "Big widget").with("weight", 3.0);
        let wrong_name = Record::new().with("name", "Gizmo").with("weight", 1.5);

        assert!(plan.matches(&hit));
        assert!(!plan.matches(&wrong_weight));
        assert!(!plan.matches(&wrong_name));
    }

    #[test]
    fn test_null_never_matches() {
        let plan = plan(FilterSpec::new().and(FilterCondition::new(
            "name",
            FilterOperator::NotEqual,
            "x",
        )))
        .unwrap();

        assert!(!plan.matches(&Record::new().with("name", None::<String>)));
    }
}
