use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{display_string, is_truthy, lookup, strict_number};

/// Comparison applied by a [`DataFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    In,
}

/// Declarative predicate evaluated against one record.
///
/// `column` is a dot path into the record. An empty column matches every
/// record. Payloads written against older dashboards use `property` instead
/// of `column`; both spellings deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFilter {
    #[serde(default, alias = "property")]
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
}

impl DataFilter {
    #[must_use]
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
            display_value: None,
        }
    }

    #[must_use]
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOperator::Equals, value.into())
    }

    #[must_use]
    pub fn with_display_value(mut self, display_value: impl Into<String>) -> Self {
        self.display_value = Some(display_value.into());
        self
    }

    /// Returns whether `record` satisfies this filter.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        if self.column.is_empty() {
            return true;
        }
        let field = lookup(record, &self.column);
        match self.operator {
            FilterOperator::Equals => field.is_some_and(|v| strict_equals(v, &self.value)),
            FilterOperator::Contains => {
                let haystack = field.map_or_else(|| "undefined".to_owned(), display_string);
                haystack
                    .to_lowercase()
                    .contains(&display_string(&self.value).to_lowercase())
            }
            FilterOperator::GreaterThan => {
                strict_number(field) > strict_number(Some(&self.value))
            }
            FilterOperator::LessThan => strict_number(field) < strict_number(Some(&self.value)),
            FilterOperator::GreaterThanOrEqual => {
                strict_number(field) >= strict_number(Some(&self.value))
            }
            FilterOperator::LessThanOrEqual => {
                strict_number(field) <= strict_number(Some(&self.value))
            }
            FilterOperator::In => match (&self.value, field) {
                (Value::Array(candidates), Some(v)) => {
                    candidates.iter().any(|candidate| strict_equals(v, candidate))
                }
                _ => false,
            },
        }
    }

    /// Builds an `equals` filter from the payload of a chart click.
    ///
    /// [`FilterBy::Value`] filters on the clicked element's name (or value
    /// when unnamed); [`FilterBy::Category`] filters on the column name itself.
    #[must_use]
    pub fn from_chart_click(click: &Value, filter_column: &str, filter_by: FilterBy) -> Option<Self> {
        if filter_column.is_empty() || click.is_null() {
            return None;
        }
        let (value, display) = match filter_by {
            FilterBy::Category => (
                Value::String(filter_column.to_owned()),
                filter_column.to_owned(),
            ),
            FilterBy::Value => {
                let value = clicked_value(click);
                let display = display_string(&value);
                (value, display)
            }
        };
        Some(Self {
            column: filter_column.to_owned(),
            operator: FilterOperator::Equals,
            value,
            display_value: Some(display),
        })
    }
}

/// Keeps the records that satisfy every filter, in input order.
#[must_use]
pub fn apply_filters<'a>(records: &'a [Value], filters: &[DataFilter]) -> Vec<&'a Value> {
    records
        .iter()
        .filter(|record| filters.iter().all(|filter| filter.matches(record)))
        .collect()
}

/// Decides what a click on a chart element filters by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterBy {
    #[default]
    Value,
    Category,
}

/// Dashboard-wide criterion `<accessor> = <clicked element>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalFilter {
    pub accessor: String,
    pub operator: FilterOperator,
    pub value: Value,
    pub display_value: String,
}

impl GlobalFilter {
    /// Returns `None` when the click carries no usable value.
    #[must_use]
    pub fn from_chart_click(click: &Value, accessor: &str, filter_by: FilterBy) -> Option<Self> {
        if accessor.is_empty() || click.is_null() {
            return None;
        }
        let value = match filter_by {
            FilterBy::Category => Value::String(accessor.to_owned()),
            FilterBy::Value => {
                let value = clicked_value(click);
                if !is_truthy(&value) {
                    return None;
                }
                value
            }
        };
        Some(Self {
            accessor: accessor.to_owned(),
            operator: FilterOperator::Equals,
            display_value: display_string(&value),
            value,
        })
    }

    /// Criterion object with the accessor repeated as a key, as dashboards
    /// expect when merging several global filters.
    #[must_use]
    pub fn to_criteria(&self) -> Value {
        let mut map = Map::new();
        map.insert("accessor".to_owned(), Value::String(self.accessor.clone()));
        map.insert("operator".to_owned(), Value::String("equals".to_owned()));
        map.insert("value".to_owned(), self.value.clone());
        map.insert(
            "displayValue".to_owned(),
            Value::String(self.display_value.clone()),
        );
        map.insert(self.accessor.clone(), self.value.clone());
        Value::Object(map)
    }
}

/// Kind tag of a [`FilterChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterEventKind {
    FilterChange,
    TimeRangeChange,
    CustomFilter,
}

/// Notification emitted when a widget interaction changes a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChangeEvent {
    #[serde(rename = "type")]
    pub kind: FilterEventKind,
    pub filter_type: String,
    pub value: Value,
    pub widget_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl FilterChangeEvent {
    #[must_use]
    pub fn new(
        kind: FilterEventKind,
        filter_type: impl Into<String>,
        value: Value,
        widget_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            filter_type: filter_type.into(),
            value,
            widget_id: widget_id.into(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

fn clicked_value(click: &Value) -> Value {
    match click.get("name") {
        Some(name) if is_truthy(name) => name.clone(),
        _ => click.get("value").cloned().unwrap_or(Value::Null),
    }
}

/// Identity-free equality: numbers compare by value, everything else structurally.
fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => left == right,
    }
}
