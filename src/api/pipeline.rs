//! Filter, aggregate, sort and limit: the shared record pipeline.
//!
//! Every chart kind funnels its raw rows through [`transform`] (or the
//! individual stages) before shaping series data. The stages always run in
//! the same order and never reorder records beyond what sorting requires.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::filter::{DataFilter, apply_filters};
use crate::core::record::{UNKNOWN_NAME, lenient_number, lookup, name_field};
use crate::error::{WidgetError, WidgetResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Fold applied to values sharing a name when aggregation is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateFunction {
    #[default]
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

/// Options of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default = "default_value_field")]
    pub value_field: String,
    #[serde(default)]
    pub filters: Vec<DataFilter>,
    #[serde(default)]
    pub aggregate_by: Option<String>,
    #[serde(default)]
    pub aggregate_function: AggregateFunction,
    #[serde(default)]
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            name_field: default_name_field(),
            value_field: default_value_field(),
            filters: Vec::new(),
            aggregate_by: None,
            aggregate_function: AggregateFunction::default(),
            sort_by: None,
            sort_order: SortOrder::default(),
            limit: None,
        }
    }
}

impl TransformOptions {
    #[must_use]
    pub fn new(name_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        Self {
            name_field: name_field.into(),
            value_field: value_field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: DataFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Vec<DataFilter>) -> Self {
        self.filters = filters;
        self
    }

    /// Enables grouping by name. The key only switches aggregation on; rows
    /// are always grouped by their resolved name.
    #[must_use]
    pub fn with_aggregate_by(mut self, key: impl Into<String>) -> Self {
        self.aggregate_by = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_aggregate_function(mut self, function: AggregateFunction) -> Self {
        self.aggregate_function = function;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = order;
        self
    }

    #[must_use]
    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn validate(&self) -> WidgetResult<()> {
        if self.name_field.trim().is_empty() {
            return Err(WidgetError::Transform("name field must not be empty".to_owned()));
        }
        if self.value_field.trim().is_empty() {
            return Err(WidgetError::Transform("value field must not be empty".to_owned()));
        }
        Ok(())
    }
}

fn default_name_field() -> String {
    "name".to_owned()
}

fn default_value_field() -> String {
    "value".to_owned()
}

/// One named value produced by the pipeline.
///
/// `source` indexes the input record the point came from (the first record
/// of its group after aggregation) so kind strategies can read extra fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub name: String,
    pub value: f64,
    #[serde(skip)]
    pub source: usize,
}

impl SeriesPoint {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            source: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub series: Vec<SeriesPoint>,
    pub categories: Vec<String>,
    /// Present-but-unparsable values that were read as `0`.
    pub coerced_values: usize,
}

/// Runs filter, aggregate, sort and limit over `records`.
pub fn transform(records: &[Value], options: &TransformOptions) -> WidgetResult<TransformOutput> {
    options.validate()?;

    let mut coerced_values = 0;
    let mut points: Vec<SeriesPoint> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| options.filters.iter().all(|filter| filter.matches(record)))
        .map(|(source, record)| {
            let number = lenient_number(lookup(record, &options.value_field));
            if number.coerced {
                coerced_values += 1;
            }
            SeriesPoint {
                name: name_field(record, &options.name_field, UNKNOWN_NAME),
                value: number.value,
                source,
            }
        })
        .collect();

    if options.aggregate_by.is_some() {
        points = aggregate(points, options.aggregate_function);
    }
    if let Some(field) = options.sort_by {
        sort_points(&mut points, field, options.sort_order);
    }
    truncate(&mut points, options.limit);

    if let Some(bad) = points.iter().find(|point| !point.value.is_finite()) {
        return Err(WidgetError::Transform(format!(
            "value for `{}` is not finite",
            bad.name
        )));
    }

    let categories = points.iter().map(|point| point.name.clone()).collect();
    Ok(TransformOutput {
        series: points,
        categories,
        coerced_values,
    })
}

/// Filters records, keeping input order. Re-exported for kind strategies.
#[must_use]
pub fn filter_records<'a>(records: &'a [Value], filters: &[DataFilter]) -> Vec<&'a Value> {
    apply_filters(records, filters)
}

/// Groups points by name in first-seen order and folds their values.
#[must_use]
pub fn aggregate(points: Vec<SeriesPoint>, function: AggregateFunction) -> Vec<SeriesPoint> {
    struct Group {
        source: usize,
        acc: f64,
        count: usize,
    }

    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for point in points {
        match groups.get_mut(&point.name) {
            Some(group) => {
                group.acc = match function {
                    AggregateFunction::Sum | AggregateFunction::Avg => group.acc + point.value,
                    AggregateFunction::Count => group.acc,
                    AggregateFunction::Min => group.acc.min(point.value),
                    AggregateFunction::Max => group.acc.max(point.value),
                };
                group.count += 1;
            }
            None => {
                groups.insert(
                    point.name,
                    Group {
                        source: point.source,
                        acc: point.value,
                        count: 1,
                    },
                );
            }
        }
    }

    groups
        .into_iter()
        .map(|(name, group)| {
            let value = match function {
                AggregateFunction::Avg => group.acc / group.count as f64,
                AggregateFunction::Count => group.count as f64,
                _ => group.acc,
            };
            SeriesPoint {
                name,
                value,
                source: group.source,
            }
        })
        .collect()
}

/// Stable sort; ties keep their input order in both directions.
pub fn sort_points(points: &mut [SeriesPoint], field: SortField, order: SortOrder) {
    match (field, order) {
        (SortField::Name, SortOrder::Asc) => points.sort_by(|a, b| a.name.cmp(&b.name)),
        (SortField::Name, SortOrder::Desc) => points.sort_by(|a, b| b.name.cmp(&a.name)),
        (SortField::Value, SortOrder::Asc) => points.sort_by(|a, b| a.value.total_cmp(&b.value)),
        (SortField::Value, SortOrder::Desc) => points.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
}

/// Keeps the first `limit` points; `None` and `0` keep everything.
pub fn truncate<T>(points: &mut Vec<T>, limit: Option<usize>) {
    if let Some(limit) = limit.filter(|limit| *limit > 0) {
        points.truncate(limit);
    }
}
