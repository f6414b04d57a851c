//! Kind-specific shaping of pipeline output into series data.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::pipeline::{
    AggregateFunction, SeriesPoint, SortField, SortOrder, TransformOptions, filter_records,
    sort_points, transform, truncate,
};
use crate::core::ChartKind;
use crate::core::TimeRange;
use crate::core::record::{
    UNKNOWN_NAME, display_string, format_plain_number, is_truthy, lenient_number, lookup,
    name_field,
};
use crate::error::{WidgetError, WidgetResult};

/// Record field names read by kinds that need more than name and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesFields {
    pub x_field: String,
    pub y_field: String,
    pub size_field: Option<String>,
    pub stack_field: String,
    pub parent_field: String,
    pub source_field: String,
    pub target_field: String,
    pub total_field: String,
    pub date_field: String,
    pub open_field: String,
    pub close_field: String,
    pub low_field: String,
    pub high_field: String,
    pub volume_field: String,
}

impl Default for SeriesFields {
    fn default() -> Self {
        Self {
            x_field: "x".to_owned(),
            y_field: "y".to_owned(),
            size_field: None,
            stack_field: "stack".to_owned(),
            parent_field: "parent".to_owned(),
            source_field: "source".to_owned(),
            target_field: "target".to_owned(),
            total_field: "isTotal".to_owned(),
            date_field: "date".to_owned(),
            open_field: "open".to_owned(),
            close_field: "close".to_owned(),
            low_field: "low".to_owned(),
            high_field: "high".to_owned(),
            volume_field: "volume".to_owned(),
        }
    }
}

/// Colors and anchors used while shaping bar variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarPalette {
    pub positive_color: String,
    pub negative_color: String,
    pub total_color: String,
    pub start_value: f64,
}

impl Default for BarPalette {
    fn default() -> Self {
        Self {
            positive_color: "#5cb85c".to_owned(),
            negative_color: "#d9534f".to_owned(),
            total_color: "#337ab7".to_owned(),
            start_value: 0.0,
        }
    }
}

/// Kind knobs consulted while shaping series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeSettings {
    pub fields: SeriesFields,
    pub bars: BarPalette,
    /// Stacked kinds: express every category as percentages of its total.
    pub normalized: bool,
    /// Candlestick: drop rows older than the selected range ending here.
    #[serde(skip)]
    pub window: Option<(TimeRange, NaiveDate)>,
}

/// Everything one transform run contributes to the option tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesUpdate {
    pub primary_data: Value,
    pub links: Option<Value>,
    /// Stacked kinds produce one series per stack instead of a primary one.
    pub stacks: Vec<StackSeries>,
    pub categories: Option<Vec<String>>,
    pub y_categories: Option<Vec<String>>,
    pub visual_range: Option<(f64, f64)>,
    pub volumes: Option<Value>,
    pub closes: Option<Vec<f64>>,
    pub coerced_values: usize,
}

impl SeriesUpdate {
    fn with_data(primary_data: Value) -> Self {
        Self {
            primary_data,
            links: None,
            stacks: Vec::new(),
            categories: None,
            y_categories: None,
            visual_range: None,
            volumes: None,
            closes: None,
            coerced_values: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackSeries {
    pub name: String,
    pub data: Vec<f64>,
}

/// Shapes `records` for `kind`.
pub fn shape_series(
    kind: ChartKind,
    records: &[Value],
    options: &TransformOptions,
    settings: &ShapeSettings,
) -> WidgetResult<SeriesUpdate> {
    match kind {
        ChartKind::Bar | ChartKind::HorizontalBar | ChartKind::Pie => {
            let output = transform(records, options)?;
            let data = output.series.iter().map(point_object).collect();
            let mut update = SeriesUpdate::with_data(Value::Array(data));
            if kind != ChartKind::Pie {
                update.categories = Some(output.categories);
            }
            update.coerced_values = output.coerced_values;
            Ok(update)
        }
        ChartKind::Gauge => {
            let output = transform(records, options)?;
            let data = output.series.first().map(point_object).into_iter().collect();
            let mut update = SeriesUpdate::with_data(Value::Array(data));
            update.coerced_values = output.coerced_values;
            Ok(update)
        }
        ChartKind::Line | ChartKind::Area | ChartKind::Polar => {
            let output = transform(records, options)?;
            let data = output.series.iter().map(|point| json!(point.value)).collect();
            let mut update = SeriesUpdate::with_data(Value::Array(data));
            update.categories = Some(output.categories);
            update.coerced_values = output.coerced_values;
            Ok(update)
        }
        ChartKind::NegativeBar => {
            let output = transform(records, options)?;
            let palette = &settings.bars;
            let data = output
                .series
                .iter()
                .map(|point| {
                    let color = if point.value >= 0.0 {
                        &palette.positive_color
                    } else {
                        &palette.negative_color
                    };
                    json!({"name": point.name, "value": point.value, "itemStyle": {"color": color}})
                })
                .collect();
            let mut update = SeriesUpdate::with_data(Value::Array(data));
            update.categories = Some(output.categories);
            update.coerced_values = output.coerced_values;
            Ok(update)
        }
        ChartKind::Waterfall => shape_waterfall(records, options, settings),
        ChartKind::Scatter => shape_scatter(records, options, &settings.fields),
        ChartKind::Heatmap => shape_heatmap(records, options, &settings.fields),
        ChartKind::Candlestick => shape_candlestick(records, options, settings),
        ChartKind::Sankey => shape_sankey(records, options, &settings.fields),
        ChartKind::Sunburst | ChartKind::Treemap => {
            shape_hierarchy(records, options, &settings.fields)
        }
        ChartKind::StackedVerticalBar
        | ChartKind::StackedHorizontalBar
        | ChartKind::StackedArea => shape_stacked(records, options, settings),
    }
}

fn point_object(point: &SeriesPoint) -> Value {
    json!({"name": point.name, "value": point.value})
}

fn ensure_finite(label: &str, value: f64) -> WidgetResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WidgetError::Transform(format!("value for `{label}` is not finite")))
    }
}

fn shape_waterfall(
    records: &[Value],
    options: &TransformOptions,
    settings: &ShapeSettings,
) -> WidgetResult<SeriesUpdate> {
    let total_field = &settings.fields.total_field;
    let unordered = TransformOptions {
        sort_by: None,
        limit: None,
        ..options.clone()
    };
    let output = transform(records, &unordered)?;

    let total_names: HashSet<String> = if options.aggregate_by.is_some() {
        filter_records(records, &options.filters)
            .into_iter()
            .filter(|record| lookup(record, total_field).is_some_and(is_truthy))
            .map(|record| name_field(record, &options.name_field, UNKNOWN_NAME))
            .collect()
    } else {
        HashSet::new()
    };
    let is_total = |point: &SeriesPoint| {
        if options.aggregate_by.is_some() {
            total_names.contains(&point.name)
        } else {
            records
                .get(point.source)
                .and_then(|record| lookup(record, total_field))
                .is_some_and(is_truthy)
        }
    };

    let (mut steps, totals): (Vec<SeriesPoint>, Vec<SeriesPoint>) =
        output.series.iter().cloned().partition(|point| !is_total(point));
    if let Some(field) = options.sort_by {
        sort_points(&mut steps, field, options.sort_order);
    }
    let mut flagged: Vec<(SeriesPoint, bool)> = steps
        .into_iter()
        .map(|point| (point, false))
        .chain(totals.into_iter().map(|point| (point, true)))
        .collect();
    truncate(&mut flagged, options.limit);

    let palette = &settings.bars;
    let mut cumulative = palette.start_value;
    let mut data = Vec::with_capacity(flagged.len());
    for (point, total) in &flagged {
        if *total {
            data.push(json!({
                "value": cumulative,
                "itemStyle": {"color": palette.total_color},
                "cumulative": cumulative,
                "change": point.value,
                "isTotal": true,
            }));
            continue;
        }
        let previous = cumulative;
        cumulative = ensure_finite(&point.name, cumulative + point.value)?;
        let (color, base) = if point.value >= 0.0 {
            (&palette.positive_color, previous)
        } else {
            (&palette.negative_color, cumulative)
        };
        data.push(json!({
            "value": point.value.abs(),
            "itemStyle": {"color": color},
            "cumulative": cumulative,
            "change": point.value,
            "base": base,
            "isTotal": false,
        }));
    }

    let mut update = SeriesUpdate::with_data(Value::Array(data));
    update.categories = Some(flagged.into_iter().map(|(point, _)| point.name).collect());
    update.coerced_values = output.coerced_values;
    Ok(update)
}

fn shape_scatter(
    records: &[Value],
    options: &TransformOptions,
    fields: &SeriesFields,
) -> WidgetResult<SeriesUpdate> {
    struct ScatterPoint {
        name: String,
        x: f64,
        y: f64,
        size: f64,
    }

    let mut coerced = 0;
    let mut read = |record: &Value, field: &str| {
        let number = lenient_number(lookup(record, field));
        coerced += usize::from(number.coerced);
        number.value
    };
    let mut points = Vec::new();
    for (index, record) in filter_records(records, &options.filters).into_iter().enumerate() {
        let x = ensure_finite(&fields.x_field, read(record, &fields.x_field))?;
        let y = ensure_finite(&fields.y_field, read(record, &fields.y_field))?;
        let size = match &fields.size_field {
            Some(field) => {
                let size = read(record, field);
                if size == 0.0 { 8.0 } else { size }
            }
            None => 8.0,
        };
        points.push(ScatterPoint {
            name: name_field(record, &options.name_field, &format!("Point {}", index + 1)),
            x,
            y,
            size,
        });
    }

    match (options.sort_by, options.sort_order) {
        (Some(SortField::Value), SortOrder::Asc) => points.sort_by(|a, b| a.y.total_cmp(&b.y)),
        (Some(SortField::Value), SortOrder::Desc) => points.sort_by(|a, b| b.y.total_cmp(&a.y)),
        (Some(SortField::Name), SortOrder::Asc) => points.sort_by(|a, b| a.x.total_cmp(&b.x)),
        (Some(SortField::Name), SortOrder::Desc) => points.sort_by(|a, b| b.x.total_cmp(&a.x)),
        (None, _) => {}
    }
    truncate(&mut points, options.limit);

    let data = points
        .into_iter()
        .map(|p| json!({"name": p.name, "value": [p.x, p.y], "symbolSize": p.size}))
        .collect();
    let mut update = SeriesUpdate::with_data(Value::Array(data));
    update.coerced_values = coerced;
    Ok(update)
}

fn shape_heatmap(
    records: &[Value],
    options: &TransformOptions,
    fields: &SeriesFields,
) -> WidgetResult<SeriesUpdate> {
    let filtered = filter_records(records, &options.filters);

    let distinct_labels = |field: &str| {
        let mut labels: Vec<String> = Vec::new();
        for record in &filtered {
            if let Some(Value::String(label)) = lookup(record, field) {
                if !label.is_empty() && !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }
        labels.sort();
        labels
    };
    let x_labels = distinct_labels(&fields.x_field);
    let y_labels = distinct_labels(&fields.y_field);

    let axis_index = |value: Option<&Value>, labels: &[String], fallback: usize| match value {
        Some(Value::String(label)) if !label.is_empty() => {
            labels.iter().position(|l| l == label).unwrap_or(fallback) as f64
        }
        Some(other) if is_truthy(other) => lenient_number(Some(other)).value,
        _ => fallback as f64,
    };

    let mut coerced = 0;
    let mut cells: Vec<(String, f64, f64, f64)> = Vec::with_capacity(filtered.len());
    for (index, record) in filtered.iter().enumerate() {
        let x = axis_index(lookup(record, &fields.x_field), &x_labels, index % 10);
        let y = axis_index(lookup(record, &fields.y_field), &y_labels, index / 10);
        let number = lenient_number(lookup(record, &options.value_field));
        coerced += usize::from(number.coerced);
        let value = ensure_finite(&options.value_field, number.value)?;
        let fallback = format!("{}-{}", format_plain_number(x), format_plain_number(y));
        cells.push((name_field(record, &options.name_field, &fallback), x, y, value));
    }

    if options.sort_by == Some(SortField::Value) {
        match options.sort_order {
            SortOrder::Asc => cells.sort_by(|a, b| a.3.total_cmp(&b.3)),
            SortOrder::Desc => cells.sort_by(|a, b| b.3.total_cmp(&a.3)),
        }
    }
    truncate(&mut cells, options.limit);

    let visual_range = cells.iter().map(|cell| cell.3).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    });
    let data = cells
        .into_iter()
        .map(|(name, x, y, value)| json!({"name": name, "value": [x, y, value]}))
        .collect();

    let mut update = SeriesUpdate::with_data(Value::Array(data));
    update.categories = (!x_labels.is_empty()).then_some(x_labels);
    update.y_categories = (!y_labels.is_empty()).then_some(y_labels);
    update.visual_range = visual_range;
    update.coerced_values = coerced;
    Ok(update)
}

/// Parses the date formats dashboards commonly send.
#[must_use]
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn shape_candlestick(
    records: &[Value],
    options: &TransformOptions,
    settings: &ShapeSettings,
) -> WidgetResult<SeriesUpdate> {
    struct Candle {
        date: String,
        parsed: Option<NaiveDate>,
        ohlc: [f64; 4],
        volume: f64,
    }

    let fields = &settings.fields;
    let window_start = settings
        .window
        .and_then(|(range, end)| range.window_start(end));

    let mut coerced = 0;
    let mut candles = Vec::new();
    for record in filter_records(records, &options.filters) {
        let date = lookup(record, &fields.date_field)
            .filter(|value| !value.is_null())
            .map(display_string)
            .unwrap_or_default();
        let parsed = parse_record_date(&date);
        if let (Some(start), Some(day)) = (window_start, parsed) {
            if day < start {
                continue;
            }
        }
        let mut ohlc = [0.0; 4];
        for (slot, field) in ohlc.iter_mut().zip([
            &fields.open_field,
            &fields.close_field,
            &fields.low_field,
            &fields.high_field,
        ]) {
            let number = lenient_number(lookup(record, field));
            coerced += usize::from(number.coerced);
            *slot = ensure_finite(field, number.value)?;
        }
        let volume = lenient_number(lookup(record, &fields.volume_field));
        coerced += usize::from(volume.coerced);
        candles.push(Candle {
            date,
            parsed,
            ohlc,
            volume: volume.value,
        });
    }

    let by_date = |a: &Candle, b: &Candle| match (a.parsed, b.parsed) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.date.cmp(&b.date),
    };
    match (options.sort_by, options.sort_order) {
        (Some(SortField::Name), SortOrder::Asc) => candles.sort_by(by_date),
        (Some(SortField::Name), SortOrder::Desc) => candles.sort_by(|a, b| by_date(b, a)),
        (Some(SortField::Value), SortOrder::Asc) => {
            candles.sort_by(|a, b| a.ohlc[1].total_cmp(&b.ohlc[1]));
        }
        (Some(SortField::Value), SortOrder::Desc) => {
            candles.sort_by(|a, b| b.ohlc[1].total_cmp(&a.ohlc[1]));
        }
        (None, _) => {}
    }
    truncate(&mut candles, options.limit);

    let data = candles.iter().map(|c| json!(c.ohlc)).collect();
    let volumes = candles
        .iter()
        .map(|c| json!([c.date, c.volume]))
        .collect();
    let mut update = SeriesUpdate::with_data(Value::Array(data));
    update.closes = Some(candles.iter().map(|c| c.ohlc[1]).collect());
    update.categories = Some(candles.into_iter().map(|c| c.date).collect());
    update.volumes = Some(Value::Array(volumes));
    update.coerced_values = coerced;
    Ok(update)
}

fn shape_sankey(
    records: &[Value],
    options: &TransformOptions,
    fields: &SeriesFields,
) -> WidgetResult<SeriesUpdate> {
    let mut nodes: Vec<String> = Vec::new();
    let mut links: IndexMap<(String, String), f64> = IndexMap::new();
    let mut coerced = 0;

    for record in filter_records(records, &options.filters) {
        let source = name_field(record, &fields.source_field, UNKNOWN_NAME);
        let target = name_field(record, &fields.target_field, UNKNOWN_NAME);
        let number = lenient_number(lookup(record, &options.value_field));
        coerced += usize::from(number.coerced);
        for node in [&source, &target] {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
        let increment = match options.aggregate_function {
            AggregateFunction::Count => 1.0,
            _ => number.value,
        };
        *links.entry((source, target)).or_insert(0.0) += increment;
    }

    let mut link_values = Vec::with_capacity(links.len());
    for ((source, target), value) in links {
        let value = ensure_finite(&format!("{source} -> {target}"), value)?;
        link_values.push(json!({"source": source, "target": target, "value": value}));
    }
    if options.sort_by == Some(SortField::Value) {
        let key = |link: &Value| link.get("value").and_then(Value::as_f64).unwrap_or(0.0);
        match options.sort_order {
            SortOrder::Asc => link_values.sort_by(|a, b| key(a).total_cmp(&key(b))),
            SortOrder::Desc => link_values.sort_by(|a, b| key(b).total_cmp(&key(a))),
        }
    }
    truncate(&mut link_values, options.limit);

    let node_values = nodes.into_iter().map(|name| json!({"name": name})).collect();
    let mut update = SeriesUpdate::with_data(Value::Array(node_values));
    update.links = Some(Value::Array(link_values));
    update.coerced_values = coerced;
    Ok(update)
}

fn shape_hierarchy(
    records: &[Value],
    options: &TransformOptions,
    fields: &SeriesFields,
) -> WidgetResult<SeriesUpdate> {
    struct Node {
        name: String,
        value: f64,
        children: Vec<usize>,
    }

    let filtered = filter_records(records, &options.filters);
    let mut nodes: Vec<Node> = Vec::with_capacity(filtered.len());
    let mut by_name: IndexMap<String, usize> = IndexMap::new();
    let mut roots = Vec::new();
    let mut coerced = 0;

    for record in &filtered {
        let name = name_field(record, &options.name_field, UNKNOWN_NAME);
        let number = lenient_number(lookup(record, &options.value_field));
        coerced += usize::from(number.coerced);
        let value = ensure_finite(&name, number.value)?;
        let index = nodes.len();
        nodes.push(Node {
            name: name.clone(),
            value,
            children: Vec::new(),
        });
        by_name.insert(name, index);
        if !lookup(record, &fields.parent_field).is_some_and(is_truthy) {
            roots.push(index);
        }
    }
    for record in &filtered {
        let Some(parent) = lookup(record, &fields.parent_field).filter(|v| is_truthy(v)) else {
            continue;
        };
        let name = name_field(record, &options.name_field, UNKNOWN_NAME);
        if let (Some(&parent_index), Some(&child_index)) =
            (by_name.get(&display_string(parent)), by_name.get(&name))
        {
            nodes[parent_index].children.push(child_index);
        }
    }

    fn sort_indices(nodes: &[Node], indices: &mut [usize], order: SortOrder) {
        match order {
            SortOrder::Asc => indices.sort_by(|a, b| nodes[*a].value.total_cmp(&nodes[*b].value)),
            SortOrder::Desc => indices.sort_by(|a, b| nodes[*b].value.total_cmp(&nodes[*a].value)),
        }
    }

    fn to_value(
        nodes: &[Node],
        index: usize,
        sort: Option<SortOrder>,
        path: &mut Vec<usize>,
    ) -> Value {
        let node = &nodes[index];
        let mut map = Map::new();
        map.insert("name".to_owned(), Value::String(node.name.clone()));
        map.insert("value".to_owned(), json!(node.value));
        path.push(index);
        let mut children: Vec<usize> = node
            .children
            .iter()
            .copied()
            .filter(|child| !path.contains(child))
            .collect();
        if let Some(order) = sort {
            sort_indices(nodes, &mut children, order);
        }
        if !children.is_empty() {
            let values = children
                .into_iter()
                .map(|child| to_value(nodes, child, sort, path))
                .collect();
            map.insert("children".to_owned(), Value::Array(values));
        }
        path.pop();
        Value::Object(map)
    }

    let sort = (options.sort_by == Some(SortField::Value)).then_some(options.sort_order);
    if let Some(order) = sort {
        sort_indices(&nodes, &mut roots, order);
    }
    truncate(&mut roots, options.limit);

    let mut path = Vec::new();
    let data = roots
        .into_iter()
        .map(|root| to_value(&nodes, root, sort, &mut path))
        .collect();
    let mut update = SeriesUpdate::with_data(Value::Array(data));
    update.coerced_values = coerced;
    Ok(update)
}

fn shape_stacked(
    records: &[Value],
    options: &TransformOptions,
    settings: &ShapeSettings,
) -> WidgetResult<SeriesUpdate> {
    let mut categories: Vec<String> = Vec::new();
    let mut stacks: IndexMap<String, IndexMap<String, f64>> = IndexMap::new();
    let mut coerced = 0;

    for record in filter_records(records, &options.filters) {
        let category = name_field(record, &options.name_field, UNKNOWN_NAME);
        let stack = name_field(record, &settings.fields.stack_field, "default");
        let number = lenient_number(lookup(record, &options.value_field));
        coerced += usize::from(number.coerced);
        if !categories.contains(&category) {
            categories.push(category.clone());
        }
        *stacks.entry(stack).or_default().entry(category).or_insert(0.0) += number.value;
    }

    let total_of = |category: &str| -> f64 {
        stacks
            .values()
            .map(|values| values.get(category).copied().unwrap_or(0.0))
            .sum()
    };
    match (options.sort_by, options.sort_order) {
        (Some(SortField::Name), SortOrder::Asc) => categories.sort(),
        (Some(SortField::Name), SortOrder::Desc) => categories.sort_by(|a, b| b.cmp(a)),
        (Some(SortField::Value), SortOrder::Asc) => {
            categories.sort_by(|a, b| total_of(a).total_cmp(&total_of(b)));
        }
        (Some(SortField::Value), SortOrder::Desc) => {
            categories.sort_by(|a, b| total_of(b).total_cmp(&total_of(a)));
        }
        (None, _) => {}
    }
    truncate(&mut categories, options.limit);

    let totals: Vec<f64> = categories.iter().map(|c| total_of(c)).collect();
    let mut series = Vec::with_capacity(stacks.len());
    for (name, values) in &stacks {
        let mut data = Vec::with_capacity(categories.len());
        for (category, total) in categories.iter().zip(&totals) {
            let raw = values.get(category).copied().unwrap_or(0.0);
            let value = if settings.normalized {
                if *total == 0.0 { 0.0 } else { raw / total * 100.0 }
            } else {
                raw
            };
            data.push(ensure_finite(category, value)?);
        }
        series.push(StackSeries {
            name: name.clone(),
            data,
        });
    }

    let mut update = SeriesUpdate::with_data(Value::Array(Vec::new()));
    update.stacks = series;
    update.categories = Some(categories);
    update.coerced_values = coerced;
    Ok(update)
}
