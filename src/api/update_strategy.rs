//! How fresh data is written into an already built widget.

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::builder::{set_axis_data, set_key};
use super::pipeline::{SortField, SortOrder, TransformOptions};
use super::series_transform::{ShapeSettings, shape_series};
use crate::core::record::{is_truthy, lookup};
use crate::core::{ChartKind, Widget};

impl ChartKind {
    /// Writes `data` into `widget` the way this kind lays out its series.
    ///
    /// Only the widget is touched; pushing to the engine is the caller's job.
    pub fn apply_update(self, widget: &mut Widget, data: Value) {
        match self {
            Self::Sankey => update_sankey(widget, &data),
            Self::Candlestick => update_candlestick(widget, &data),
            _ => match &data {
                Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                    update_records(self, widget, rows);
                }
                _ => update_primary(widget, data.clone()),
            },
        }
        widget.data = data;
    }
}

/// Resolves the strategy for widgets whose kind is unknown.
pub fn apply_update(widget: &mut Widget, data: Value) {
    match widget.chart_kind() {
        Some(kind) => kind.apply_update(widget, data),
        None => {
            update_primary(widget, data.clone());
            widget.data = data;
        }
    }
}

fn series_mut(widget: &mut Widget) -> Option<&mut Vec<Value>> {
    widget
        .config
        .options
        .get_mut("series")
        .and_then(Value::as_array_mut)
}

/// Series added next to the primary one keep their own data.
fn update_primary(widget: &mut Widget, data: Value) {
    if let Some(primary) = series_mut(widget).and_then(|series| series.first_mut()) {
        set_key(primary, "data", data);
    }
}

/// Rows without a usable `name` borrow their `category`.
fn with_category_names(rows: &[Value]) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            let named = lookup(&row, "name").is_some_and(is_truthy);
            if let (false, Some(category)) = (named, row.get("category").cloned()) {
                set_key(&mut row, "name", category);
            }
            row
        })
        .collect()
}

fn update_records(kind: ChartKind, widget: &mut Widget, rows: &[Value]) {
    let rows = with_category_names(rows);
    let update = match shape_series(
        kind,
        &rows,
        &TransformOptions::default(),
        &ShapeSettings::default(),
    ) {
        Ok(update) => update,
        Err(err) => {
            warn!(widget_id = %widget.id(), chart_kind = %kind, error = %err, "update skipped");
            return;
        }
    };
    if update.coerced_values > 0 {
        debug!(
            widget_id = %widget.id(),
            coerced = update.coerced_values,
            "non-numeric update values read as 0"
        );
    }

    if let Some(series) = series_mut(widget) {
        if update.stacks.is_empty() {
            if let Some(primary) = series.first_mut() {
                set_key(primary, "data", update.primary_data);
                if let Some(links) = update.links {
                    set_key(primary, "links", links);
                }
            }
        } else {
            for stack in &update.stacks {
                let target = series.iter().position(|entry| {
                    entry.get("name").and_then(Value::as_str) == Some(stack.name.as_str())
                });
                match target {
                    Some(index) => set_key(&mut series[index], "data", json!(stack.data)),
                    None => {
                        let mut entry = series.first().cloned().unwrap_or_else(|| json!({}));
                        set_key(&mut entry, "name", json!(stack.name));
                        set_key(&mut entry, "data", json!(stack.data));
                        series.push(entry);
                    }
                }
            }
        }
    }

    let options = &mut widget.config.options;
    if let (Some(key), Some(categories)) = (kind.category_axis().key(), &update.categories) {
        set_axis_data(options, key, categories);
    }
    if let Some(y_categories) = &update.y_categories {
        set_axis_data(options, "yAxis", y_categories);
    }
    if let (Some((min, max)), Some(visual_map)) =
        (update.visual_range, options.get_mut("visualMap"))
    {
        set_key(visual_map, "min", json!(min));
        set_key(visual_map, "max", json!(max));
    }
}

fn update_sankey(widget: &mut Widget, data: &Value) {
    let (nodes, links) = match data {
        Value::Object(shaped) => (
            shaped.get("nodes").cloned().unwrap_or_else(|| json!([])),
            shaped.get("links").cloned().unwrap_or_else(|| json!([])),
        ),
        Value::Array(records) => {
            match shape_series(
                ChartKind::Sankey,
                records,
                &TransformOptions::default(),
                &ShapeSettings::default(),
            ) {
                Ok(update) => (update.primary_data, update.links.unwrap_or_else(|| json!([]))),
                Err(err) => {
                    warn!(widget_id = %widget.id(), error = %err, "sankey update skipped");
                    return;
                }
            }
        }
        _ => return,
    };
    if let Some(primary) = series_mut(widget).and_then(|series| series.first_mut()) {
        set_key(primary, "data", nodes);
        set_key(primary, "links", links);
    }
}

fn update_candlestick(widget: &mut Widget, data: &Value) {
    let Value::Array(rows) = data else {
        return;
    };
    let is_records = rows.first().is_some_and(Value::is_object);
    let (candles, dates, volumes, closes) = if is_records {
        let options = TransformOptions::default().with_sort(SortField::Name, SortOrder::Asc);
        match shape_series(ChartKind::Candlestick, rows, &options, &ShapeSettings::default()) {
            Ok(update) => (
                update.primary_data,
                update.categories,
                update.volumes,
                update.closes.map(|closes| json!(closes)),
            ),
            Err(err) => {
                warn!(widget_id = %widget.id(), error = %err, "candlestick update skipped");
                return;
            }
        }
    } else {
        let closes = rows
            .iter()
            .filter_map(|candle| candle.get(1).cloned())
            .collect();
        (data.clone(), None, None, Some(Value::Array(closes)))
    };

    if let Some(series) = series_mut(widget) {
        for entry in series.iter_mut() {
            let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
            let kind = entry.get("type").and_then(Value::as_str).unwrap_or_default();
            let replacement = match (kind, name) {
                ("candlestick", _) => Some(candles.clone()),
                ("bar", "Volume") => volumes.clone(),
                ("line", "Close Price Area") => closes.clone(),
                _ => None,
            };
            if let Some(replacement) = replacement {
                set_key(entry, "data", replacement);
            }
        }
    }

    if let Some(dates) = dates {
        let labels = json!(dates);
        match widget.config.options.get_mut("xAxis") {
            Some(Value::Array(axes)) => {
                for axis in axes.iter_mut() {
                    set_key(axis, "data", labels.clone());
                }
            }
            Some(axis) => set_key(axis, "data", labels),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::apply_update;
    use crate::core::{Widget, WidgetConfig};

    #[test]
    fn unknown_kinds_fill_only_the_primary_series() {
        let mut widget = Widget::new(
            "w",
            WidgetConfig {
                options: json!({"series": [{"type": "custom"}, {"type": "custom"}]}),
                ..WidgetConfig::default()
            },
        );
        apply_update(&mut widget, json!([1, 2]));
        assert_eq!(widget.config.options["series"][0]["data"], json!([1, 2]));
        assert!(widget.config.options["series"][1].get("data").is_none());
        assert_eq!(widget.data, json!([1, 2]));
    }
}
