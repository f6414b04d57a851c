//! Tabular export of built widgets for the spreadsheet exporter.
//!
//! Rows are read back from the option tree, so widgets updated through the
//! dispatcher export what the engine currently shows.

use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::core::record::{display_string, is_truthy, lenient_number};
use crate::core::{ChartKind, Widget};

/// One exported row, keyed by header in column order.
pub type ExportRow = IndexMap<String, Value>;

/// Longest sheet name spreadsheet formats accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const DEFAULT_SYMBOL_SIZE: f64 = 8.0;
const DEFAULT_GAUGE_MAX: f64 = 100.0;

/// Contract between chart widgets and the spreadsheet exporter.
pub trait ExportAdapter {
    fn export_rows(&self, widget: &Widget) -> Vec<ExportRow>;

    fn export_headers(&self, widget: &Widget) -> Vec<String>;

    fn export_sheet_name(&self, widget: &Widget) -> String;
}

impl ChartKind {
    /// Adapter for `widget`: the configured kind, else its primary series type.
    #[must_use]
    pub fn of_widget(widget: &Widget) -> Option<Self> {
        widget.chart_kind()
    }
}

impl ExportAdapter for ChartKind {
    fn export_rows(&self, widget: &Widget) -> Vec<ExportRow> {
        let view = OptionsView::new(widget);
        match self {
            Self::Bar | Self::HorizontalBar => view.category_rows("Category"),
            Self::Line => view.category_rows("Label"),
            Self::Pie => view.pie_rows(),
            Self::Scatter => view.scatter_rows(),
            Self::Heatmap => view.heatmap_rows(),
            Self::Gauge => view.gauge_rows(),
            Self::Candlestick => view.candlestick_rows(),
            Self::Sankey => view.sankey_rows(),
            Self::Treemap => view.treemap_rows(),
            Self::Sunburst => view.sunburst_rows(),
            Self::Waterfall => view.waterfall_rows(),
            Self::NegativeBar => view.negative_bar_rows(),
            Self::StackedVerticalBar | Self::StackedHorizontalBar => view.stacked_rows(),
            Self::Area | Self::StackedArea => view.wide_rows("Category", true),
            Self::Polar => view.wide_rows("Angle", false),
        }
    }

    fn export_headers(&self, widget: &Widget) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::Bar | Self::HorizontalBar => &["Category", "Value"],
            Self::Line => &["Label", "Value"],
            Self::Pie => &["Category", "Value", "Percentage"],
            Self::Scatter => &["Name", "X Value", "Y Value", "Symbol Size"],
            Self::Heatmap => &["X", "Y", "Value", "Name"],
            Self::Gauge => &["Name", "Value", "Percentage"],
            Self::Candlestick => &["Date", "Open", "Close", "Low", "High"],
            Self::Sankey => &["Source", "Target", "Value"],
            Self::Treemap => &["Name", "Value", "Level"],
            Self::Sunburst => &["Level", "Parent", "Name", "Value"],
            Self::Waterfall => &["Category", "Change", "Cumulative", "Type"],
            Self::StackedVerticalBar | Self::StackedHorizontalBar => {
                &["Category", "Series", "Value"]
            }
            Self::NegativeBar => &["Category", "Value", "Type"],
            Self::Area | Self::StackedArea => {
                let columns = OptionsView::new(widget).column_names("Category");
                return wide_headers("Category", &columns);
            }
            Self::Polar => {
                return wide_headers("Angle", &OptionsView::new(widget).column_names("Angle"));
            }
        };
        fixed.iter().map(|header| (*header).to_owned()).collect()
    }

    fn export_sheet_name(&self, widget: &Widget) -> String {
        let fallback = format!("{} Chart Data", self.display_name());
        sanitize_sheet_name(widget.header_title().unwrap_or_default(), &fallback)
    }
}

/// Keeps `[A-Za-z0-9_ ]`, cuts to 31 characters and trims; empty results
/// become `fallback`.
#[must_use]
pub fn sanitize_sheet_name(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ' ')
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        fallback.chars().take(MAX_SHEET_NAME_LEN).collect()
    } else {
        trimmed.to_owned()
    }
}

fn wide_headers(first: &str, columns: &[String]) -> Vec<String> {
    std::iter::once(first.to_owned())
        .chain(columns.iter().cloned())
        .collect()
}

fn row<const N: usize>(cells: [(&str, Value); N]) -> ExportRow {
    cells
        .into_iter()
        .map(|(header, value)| (header.to_owned(), value))
        .collect()
}

fn percentage(part: f64, whole: f64, decimals: usize) -> Value {
    if whole == 0.0 {
        return json!("0%");
    }
    json!(format!("{:.decimals$}%", part / whole * 100.0))
}

/// Number carried by a series item, whether bare or `{value: ...}`.
fn item_value(item: &Value) -> f64 {
    match item {
        Value::Object(map) => lenient_number(map.get("value")).value,
        other => lenient_number(Some(other)).value,
    }
}

fn item_name(item: &Value) -> Option<String> {
    item.get("name").filter(|name| is_truthy(name)).map(display_string)
}

struct OptionsView<'a> {
    options: &'a Value,
}

impl<'a> OptionsView<'a> {
    fn new(widget: &'a Widget) -> Self {
        Self {
            options: &widget.config.options,
        }
    }

    fn series(&self) -> &'a [Value] {
        self.options
            .get("series")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    fn series_data(&self, index: usize) -> &'a [Value] {
        self.series()
            .get(index)
            .and_then(|series| series.get("data"))
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// One distinct column per series; repeated names get ` (2)`, ` (3)`...
    fn column_names(&self, first_header: &str) -> Vec<String> {
        let mut taken = vec![first_header.to_owned()];
        for series in self.series() {
            let name = item_name(series).unwrap_or_else(|| "Series".to_owned());
            let mut column = name.clone();
            let mut copy = 2;
            while taken.contains(&column) {
                column = format!("{name} ({copy})");
                copy += 1;
            }
            taken.push(column);
        }
        taken.split_off(1)
    }

    /// Labels of the first axis stored under `key`, single or listed.
    fn axis_labels(&self, key: &str) -> Vec<String> {
        let axis = match self.options.get(key) {
            Some(Value::Array(axes)) => axes.first(),
            other => other,
        };
        axis.and_then(|axis| axis.get("data"))
            .and_then(Value::as_array)
            .map(|labels| labels.iter().map(display_string).collect())
            .unwrap_or_default()
    }

    fn category_labels(&self) -> Vec<String> {
        let x = self.axis_labels("xAxis");
        if x.is_empty() { self.axis_labels("yAxis") } else { x }
    }

    fn label_at(labels: &[String], item: &Value, index: usize, prefix: &str) -> String {
        item_name(item)
            .or_else(|| labels.get(index).cloned())
            .unwrap_or_else(|| format!("{prefix} {}", index + 1))
    }

    fn category_rows(&self, label_header: &str) -> Vec<ExportRow> {
        let labels = self.category_labels();
        self.series_data(0)
            .iter()
            .enumerate()
            .map(|(index, item)| {
                row([
                    (label_header, json!(Self::label_at(&labels, item, index, "Item"))),
                    ("Value", json!(item_value(item))),
                ])
            })
            .collect()
    }

    fn pie_rows(&self) -> Vec<ExportRow> {
        let data = self.series_data(0);
        let total: f64 = data.iter().map(item_value).sum();
        data.iter()
            .map(|item| {
                let value = item_value(item);
                row([
                    ("Category", json!(item_name(item).unwrap_or_else(|| "Unknown".to_owned()))),
                    ("Value", json!(value)),
                    ("Percentage", percentage(value, total, 2)),
                ])
            })
            .collect()
    }

    fn scatter_rows(&self) -> Vec<ExportRow> {
        self.series_data(0)
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let coords = item.get("value").unwrap_or(item);
                let size = item
                    .get("symbolSize")
                    .map_or(DEFAULT_SYMBOL_SIZE, |size| lenient_number(Some(size)).value);
                row([
                    ("Name", json!(item_name(item).unwrap_or_else(|| format!("Point {}", index + 1)))),
                    ("X Value", json!(lenient_number(coords.get(0)).value)),
                    ("Y Value", json!(lenient_number(coords.get(1)).value)),
                    ("Symbol Size", json!(size)),
                ])
            })
            .collect()
    }

    fn heatmap_rows(&self) -> Vec<ExportRow> {
        let x_labels = self.axis_labels("xAxis");
        let y_labels = self.axis_labels("yAxis");
        let resolve = |labels: &[String], raw: f64| -> Value {
            let index = raw as usize;
            if raw >= 0.0 && raw.fract() == 0.0 && index < labels.len() {
                json!(labels[index])
            } else {
                json!(raw)
            }
        };
        self.series_data(0)
            .iter()
            .filter_map(|item| {
                let cell = item.get("value").unwrap_or(item).as_array()?;
                let x = lenient_number(cell.first()).value;
                let y = lenient_number(cell.get(1)).value;
                let name = item_name(item).unwrap_or_else(|| {
                    format!("{}-{}", display_string(&json!(x)), display_string(&json!(y)))
                });
                Some(row([
                    ("X", resolve(&x_labels, x)),
                    ("Y", resolve(&y_labels, y)),
                    ("Value", json!(lenient_number(cell.get(2)).value)),
                    ("Name", json!(name)),
                ]))
            })
            .collect()
    }

    fn gauge_rows(&self) -> Vec<ExportRow> {
        let max = self
            .series()
            .first()
            .and_then(|series| series.get("max"))
            .map(|max| lenient_number(Some(max)).value)
            .filter(|max| *max != 0.0)
            .unwrap_or(DEFAULT_GAUGE_MAX);
        self.series_data(0)
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                let value = item_value(item);
                row([
                    ("Name", json!(item_name(item).unwrap_or_else(|| "Gauge".to_owned()))),
                    ("Value", json!(value)),
                    ("Percentage", percentage(value, max, 1)),
                ])
            })
            .collect()
    }

    fn candlestick_rows(&self) -> Vec<ExportRow> {
        let dates = self.axis_labels("xAxis");
        let candles = self
            .series()
            .iter()
            .find(|series| series.get("type").and_then(Value::as_str) == Some("candlestick"))
            .and_then(|series| series.get("data"))
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);
        candles
            .iter()
            .enumerate()
            .map(|(index, candle)| {
                let ohlc = candle.get("value").unwrap_or(candle);
                let at = |position: usize| json!(lenient_number(ohlc.get(position)).value);
                row([
                    ("Date", json!(dates.get(index).cloned().unwrap_or_else(|| format!("Day {}", index + 1)))),
                    ("Open", at(0)),
                    ("Close", at(1)),
                    ("Low", at(2)),
                    ("High", at(3)),
                ])
            })
            .collect()
    }

    fn sankey_rows(&self) -> Vec<ExportRow> {
        self.series()
            .first()
            .and_then(|series| series.get("links"))
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .map(|link| {
                let endpoint = |key: &str| json!(link.get(key).map(display_string).unwrap_or_default());
                row([
                    ("Source", endpoint("source")),
                    ("Target", endpoint("target")),
                    ("Value", json!(item_value(link))),
                ])
            })
            .collect()
    }

    fn treemap_rows(&self) -> Vec<ExportRow> {
        let mut rows = Vec::new();
        walk_tree(self.series_data(0), 0, None, &mut |node, level, _| {
            rows.push(row([
                ("Name", json!(item_name(node).unwrap_or_default())),
                ("Value", json!(item_value(node))),
                ("Level", json!(level)),
            ]));
        });
        rows
    }

    fn sunburst_rows(&self) -> Vec<ExportRow> {
        let mut rows = Vec::new();
        walk_tree(self.series_data(0), 0, None, &mut |node, level, parent| {
            rows.push(row([
                ("Level", json!(level)),
                ("Parent", json!(parent.unwrap_or("Root"))),
                ("Name", json!(item_name(node).unwrap_or_default())),
                ("Value", json!(item_value(node))),
            ]));
        });
        rows
    }

    fn waterfall_rows(&self) -> Vec<ExportRow> {
        let labels = self.axis_labels("xAxis");
        self.series_data(0)
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let change = item.get("change").map_or_else(|| item_value(item), |c| lenient_number(Some(c)).value);
                let cumulative = item
                    .get("cumulative")
                    .map_or_else(|| item_value(item), |c| lenient_number(Some(c)).value);
                let kind = if item.get("isTotal").is_some_and(is_truthy) {
                    "Total"
                } else if change >= 0.0 {
                    "Positive"
                } else {
                    "Negative"
                };
                row([
                    ("Category", json!(Self::label_at(&labels, item, index, "Category"))),
                    ("Change", json!(change)),
                    ("Cumulative", json!(cumulative)),
                    ("Type", json!(kind)),
                ])
            })
            .collect()
    }

    fn negative_bar_rows(&self) -> Vec<ExportRow> {
        let labels = self.category_labels();
        self.series_data(0)
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let value = item_value(item);
                row([
                    ("Category", json!(Self::label_at(&labels, item, index, "Item"))),
                    ("Value", json!(value)),
                    ("Type", json!(if value >= 0.0 { "Positive" } else { "Negative" })),
                ])
            })
            .collect()
    }

    /// One row per category and series.
    fn stacked_rows(&self) -> Vec<ExportRow> {
        let labels = self.category_labels();
        let mut rows = Vec::new();
        for (series_index, series) in self.series().iter().enumerate() {
            let name = item_name(series).unwrap_or_else(|| "Series".to_owned());
            for (index, item) in self.series_data(series_index).iter().enumerate() {
                rows.push(row([
                    ("Category", json!(Self::label_at(&labels, item, index, "Category"))),
                    ("Series", json!(name)),
                    ("Value", json!(item_value(item))),
                ]));
            }
        }
        rows
    }

    /// One row per point with one column per series.
    fn wide_rows(&self, first_header: &str, use_axis: bool) -> Vec<ExportRow> {
        let labels = if use_axis { self.category_labels() } else { Vec::new() };
        let names = self.column_names(first_header);
        let mut rows: Vec<ExportRow> = self
            .series_data(0)
            .iter()
            .enumerate()
            .map(|(index, _)| {
                let label = labels
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format!("Point {}", index + 1));
                row([(first_header, json!(label))])
            })
            .collect();
        for (series_index, name) in names.iter().enumerate() {
            let data = self.series_data(series_index);
            for (index, out) in rows.iter_mut().enumerate() {
                let value = data.get(index).map_or(0.0, item_value);
                out.insert(name.clone(), json!(value));
            }
        }
        rows
    }
}

fn walk_tree(
    nodes: &[Value],
    level: usize,
    parent: Option<&str>,
    visit: &mut dyn FnMut(&Value, usize, Option<&str>),
) {
    for node in nodes {
        visit(node, level, parent);
        if let Some(children) = node.get("children").and_then(Value::as_array) {
            let name = item_name(node).unwrap_or_default();
            walk_tree(children, level + 1, Some(&name), visit);
        }
    }
}
