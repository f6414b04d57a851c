//! Fluent builder shared by every chart kind.
//!
//! The builder only ever mutates itself. `build` assembles a fresh
//! [`Widget`] snapshot from whatever state has been set so far and can be
//! called any number of times.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::candlestick::CandlestickSettings;
use super::config::ChartWidgetsConfig;
use super::pipeline::TransformOptions;
use super::series_transform::{SeriesFields, SeriesUpdate, ShapeSettings, shape_series};
use crate::core::{
    ChartKind, DisplayLocale, EventBindings, FilterBy, SharedWidget, ValueFormatter, Widget,
    WidgetConfig, WidgetHeader, WidgetPosition,
};
use crate::error::{WidgetError, WidgetResult};
use crate::interaction::{
    FallbackHook, FilterChangeCallback, OverlayLayout, TimeRangeCallback,
    TimeRangeOverlayController,
};
use crate::render::ChartEventKind;

/// Builds one chart widget of a given [`ChartKind`].
pub struct ChartWidgetBuilder {
    pub(super) kind: ChartKind,
    id: String,
    position: WidgetPosition,
    header: Option<WidgetHeader>,
    height: Option<f64>,
    pub(super) chart_options: Value,
    pub(super) series_options: Value,
    pub(super) extra_series: Vec<Value>,
    pub(super) data: Value,
    explicit_categories: Option<Vec<String>>,
    update: Option<SeriesUpdate>,
    pub(super) shape: ShapeSettings,
    pub(super) candlestick: CandlestickSettings,
    custom_filters: IndexMap<String, Value>,
    filter_column: Option<String>,
    filter_by: Option<FilterBy>,
    accessor: Option<String>,
    skip_default_filtering: bool,
    pub(super) value_formatter: Option<ValueFormatter>,
    pub(super) events: EventBindings,
    pub(super) filter_change_callback: Option<FilterChangeCallback>,
    pub(super) time_range_callback: Option<TimeRangeCallback>,
    pub(super) fallback_hook: Option<FallbackHook>,
    overlay_layout: OverlayLayout,
    pub(super) locale: DisplayLocale,
}

impl ChartWidgetBuilder {
    #[must_use]
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            id: Uuid::new_v4().to_string(),
            position: WidgetPosition::default(),
            header: None,
            height: None,
            chart_options: kind.default_options(),
            series_options: kind.default_series(),
            extra_series: Vec::new(),
            data: Value::Null,
            explicit_categories: None,
            update: None,
            shape: ShapeSettings::default(),
            candlestick: CandlestickSettings::default(),
            custom_filters: IndexMap::new(),
            filter_column: None,
            filter_by: None,
            accessor: None,
            skip_default_filtering: false,
            value_formatter: None,
            events: EventBindings::default(),
            filter_change_callback: None,
            time_range_callback: None,
            fallback_hook: None,
            overlay_layout: OverlayLayout::default(),
            locale: DisplayLocale::default(),
        }
    }

    /// Starts a builder that takes overlay geometry and locale from `config`.
    #[must_use]
    pub fn with_config(kind: ChartKind, config: &ChartWidgetsConfig) -> Self {
        let mut builder = Self::new(kind);
        builder.overlay_layout = config.overlay;
        builder.locale = config.locale;
        builder
    }

    #[must_use]
    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Stores `data` as the widget payload and, verbatim, as the primary
    /// series data. Any earlier transform result is discarded.
    #[must_use]
    pub fn set_data(mut self, data: Value) -> Self {
        self.data = data;
        self.update = None;
        self
    }

    #[must_use]
    pub fn set_position(mut self, position: WidgetPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn set_header(mut self, title: impl Into<String>, options: Vec<String>) -> Self {
        self.header = Some(WidgetHeader {
            title: title.into(),
            options,
        });
        self
    }

    /// Derives the pixel height from the row span of the current position.
    #[must_use]
    pub fn set_height_from_grid(mut self, cell_height: f64, margin: f64) -> Self {
        let rows = f64::from(self.position.rows.max(1));
        let computed = rows * cell_height + (rows - 1.0) * margin;
        self.height = Some(computed.max(rows * 50.0));
        self
    }

    /// Category labels to use when no transform produced any.
    #[must_use]
    pub fn set_categories(mut self, categories: Vec<String>) -> Self {
        self.explicit_categories = Some(categories);
        self
    }

    #[must_use]
    pub fn set_series_fields(mut self, fields: SeriesFields) -> Self {
        self.shape.fields = fields;
        self
    }

    /// Stacked kinds: show every stack as a share of its category total.
    #[must_use]
    pub fn set_normalized(mut self, normalized: bool) -> Self {
        self.shape.normalized = normalized;
        self
    }

    #[must_use]
    pub fn set_waterfall_colors(
        mut self,
        positive: impl Into<String>,
        negative: impl Into<String>,
        total: impl Into<String>,
    ) -> Self {
        self.shape.bars.positive_color = positive.into();
        self.shape.bars.negative_color = negative.into();
        self.shape.bars.total_color = total.into();
        self
    }

    #[must_use]
    pub fn set_waterfall_start_value(mut self, start: f64) -> Self {
        self.shape.bars.start_value = start;
        self
    }

    #[must_use]
    pub fn set_negative_bar_colors(
        mut self,
        positive: impl Into<String>,
        negative: impl Into<String>,
    ) -> Self {
        self.shape.bars.positive_color = positive.into();
        self.shape.bars.negative_color = negative.into();
        self
    }

    /// Options pre-filled with the sort direction this kind expects.
    #[must_use]
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions::default().with_sort_order(self.kind.default_sort_order())
    }

    /// Reshapes the stored records for this kind.
    ///
    /// Failures are logged and leave the previous series state untouched.
    #[must_use]
    pub fn transform_data(mut self, options: TransformOptions) -> Self {
        if let Err(err) = self.try_transform_data(&options) {
            match err {
                WidgetError::InvalidData(_) => {
                    warn!(widget_id = %self.id, chart_kind = %self.kind, error = %err, "transform skipped");
                }
                _ => {
                    error!(widget_id = %self.id, chart_kind = %self.kind, error = %err, "transform failed");
                }
            }
        }
        self
    }

    /// Same as [`Self::transform_data`] but hands the outcome back.
    ///
    /// Returns the number of values that had to be coerced to `0`.
    pub fn try_transform_data(&mut self, options: &TransformOptions) -> WidgetResult<usize> {
        let Value::Array(records) = &self.data else {
            return Err(WidgetError::InvalidData(
                "transform needs an array of records".to_owned(),
            ));
        };
        let update = shape_series(self.kind, records, options, &self.shape_settings())?;
        let coerced = update.coerced_values;
        if coerced > 0 {
            warn!(
                widget_id = %self.id,
                chart_kind = %self.kind,
                coerced_values = coerced,
                "non-numeric values were read as 0"
            );
        }
        debug!(widget_id = %self.id, chart_kind = %self.kind, records = records.len(), "data transformed");
        self.update = Some(update);
        Ok(coerced)
    }

    fn shape_settings(&self) -> ShapeSettings {
        let mut shape = self.shape.clone();
        if self.kind == ChartKind::Candlestick {
            shape.window = self
                .candlestick
                .window_end
                .map(|end| (self.candlestick.time_range.selected_range, end));
        }
        shape
    }

    /// Values coerced by the last successful transform.
    #[must_use]
    pub fn coerced_values(&self) -> usize {
        self.update.as_ref().map_or(0, |update| update.coerced_values)
    }

    #[must_use]
    pub fn chart_options(&self) -> &Value {
        &self.chart_options
    }

    #[must_use]
    pub fn series_options(&self) -> &Value {
        &self.series_options
    }

    #[must_use]
    pub fn locale(&self) -> DisplayLocale {
        self.locale
    }

    #[must_use]
    pub fn add_custom_filter(mut self, filter_type: impl Into<String>, config: Value) -> Self {
        self.custom_filters.insert(filter_type.into(), config);
        self
    }

    #[must_use]
    pub fn remove_custom_filter(mut self, filter_type: &str) -> Self {
        self.custom_filters.shift_remove(filter_type);
        self
    }

    #[must_use]
    pub fn custom_filter(&self, filter_type: &str) -> Option<&Value> {
        self.custom_filters.get(filter_type)
    }

    #[must_use]
    pub fn custom_filters(&self) -> &IndexMap<String, Value> {
        &self.custom_filters
    }

    #[must_use]
    pub fn set_filter_column(mut self, column: impl Into<String>, filter_by: FilterBy) -> Self {
        self.filter_column = Some(column.into());
        self.filter_by = Some(filter_by);
        self
    }

    #[must_use]
    pub fn set_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.accessor = Some(accessor.into());
        self
    }

    #[must_use]
    pub fn set_skip_default_filtering(mut self, skip: bool) -> Self {
        self.skip_default_filtering = skip;
        self
    }

    #[must_use]
    pub fn set_filter_change_callback(mut self, callback: FilterChangeCallback) -> Self {
        self.filter_change_callback = Some(callback);
        self
    }

    /// Host hook for time-range selections when no callback is registered.
    #[must_use]
    pub fn set_fallback_hook(mut self, hook: FallbackHook) -> Self {
        self.fallback_hook = Some(hook);
        self
    }

    #[must_use]
    pub fn set_overlay_layout(mut self, layout: OverlayLayout) -> Self {
        self.overlay_layout = layout;
        self
    }

    /// Assembles the widget from the current state.
    #[must_use]
    pub fn build(&self) -> Widget {
        let mut options = self.chart_options.clone();
        let series = self.assemble_series();
        let series_count = series.len();
        set_key(&mut options, "series", Value::Array(series));
        self.write_categories(&mut options);

        let mut widget = Widget::new(
            self.id.clone(),
            WidgetConfig {
                chart_kind: Some(self.kind),
                options: Value::Null,
                header: self.header.clone(),
                filter_column: self.filter_column.clone(),
                filter_by: self.filter_by,
                accessor: self.accessor.clone(),
                skip_default_filtering: self.skip_default_filtering,
                custom_filters: self.custom_filters.clone(),
                value_formatter: self.value_formatter.clone(),
                ..WidgetConfig::default()
            },
        );
        widget.position = self.position;
        widget.height = self.height;
        widget.data = self.data.clone();
        *widget.events_mut() = self.events.clone();

        if self.kind == ChartKind::Candlestick {
            self.apply_candlestick(&mut options);
            if let Some(controller) = self.overlay_controller() {
                set_key(&mut options, "graphic", controller.graphic_json());
                widget.time_range_filters = Some(self.candlestick.time_range.clone());
                let passthrough = widget.events().get(ChartEventKind::Click).cloned();
                let controller = match passthrough {
                    Some(handler) => controller.with_passthrough(handler),
                    None => controller,
                };
                widget
                    .events_mut()
                    .bind(ChartEventKind::Click, Rc::new(controller).into_handler());
            }
        }
        widget.config.options = options;

        debug!(
            widget_id = %self.id,
            chart_kind = %self.kind,
            series = series_count,
            events = widget.events().len(),
            "widget built"
        );
        widget
    }

    /// [`Self::build`] wrapped for sharing with the dispatcher and overlays.
    #[must_use]
    pub fn build_shared(&self) -> SharedWidget {
        self.build().into_shared()
    }

    fn overlay_controller(&self) -> Option<TimeRangeOverlayController> {
        let filters = &self.candlestick.time_range;
        if filters.ranges.is_empty() {
            return None;
        }
        let mut controller = TimeRangeOverlayController::new(
            self.id.clone(),
            filters.ranges.clone(),
            filters.selected_range,
            self.overlay_layout,
        );
        if let Some(callback) = &self.filter_change_callback {
            controller = controller.with_filter_change_callback(callback.clone());
        }
        if let Some(callback) = &self.time_range_callback {
            controller = controller.with_time_range_callback(callback.clone());
        }
        if let Some(hook) = &self.fallback_hook {
            controller = controller.with_fallback_hook(hook.clone());
        }
        Some(controller)
    }

    fn assemble_series(&self) -> Vec<Value> {
        let mut series = Vec::with_capacity(2 + self.extra_series.len());
        match &self.update {
            Some(update) if self.kind.is_stacked() => {
                if update.stacks.is_empty() {
                    series.push(self.series_options.clone());
                }
                let stack = if self.shape.normalized {
                    "percent"
                } else {
                    self.series_options
                        .get("stack")
                        .and_then(Value::as_str)
                        .unwrap_or("total")
                };
                for stack_series in &update.stacks {
                    let mut entry = self.series_options.clone();
                    set_key(&mut entry, "name", json!(stack_series.name));
                    set_key(&mut entry, "stack", json!(stack));
                    set_key(&mut entry, "data", json!(stack_series.data));
                    series.push(entry);
                }
            }
            Some(update) => {
                let mut primary = self.series_options.clone();
                set_key(&mut primary, "data", update.primary_data.clone());
                if let Some(links) = &update.links {
                    set_key(&mut primary, "links", links.clone());
                }
                series.push(primary);
            }
            None => {
                let mut primary = self.series_options.clone();
                match &self.data {
                    Value::Array(_) => set_key(&mut primary, "data", self.data.clone()),
                    Value::Object(shaped) if self.kind == ChartKind::Sankey => {
                        let nodes = shaped.get("nodes").cloned().unwrap_or_else(|| json!([]));
                        let links = shaped.get("links").cloned().unwrap_or_else(|| json!([]));
                        set_key(&mut primary, "data", nodes);
                        set_key(&mut primary, "links", links);
                    }
                    _ => {}
                }
                series.push(primary);
            }
        }

        if self.kind == ChartKind::Candlestick {
            let overlays = self.candlestick_overlays(&series[0]);
            series.extend(overlays);
        }
        series.extend(self.extra_series.iter().cloned());
        series
    }

    fn write_categories(&self, options: &mut Value) {
        let categories = self
            .update
            .as_ref()
            .and_then(|update| update.categories.clone())
            .or_else(|| self.explicit_categories.clone());
        if let (Some(key), Some(categories)) = (self.kind.category_axis().key(), categories) {
            set_axis_data(options, key, &categories);
        }

        let Some(update) = &self.update else {
            return;
        };
        if let Some(y_categories) = &update.y_categories {
            set_axis_data(options, "yAxis", y_categories);
        }
        if let Some((min, max)) = update.visual_range {
            if let Some(visual_map) = options.get_mut("visualMap") {
                set_key(visual_map, "min", json!(min));
                set_key(visual_map, "max", json!(max));
            }
        }
    }

    pub(super) fn volume_data(&self) -> Value {
        self.update
            .as_ref()
            .and_then(|update| update.volumes.clone())
            .unwrap_or_else(|| json!([]))
    }

    pub(super) fn close_prices(&self, primary: &Value) -> Vec<Value> {
        if let Some(closes) = self.update.as_ref().and_then(|update| update.closes.as_ref()) {
            return closes.iter().map(|close| json!(close)).collect();
        }
        primary
            .get("data")
            .and_then(Value::as_array)
            .map(|candles| {
                candles
                    .iter()
                    .filter_map(|candle| candle.get(1).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn record_count(&self) -> usize {
        self.data.as_array().map_or(0, Vec::len)
    }
}

/// Inserts `key` into an object value, turning anything else into one.
pub(crate) fn set_key(target: &mut Value, key: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        map.insert(key.to_owned(), value);
    }
}

/// Shallow merge: top-level keys of `patch` overwrite those of `target`.
pub(crate) fn merge_object(target: &mut Value, patch: Value) {
    match patch {
        Value::Object(entries) => {
            for (key, value) in entries {
                set_key(target, &key, value);
            }
        }
        other => *target = other,
    }
}

/// Writes category labels into an axis, whether it is one object or a list.
pub(crate) fn set_axis_data(options: &mut Value, key: &str, categories: &[String]) {
    let data = json!(categories);
    match options.get_mut(key) {
        Some(Value::Array(axes)) => {
            for axis in axes
                .iter_mut()
                .filter(|axis| axis.get("type").and_then(Value::as_str) == Some("category"))
            {
                set_key(axis, "data", data.clone());
            }
        }
        Some(axis) => set_key(axis, "data", data),
        None => set_key(options, key, json!({"type": "category", "data": data})),
    }
}
