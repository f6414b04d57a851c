//! Candlestick extras: volume and close-price overlays, chart toggles and the
//! time-range strip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::builder::{ChartWidgetBuilder, set_key};
use crate::core::{TimeRange, TimeRangeFilters};
use crate::interaction::TimeRangeCallback;

const VOLUME_SERIES: &str = "Volume";
const AREA_SERIES: &str = "Close Price Area";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandlestickSettings {
    pub show_volume: bool,
    pub show_area: bool,
    pub area_opacity: f64,
    pub show_legend: bool,
    pub show_data_zoom: bool,
    pub brush: bool,
    /// Record count from which progressive rendering is switched on.
    pub large_mode_threshold: Option<usize>,
    /// Empty `ranges` disables the strip.
    pub time_range: TimeRangeFilters,
    /// Last day of the window the selected range is applied to.
    #[serde(skip)]
    pub window_end: Option<NaiveDate>,
}

impl Default for CandlestickSettings {
    fn default() -> Self {
        Self {
            show_volume: true,
            show_area: true,
            area_opacity: 0.3,
            show_legend: true,
            show_data_zoom: true,
            brush: false,
            large_mode_threshold: None,
            time_range: TimeRangeFilters::default(),
            window_end: None,
        }
    }
}

impl ChartWidgetBuilder {
    #[must_use]
    pub fn enable_volume(mut self, enabled: bool) -> Self {
        self.candlestick.show_volume = enabled;
        self
    }

    #[must_use]
    pub fn enable_area_series(mut self, enabled: bool, opacity: f64) -> Self {
        self.candlestick.show_area = enabled;
        self.candlestick.area_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn enable_legend(mut self, enabled: bool) -> Self {
        self.candlestick.show_legend = enabled;
        self
    }

    #[must_use]
    pub fn enable_data_zoom(mut self, enabled: bool) -> Self {
        self.candlestick.show_data_zoom = enabled;
        self
    }

    #[must_use]
    pub fn enable_brush(mut self) -> Self {
        self.candlestick.brush = true;
        self
    }

    /// Switches on progressive rendering once the payload has `threshold` rows.
    #[must_use]
    pub fn set_large_mode(mut self, threshold: usize) -> Self {
        self.candlestick.large_mode_threshold = Some(threshold);
        self
    }

    /// Up and down candle colors (fill and border).
    #[must_use]
    pub fn set_candle_colors(mut self, up: impl Into<String>, down: impl Into<String>) -> Self {
        let (up, down) = (up.into(), down.into());
        let mut style = self.series_options.get("itemStyle").cloned().unwrap_or_else(|| json!({}));
        set_key(&mut style, "color", json!(up));
        set_key(&mut style, "color0", json!(down));
        set_key(&mut style, "borderColor", json!(up));
        set_key(&mut style, "borderColor0", json!(down));
        set_key(&mut self.series_options, "itemStyle", style);
        self
    }

    /// Offers `ranges` in the strip with `selected` highlighted.
    ///
    /// A selection outside `ranges` falls back to the first offered range.
    #[must_use]
    pub fn enable_time_range_filters(mut self, ranges: Vec<TimeRange>, selected: TimeRange) -> Self {
        let selected = if ranges.contains(&selected) {
            selected
        } else {
            ranges.first().copied().unwrap_or(selected)
        };
        self.candlestick.time_range = TimeRangeFilters {
            ranges,
            selected_range: selected,
        };
        self
    }

    #[must_use]
    pub fn disable_time_range_filters(mut self) -> Self {
        self.candlestick.time_range.ranges.clear();
        self
    }

    #[must_use]
    pub fn set_selected_time_range(mut self, range: TimeRange) -> Self {
        self.candlestick.time_range.selected_range = range;
        self
    }

    #[must_use]
    pub fn set_time_range_callback(mut self, callback: TimeRangeCallback) -> Self {
        self.time_range_callback = Some(callback);
        self
    }

    /// Restricts transformed rows to the selected range ending at `end`.
    #[must_use]
    pub fn set_time_window_end(mut self, end: NaiveDate) -> Self {
        self.candlestick.window_end = Some(end);
        self
    }

    #[must_use]
    pub fn candlestick_settings(&self) -> &CandlestickSettings {
        &self.candlestick
    }

    pub(super) fn candlestick_overlays(&self, primary: &Value) -> Vec<Value> {
        let mut overlays = Vec::with_capacity(2);
        if self.candlestick.show_volume {
            overlays.push(json!({
                "name": VOLUME_SERIES,
                "type": "bar",
                "xAxisIndex": 1,
                "yAxisIndex": 1,
                "data": self.volume_data(),
                "itemStyle": {"color": "#7fbe9e", "color0": "#d87a80", "opacity": 0.8},
            }));
        }
        if self.candlestick.show_area {
            overlays.push(json!({
                "name": AREA_SERIES,
                "type": "line",
                "data": self.close_prices(primary),
                "smooth": true,
                "symbol": "none",
                "lineStyle": {"width": 1, "color": "#1976d2"},
                "areaStyle": {"color": "#e3f2fd", "opacity": self.candlestick.area_opacity},
                "z": 1,
                "xAxisIndex": 0,
                "yAxisIndex": 0,
            }));
        }
        overlays
    }

    /// Applies the toggles to the merged chart options.
    pub(super) fn apply_candlestick(&self, options: &mut Value) {
        let settings = &self.candlestick;
        let Value::Object(map) = options else {
            return;
        };

        if !settings.show_volume {
            for key in ["grid", "xAxis", "yAxis"] {
                let first = match map.get(key) {
                    Some(Value::Array(items)) => items.first().cloned(),
                    _ => None,
                };
                if let Some(first) = first {
                    map.insert(key.to_owned(), first);
                }
            }
            if let Some(Value::Array(zooms)) = map.get_mut("dataZoom") {
                for zoom in zooms.iter_mut() {
                    set_key(zoom, "xAxisIndex", json!([0]));
                }
            }
        }

        if settings.show_legend {
            let mut names = vec!["Candlestick"];
            if settings.show_volume {
                names.push(VOLUME_SERIES);
            }
            if settings.show_area {
                names.push(AREA_SERIES);
            }
            let legend = map.entry("legend").or_insert_with(|| json!({"show": true}));
            set_key(legend, "data", json!(names));
        } else {
            map.remove("legend");
        }

        if !settings.show_data_zoom {
            map.remove("dataZoom");
        }

        if settings.brush {
            map.insert(
                "brush".to_owned(),
                json!({
                    "xAxisIndex": 0,
                    "brushLink": "all",
                    "outOfBrush": {"colorAlpha": 0.1},
                    "brushStyle": {
                        "borderWidth": 1,
                        "color": "rgba(120,140,180,0.3)",
                        "borderColor": "rgba(120,140,180,0.8)",
                    },
                }),
            );
        }

        if let Some(threshold) = settings.large_mode_threshold {
            if self.record_count() >= threshold {
                map.insert("useUTC".to_owned(), json!(true));
                map.insert("animation".to_owned(), json!(false));
                map.insert("progressive".to_owned(), json!(500));
                map.insert("progressiveThreshold".to_owned(), json!(3000));
            }
        }
    }
}
