//! Chart-level and series-level option setters.
//!
//! Chart-level setters shallow-merge into the option tree; series-level
//! helpers edit the primary series template that `build` copies into every
//! generated series.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::builder::{ChartWidgetBuilder, merge_object, set_key};
use crate::core::{ChartKind, DisplayLocale, ValueFormatter};

/// Named color sets shipped with the builders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Palette {
    #[default]
    Business,
    Finance,
    Modern,
    Pastel,
    Dark,
}

impl Palette {
    #[must_use]
    pub const fn colors(self) -> [&'static str; 9] {
        match self {
            Self::Business => [
                "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452",
                "#9a60b4", "#ea7ccc",
            ],
            Self::Finance => [
                "#2E8B57", "#4682B4", "#DAA520", "#DC143C", "#9370DB", "#20B2AA", "#FF6347",
                "#4169E1", "#32CD32",
            ],
            Self::Modern => [
                "#667eea", "#764ba2", "#f093fb", "#f5576c", "#4facfe", "#00f2fe", "#43e97b",
                "#38f9d7", "#ffecd2",
            ],
            Self::Pastel => [
                "#FFB6C1", "#87CEEB", "#98FB98", "#F0E68C", "#DDA0DD", "#F5DEB3", "#FFE4E1",
                "#E0FFFF", "#FAFAD2",
            ],
            Self::Dark => [
                "#2c3e50", "#34495e", "#7f8c8d", "#95a5a6", "#bdc3c7", "#ecf0f1", "#f39c12",
                "#e67e22", "#e74c3c",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GradientDirection {
    #[default]
    Vertical,
    Horizontal,
}

impl ChartWidgetBuilder {
    #[must_use]
    pub fn set_title(mut self, text: impl Into<String>, subtext: Option<&str>) -> Self {
        let mut title = json!({
            "text": text.into(),
            "left": "center",
            "top": "10",
            "textStyle": {"fontSize": 16, "color": "#333"},
        });
        if let Some(subtext) = subtext {
            set_key(&mut title, "subtext", json!(subtext));
        }
        set_key(&mut self.chart_options, "title", title);
        self
    }

    #[must_use]
    pub fn set_title_options(self, title: Value) -> Self {
        self.merge_component("title", title)
    }

    /// Sets the trigger and a string template formatter (`{b}: {c}` when `None`).
    #[must_use]
    pub fn set_tooltip(self, trigger: &str, formatter: Option<&str>) -> Self {
        self.merge_component(
            "tooltip",
            json!({"trigger": trigger, "formatter": formatter.unwrap_or("{b}: {c}")}),
        )
    }

    #[must_use]
    pub fn set_tooltip_options(self, tooltip: Value) -> Self {
        self.merge_component("tooltip", tooltip)
    }

    /// `position` is `left`, `right` or anything else for centered.
    #[must_use]
    pub fn set_legend(mut self, orient: &str, position: &str) -> Self {
        let left = match position {
            "left" | "right" => position,
            _ => "center",
        };
        let mut legend = json!({"show": true, "orient": orient, "left": left});
        if orient == "horizontal" {
            set_key(&mut legend, "top", json!("bottom"));
            set_key(&mut legend, "bottom", json!("10"));
        } else {
            set_key(&mut legend, "top", json!("middle"));
        }
        set_key(&mut self.chart_options, "legend", legend);
        self
    }

    #[must_use]
    pub fn set_legend_options(self, legend: Value) -> Self {
        self.merge_component("legend", legend)
    }

    #[must_use]
    pub fn set_show_legend(self, show: bool) -> Self {
        if self.kind == ChartKind::Candlestick {
            return self.enable_legend(show);
        }
        self.merge_component("legend", json!({"show": show}))
    }

    #[must_use]
    pub fn set_grid(self, grid: Value) -> Self {
        self.merge_component("grid", grid)
    }

    /// Replaces the x axis; category labels are still written at build time.
    #[must_use]
    pub fn set_x_axis(mut self, axis: Value) -> Self {
        set_key(&mut self.chart_options, "xAxis", axis);
        self
    }

    #[must_use]
    pub fn set_y_axis(mut self, axis: Value) -> Self {
        set_key(&mut self.chart_options, "yAxis", axis);
        self
    }

    /// Replaces the series appended after the generated ones.
    #[must_use]
    pub fn set_series(mut self, series: Vec<Value>) -> Self {
        self.extra_series = series;
        self
    }

    #[must_use]
    pub fn add_series(mut self, series: Value) -> Self {
        self.extra_series.push(series);
        self
    }

    /// `true`/`false` or a full animation object.
    #[must_use]
    pub fn set_animation(mut self, animation: Value) -> Self {
        set_key(&mut self.chart_options, "animation", animation);
        self
    }

    #[must_use]
    pub fn set_background_color(mut self, color: impl Into<String>) -> Self {
        set_key(&mut self.chart_options, "backgroundColor", json!(color.into()));
        self
    }

    /// Merges arbitrary top-level options, later keys winning.
    #[must_use]
    pub fn set_custom_options(mut self, options: Value) -> Self {
        merge_object(&mut self.chart_options, options);
        self
    }

    /// Merges arbitrary keys into the primary series template.
    #[must_use]
    pub fn set_series_options(mut self, series: Value) -> Self {
        merge_object(&mut self.series_options, series);
        self
    }

    #[must_use]
    pub fn set_label_formatter(self, formatter: &str) -> Self {
        self.merge_series_component("label", json!({"formatter": formatter}))
    }

    #[must_use]
    pub fn set_label_show(self, show: bool) -> Self {
        self.merge_series_component("label", json!({"show": show}))
    }

    #[must_use]
    pub fn set_label_position(self, position: &str) -> Self {
        self.merge_series_component("label", json!({"position": position}))
    }

    /// Pie charts take the list on the series, every other kind on `itemStyle`.
    #[must_use]
    pub fn set_colors<S: AsRef<str>>(mut self, colors: &[S]) -> Self {
        let colors: Vec<&str> = colors.iter().map(AsRef::as_ref).collect();
        if self.kind == ChartKind::Pie {
            set_key(&mut self.series_options, "color", json!(colors));
            self
        } else {
            self.merge_series_component("itemStyle", json!({"color": colors}))
        }
    }

    #[must_use]
    pub fn set_border_radius(self, radius: f64) -> Self {
        self.merge_series_component("itemStyle", json!({"borderRadius": radius}))
    }

    #[must_use]
    pub fn set_border(self, color: &str, width: f64) -> Self {
        self.merge_series_component("itemStyle", json!({"borderColor": color, "borderWidth": width}))
    }

    #[must_use]
    pub fn set_emphasis(mut self, shadow_blur: f64, shadow_offset_x: f64, shadow_color: &str) -> Self {
        set_key(
            &mut self.series_options,
            "emphasis",
            json!({"itemStyle": {
                "shadowBlur": shadow_blur,
                "shadowOffsetX": shadow_offset_x,
                "shadowColor": shadow_color,
            }}),
        );
        self
    }

    #[must_use]
    pub fn set_gradient_colors(self, start: &str, end: &str, direction: GradientDirection) -> Self {
        let (y, x2, y2) = match direction {
            GradientDirection::Vertical => (0, 0, 1),
            GradientDirection::Horizontal => (1, 1, 0),
        };
        let gradient = json!({
            "type": "linear",
            "x": 0,
            "y": y,
            "x2": x2,
            "y2": y2,
            "colorStops": [{"offset": 0, "color": start}, {"offset": 1, "color": end}],
        });
        self.merge_series_component("itemStyle", json!({"color": gradient}))
    }

    /// Candlesticks use the first two colors for rising and falling candles.
    #[must_use]
    pub fn set_predefined_palette(self, palette: Palette) -> Self {
        let colors = palette.colors();
        if self.kind == ChartKind::Candlestick {
            self.set_candle_colors(colors[0], colors[1])
        } else {
            self.set_colors(colors.as_slice())
        }
    }

    #[must_use]
    pub fn set_locale(mut self, locale: DisplayLocale) -> Self {
        self.locale = locale;
        self
    }

    /// Currency tooltip formatter in the builder locale.
    #[must_use]
    pub fn set_currency_formatter(self, currency: &str) -> Self {
        let locale = self.locale;
        self.set_value_formatter(ValueFormatter::currency(currency, locale))
    }

    #[must_use]
    pub fn set_percentage_formatter(self, decimals: u32) -> Self {
        self.set_value_formatter(ValueFormatter::percentage(decimals))
    }

    #[must_use]
    pub fn set_number_formatter(self, decimals: u32) -> Self {
        let locale = self.locale;
        self.set_value_formatter(ValueFormatter::number(decimals, locale))
    }

    /// Installs the formatter descriptor as tooltip formatter and keeps the
    /// formatter on the widget. The current trigger is preserved.
    #[must_use]
    pub fn set_value_formatter(mut self, formatter: ValueFormatter) -> Self {
        let trigger = self
            .chart_options
            .get("tooltip")
            .and_then(|tooltip| tooltip.get("trigger"))
            .and_then(Value::as_str)
            .unwrap_or("item")
            .to_owned();
        let descriptor = formatter.descriptor();
        self.value_formatter = Some(formatter);
        self.merge_component("tooltip", json!({"trigger": trigger, "formatter": descriptor}))
    }

    fn merge_component(mut self, key: &str, patch: Value) -> Self {
        let mut component = self
            .chart_options
            .get(key)
            .filter(|current| current.is_object())
            .cloned()
            .unwrap_or_else(|| json!({}));
        merge_object(&mut component, patch);
        set_key(&mut self.chart_options, key, component);
        self
    }

    fn merge_series_component(mut self, key: &str, patch: Value) -> Self {
        let mut component = self
            .series_options
            .get(key)
            .filter(|current| current.is_object())
            .cloned()
            .unwrap_or_else(|| json!({}));
        merge_object(&mut component, patch);
        set_key(&mut self.series_options, key, component);
        self
    }
}
