//! Per-kind defaults: starting option tree, primary series and the axis
//! that receives category labels.

use serde_json::{Value, json};

use super::pipeline::SortOrder;
use crate::core::ChartKind;

/// Axis (or component) that receives the category labels of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryAxis {
    X,
    Y,
    None,
}

impl CategoryAxis {
    #[must_use]
    pub const fn key(self) -> Option<&'static str> {
        match self {
            Self::X => Some("xAxis"),
            Self::Y => Some("yAxis"),
            Self::None => None,
        }
    }
}

const EMPHASIS_SHADOW: &str = "rgba(0, 0, 0, 0.5)";

impl ChartKind {
    /// Chart-level option tree a fresh builder starts from.
    #[must_use]
    pub fn default_options(self) -> Value {
        let grid = json!({"containLabel": true, "top": "15%", "left": "3%", "right": "4%", "bottom": "15%"});
        let legend = json!({"show": true, "orient": "horizontal", "left": "center", "top": "10"});
        match self {
            Self::Bar | Self::StackedVerticalBar | Self::Waterfall | Self::NegativeBar => json!({
                "grid": grid,
                "tooltip": {"trigger": "axis", "axisPointer": {"type": "shadow"}},
                "legend": legend,
                "xAxis": {"type": "category", "data": []},
                "yAxis": {"type": "value", "splitLine": {"show": true, "lineStyle": {"type": "dashed"}}},
            }),
            Self::HorizontalBar | Self::StackedHorizontalBar => json!({
                "grid": grid,
                "tooltip": {"trigger": "axis", "axisPointer": {"type": "shadow"}},
                "legend": legend,
                "xAxis": {"type": "value"},
                "yAxis": {"type": "category", "data": [], "axisTick": {"show": true, "alignWithLabel": true}},
            }),
            Self::Line | Self::Area | Self::StackedArea => json!({
                "grid": grid,
                "tooltip": {"trigger": "axis"},
                "legend": legend,
                "xAxis": {"type": "category", "boundaryGap": false, "data": []},
                "yAxis": {"type": "value"},
            }),
            Self::Pie => json!({
                "tooltip": {"trigger": "item", "formatter": "{a} <br/>{b}: {c} ({d}%)"},
                "legend": {"show": true, "orient": "vertical", "left": "left", "top": "middle"},
            }),
            Self::Scatter => json!({
                "grid": grid,
                "tooltip": {"trigger": "item"},
                "legend": legend,
                "xAxis": {"type": "value", "scale": true},
                "yAxis": {"type": "value", "scale": true},
            }),
            Self::Heatmap => json!({
                "grid": {"containLabel": true, "top": "10%", "left": "3%", "right": "4%", "bottom": "20%"},
                "tooltip": {"position": "top"},
                "xAxis": {"type": "category", "data": [], "splitArea": {"show": true}},
                "yAxis": {"type": "category", "data": [], "splitArea": {"show": true}},
                "visualMap": {"min": 0, "max": 10, "calculable": true, "orient": "horizontal", "left": "center", "bottom": "5%"},
            }),
            Self::Gauge => json!({
                "tooltip": {"formatter": "{a} <br/>{b} : {c}"},
            }),
            Self::Candlestick => json!({
                "tooltip": {"trigger": "axis", "axisPointer": {"type": "cross"}},
                "legend": {"show": true, "data": ["Candlestick"], "top": "10", "left": "center"},
                "grid": [
                    {"left": "10%", "right": "8%", "top": "15%", "height": "55%"},
                    {"left": "10%", "right": "8%", "top": "75%", "height": "15%"},
                ],
                "xAxis": [
                    {"type": "category", "data": [], "boundaryGap": false, "axisLine": {"onZero": false}, "splitLine": {"show": false}, "min": "dataMin", "max": "dataMax"},
                    {"type": "category", "gridIndex": 1, "data": [], "boundaryGap": false, "axisLabel": {"show": false}, "axisTick": {"show": false}},
                ],
                "yAxis": [
                    {"scale": true, "splitArea": {"show": true}},
                    {"scale": true, "gridIndex": 1, "splitNumber": 2, "axisLabel": {"show": false}, "splitLine": {"show": false}},
                ],
                "dataZoom": [
                    {"type": "inside", "xAxisIndex": [0, 1], "start": 50, "end": 100},
                    {"type": "slider", "xAxisIndex": [0, 1], "top": "92%", "start": 50, "end": 100},
                ],
            }),
            Self::Sankey => json!({
                "tooltip": {"trigger": "item", "triggerOn": "mousemove"},
            }),
            Self::Sunburst | Self::Treemap => json!({
                "tooltip": {"trigger": "item", "formatter": "{b}: {c}"},
            }),
            Self::Polar => json!({
                "tooltip": {"trigger": "item", "formatter": "{b}: {c}"},
                "legend": {"show": true, "orient": "horizontal", "left": "center", "bottom": "10"},
                "polar": {"center": ["50%", "50%"], "radius": ["30%", "80%"]},
                "angleAxis": {"type": "value", "startAngle": 0, "min": 0, "max": 100},
                "radiusAxis": {"type": "value", "min": 0, "max": 100},
            }),
        }
    }

    /// Primary series defaults, before `type` and `data` are filled in.
    #[must_use]
    pub fn default_series(self) -> Value {
        let emphasis = json!({"itemStyle": {"shadowBlur": 10, "shadowOffsetX": 0, "shadowColor": EMPHASIS_SHADOW}});
        let mut series = match self {
            Self::Bar | Self::HorizontalBar | Self::NegativeBar => json!({
                "name": format!("{} Chart", self.display_name()),
                "itemStyle": {"borderRadius": 2},
                "emphasis": emphasis,
            }),
            Self::StackedVerticalBar | Self::StackedHorizontalBar => json!({
                "name": format!("{} Chart", self.display_name()),
                "stack": "total",
                "itemStyle": {"borderRadius": 2},
                "emphasis": emphasis,
            }),
            Self::Waterfall => json!({
                "name": "Waterfall Chart",
                "label": {"show": true, "position": "top"},
                "emphasis": emphasis,
            }),
            Self::Line => json!({
                "name": "Line Chart",
                "smooth": false,
                "symbol": "circle",
                "symbolSize": 6,
                "lineStyle": {"width": 2},
            }),
            Self::Area => json!({
                "name": "Area Chart",
                "smooth": true,
                "symbol": "none",
                "areaStyle": {"opacity": 0.3},
                "lineStyle": {"width": 2},
            }),
            Self::StackedArea => json!({
                "name": "Stacked Area Chart",
                "stack": "Total",
                "smooth": true,
                "areaStyle": {"opacity": 0.6},
                "emphasis": {"focus": "series"},
            }),
            Self::Pie => json!({
                "name": "Pie Chart",
                "radius": ["40%", "70%"],
                "center": ["50%", "50%"],
                "label": {"show": true, "formatter": "{b}: {d}%"},
                "emphasis": emphasis,
            }),
            Self::Scatter => json!({
                "name": "Scatter Chart",
                "symbolSize": 8,
                "emphasis": emphasis,
            }),
            Self::Heatmap => json!({
                "name": "Heatmap Chart",
                "label": {"show": true},
                "emphasis": emphasis,
            }),
            Self::Gauge => json!({
                "name": "Gauge Chart",
                "min": 0,
                "max": 100,
                "progress": {"show": true, "width": 18},
                "detail": {"valueAnimation": true, "formatter": "{value}"},
            }),
            Self::Candlestick => json!({
                "name": "Candlestick",
                "itemStyle": {"color": "#ec0000", "color0": "#00da3c", "borderColor": "#8A0000", "borderColor0": "#008F28"},
            }),
            Self::Sankey => json!({
                "name": "Sankey Chart",
                "emphasis": {"focus": "adjacency"},
                "lineStyle": {"color": "gradient", "curveness": 0.5},
                "links": [],
            }),
            Self::Sunburst => json!({
                "name": "Sunburst Chart",
                "radius": [0, "90%"],
                "label": {"rotate": "radial"},
                "emphasis": {"focus": "ancestor"},
            }),
            Self::Treemap => json!({
                "name": "Treemap Chart",
                "roam": false,
                "breadcrumb": {"show": true},
                "label": {"show": true, "formatter": "{b}"},
            }),
            Self::Polar => json!({
                "name": "Polar Chart",
                "coordinateSystem": "polar",
                "symbol": "circle",
                "symbolSize": 6,
                "areaStyle": {"opacity": 0.3},
                "emphasis": {"focus": "series"},
            }),
        };
        if let Value::Object(map) = &mut series {
            map.insert("type".to_owned(), Value::String(self.series_type().to_owned()));
            map.insert("data".to_owned(), Value::Array(Vec::new()));
        }
        series
    }

    /// Sort direction used when a transform names a sort field but no order.
    #[must_use]
    pub const fn default_sort_order(self) -> SortOrder {
        match self {
            Self::Candlestick | Self::Scatter | Self::Line | Self::Area | Self::StackedArea => {
                SortOrder::Asc
            }
            _ => SortOrder::Desc,
        }
    }

    #[must_use]
    pub const fn category_axis(self) -> CategoryAxis {
        match self {
            Self::Bar
            | Self::Line
            | Self::Area
            | Self::StackedArea
            | Self::StackedVerticalBar
            | Self::Waterfall
            | Self::NegativeBar
            | Self::Candlestick
            | Self::Heatmap => CategoryAxis::X,
            Self::HorizontalBar | Self::StackedHorizontalBar => CategoryAxis::Y,
            Self::Pie
            | Self::Gauge
            | Self::Scatter
            | Self::Sankey
            | Self::Sunburst
            | Self::Treemap
            | Self::Polar => CategoryAxis::None,
        }
    }
}
