use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WidgetError;

/// Chart families a widget can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Area,
    Bar,
    Candlestick,
    Gauge,
    Heatmap,
    HorizontalBar,
    Line,
    NegativeBar,
    Pie,
    Polar,
    Sankey,
    Scatter,
    StackedArea,
    StackedHorizontalBar,
    StackedVerticalBar,
    Sunburst,
    Treemap,
    Waterfall,
}

impl ChartKind {
    pub const ALL: [Self; 18] = [
        Self::Area,
        Self::Bar,
        Self::Candlestick,
        Self::Gauge,
        Self::Heatmap,
        Self::HorizontalBar,
        Self::Line,
        Self::NegativeBar,
        Self::Pie,
        Self::Polar,
        Self::Sankey,
        Self::Scatter,
        Self::StackedArea,
        Self::StackedHorizontalBar,
        Self::StackedVerticalBar,
        Self::Sunburst,
        Self::Treemap,
        Self::Waterfall,
    ];

    /// Engine series `type` written to the primary series.
    #[must_use]
    pub const fn series_type(self) -> &'static str {
        match self {
            Self::Area | Self::Line | Self::StackedArea | Self::Polar => "line",
            Self::Bar
            | Self::HorizontalBar
            | Self::NegativeBar
            | Self::StackedHorizontalBar
            | Self::StackedVerticalBar
            | Self::Waterfall => "bar",
            Self::Candlestick => "candlestick",
            Self::Gauge => "gauge",
            Self::Heatmap => "heatmap",
            Self::Pie => "pie",
            Self::Sankey => "sankey",
            Self::Scatter => "scatter",
            Self::Sunburst => "sunburst",
            Self::Treemap => "treemap",
        }
    }

    /// Human readable name used in default sheet names and logs.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Area => "Area",
            Self::Bar => "Bar",
            Self::Candlestick => "Candlestick",
            Self::Gauge => "Gauge",
            Self::Heatmap => "Heatmap",
            Self::HorizontalBar => "Horizontal Bar",
            Self::Line => "Line",
            Self::NegativeBar => "Negative Bar",
            Self::Pie => "Pie",
            Self::Polar => "Polar",
            Self::Sankey => "Sankey",
            Self::Scatter => "Scatter",
            Self::StackedArea => "Stacked Area",
            Self::StackedHorizontalBar => "Stacked Horizontal Bar",
            Self::StackedVerticalBar => "Stacked Vertical Bar",
            Self::Sunburst => "Sunburst",
            Self::Treemap => "Treemap",
            Self::Waterfall => "Waterfall",
        }
    }

    /// Best guess from a bare series `type`, for widgets built elsewhere.
    #[must_use]
    pub fn from_series_type(series_type: &str) -> Option<Self> {
        match series_type {
            "line" => Some(Self::Line),
            "bar" => Some(Self::Bar),
            "candlestick" => Some(Self::Candlestick),
            "gauge" => Some(Self::Gauge),
            "heatmap" => Some(Self::Heatmap),
            "pie" => Some(Self::Pie),
            "sankey" => Some(Self::Sankey),
            "scatter" | "effectScatter" => Some(Self::Scatter),
            "sunburst" => Some(Self::Sunburst),
            "treemap" => Some(Self::Treemap),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_stacked(self) -> bool {
        matches!(
            self,
            Self::StackedArea | Self::StackedHorizontalBar | Self::StackedVerticalBar
        )
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ChartKind {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.display_name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .eq(normalized.chars())
            })
            .ok_or_else(|| WidgetError::InvalidData(format!("unknown chart kind `{s}`")))
    }
}
