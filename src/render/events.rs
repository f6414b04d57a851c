use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WidgetError, WidgetResult};

/// Native engine events a widget can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartEventKind {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseOver,
    MouseOut,
    MouseMove,
}

impl ChartEventKind {
    pub const ALL: [Self; 7] = [
        Self::Click,
        Self::DblClick,
        Self::MouseDown,
        Self::MouseUp,
        Self::MouseOver,
        Self::MouseOut,
        Self::MouseMove,
    ];

    /// Engine-side event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::MouseMove => "mousemove",
        }
    }
}

impl fmt::Display for ChartEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload the engine passes to event listeners.
///
/// Only the fields the widget layer routes on are typed; the full payload
/// stays available in `data` and `value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartEventParams {
    pub component_type: String,
    pub component_index: Option<usize>,
    pub series_type: Option<String>,
    pub series_name: Option<String>,
    pub series_index: Option<usize>,
    pub data_index: Option<usize>,
    pub name: Option<String>,
    pub value: Value,
    pub data: Value,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
}

impl ChartEventParams {
    /// Click on the overlay primitive at `index` of the rendered graphic list.
    #[must_use]
    pub fn graphic(index: usize) -> Self {
        Self {
            component_type: "graphic".to_owned(),
            component_index: Some(index),
            ..Self::default()
        }
    }

    /// Click on a series data item.
    #[must_use]
    pub fn series_item(series_type: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self {
            component_type: "series".to_owned(),
            series_type: Some(series_type.into()),
            name: Some(name.into()),
            value,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset_x = Some(x);
        self.offset_y = Some(y);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Parses a raw engine payload.
    pub fn from_value(payload: Value) -> WidgetResult<Self> {
        serde_json::from_value(payload)
            .map_err(|e| WidgetError::InvalidData(format!("malformed chart event payload: {e}")))
    }

    #[must_use]
    pub fn is_graphic(&self) -> bool {
        self.component_type == "graphic"
    }

    #[must_use]
    pub fn offset(&self) -> Option<(f64, f64)> {
        self.offset_x.zip(self.offset_y)
    }
}

/// Whether a listener consumed the event.
///
/// `Handled` maps to the engine's "prevent default" return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Handled,
    PassThrough,
}

impl EventFlow {
    #[must_use]
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

pub type EngineEventHandler = Rc<dyn Fn(&ChartEventParams) -> EventFlow>;
