use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::events::{EventBindings, EventScope};
use super::filter::FilterBy;
use super::format::ValueFormatter;
use super::kind::ChartKind;
use super::time_range::TimeRangeFilters;
use crate::error::{WidgetError, WidgetResult};
use crate::render::{EngineEventHandler, SharedRenderHandle, WeakRenderHandle};

/// Component tag of chart widgets in the dashboard layout.
pub const ECHART_COMPONENT: &str = "echart";

/// Widget shared between the dashboard, the update dispatcher and overlay handlers.
pub type SharedWidget = Rc<RefCell<Widget>>;

/// Grid placement in layout cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: u32,
    pub y: u32,
    pub cols: u32,
    pub rows: u32,
}

impl WidgetPosition {
    #[must_use]
    pub const fn new(x: u32, y: u32, cols: u32, rows: u32) -> Self {
        Self { x, y, cols, rows }
    }
}

impl Default for WidgetPosition {
    fn default() -> Self {
        Self::new(0, 0, 1, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetHeader {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Chart configuration carried by a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_kind: Option<ChartKind>,
    #[serde(default)]
    pub options: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<WidgetHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<FilterBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessor: Option<String>,
    #[serde(default)]
    pub skip_default_filtering: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom_filters: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_formatter: Option<ValueFormatter>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            component: ECHART_COMPONENT.to_owned(),
            chart_kind: None,
            options: Value::Object(serde_json::Map::new()),
            header: None,
            filter_column: None,
            filter_by: None,
            accessor: None,
            skip_default_filtering: false,
            custom_filters: IndexMap::new(),
            value_formatter: None,
        }
    }
}

/// Dashboard widget wrapping one chart configuration.
///
/// The render handle belongs to the engine; the widget only keeps a weak
/// reference and treats a dead one as "not ready".
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    id: String,
    pub position: WidgetPosition,
    pub config: WidgetConfig,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range_filters: Option<TimeRangeFilters>,
    #[serde(skip)]
    events: EventBindings,
    #[serde(skip)]
    render_handle: Option<WeakRenderHandle>,
}

impl Widget {
    #[must_use]
    pub fn new(id: impl Into<String>, config: WidgetConfig) -> Self {
        Self {
            id: id.into(),
            position: WidgetPosition::default(),
            config,
            data: Value::Null,
            height: None,
            time_range_filters: None,
            events: EventBindings::default(),
            render_handle: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn events(&self) -> &EventBindings {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBindings {
        &mut self.events
    }

    #[must_use]
    pub fn into_shared(self) -> SharedWidget {
        Rc::new(RefCell::new(self))
    }

    /// Live render handle, or `None` while the engine has not created it
    /// (or has already dropped it).
    #[must_use]
    pub fn render_handle(&self) -> Option<SharedRenderHandle> {
        self.render_handle.as_ref().and_then(|weak| weak.upgrade())
    }

    #[must_use]
    pub fn is_render_ready(&self) -> bool {
        self.render_handle().is_some()
    }

    #[must_use]
    pub fn weak_render_handle(&self) -> Option<WeakRenderHandle> {
        self.render_handle.clone()
    }

    pub fn detach_render_handle(&mut self) {
        self.render_handle = None;
    }

    /// Primary series `type`, if the options carry one.
    #[must_use]
    pub fn primary_series_type(&self) -> Option<&str> {
        self.config
            .options
            .get("series")
            .and_then(|series| series.get(0))
            .and_then(|first| first.get("type"))
            .and_then(Value::as_str)
    }

    /// Resolves the chart kind from the config, falling back to the
    /// primary series type for widgets assembled by hand.
    #[must_use]
    pub fn chart_kind(&self) -> Option<ChartKind> {
        self.config
            .chart_kind
            .or_else(|| self.primary_series_type().and_then(ChartKind::from_series_type))
    }

    #[must_use]
    pub fn is_chart_kind(&self, kind: ChartKind) -> bool {
        self.config.component == ECHART_COMPONENT && self.chart_kind() == Some(kind)
    }

    #[must_use]
    pub fn header_title(&self) -> Option<&str> {
        self.config.header.as_ref().map(|header| header.title.as_str())
    }

    /// Pixel height for a layout of `cell_height` rows separated by `margin`,
    /// never below 50px per row.
    pub fn set_height_from_grid(&mut self, cell_height: f64, margin: f64) {
        let rows = f64::from(self.position.rows.max(1));
        let computed = rows * cell_height + (rows - 1.0) * margin;
        self.height = Some(computed.max(rows * 50.0));
    }

    pub fn to_json_pretty(&self) -> WidgetResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WidgetError::InvalidData(format!("failed to serialize widget: {e}")))
    }

    pub fn from_json_str(input: &str) -> WidgetResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| WidgetError::InvalidData(format!("failed to parse widget json: {e}")))
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("config", &self.config)
            .field("data", &self.data)
            .field("height", &self.height)
            .field("time_range_filters", &self.time_range_filters)
            .field("events", &self.events)
            .field("render_ready", &self.is_render_ready())
            .finish()
    }
}

/// Connects a widget to the render handle the engine just created.
///
/// Each bound event is first deregistered on the handle and then attached
/// again, so repeated attachment never stacks listeners. When the widget
/// already carries data the current options are pushed with `replace`.
pub fn attach_render_handle(widget: &SharedWidget, handle: &SharedRenderHandle) -> WidgetResult<()> {
    let weak = Rc::downgrade(handle);
    let (widget_id, bindings, push) = {
        let mut guard = widget.borrow_mut();
        guard.render_handle = Some(weak.clone());
        let push = (!guard.data.is_null()).then(|| guard.config.options.clone());
        (guard.id.clone(), guard.events.clone(), push)
    };

    {
        let mut engine = handle.borrow_mut();
        for (kind, handler) in bindings.iter() {
            engine.off(kind);
            let scope = EventScope::new(widget_id.clone(), weak.clone(), Rc::downgrade(widget));
            let handler = handler.clone();
            let wrapped: EngineEventHandler = Rc::new(move |params| handler(params, &scope));
            engine.on(kind, wrapped);
        }
    }
    debug!(widget_id = %widget_id, bound_events = bindings.len(), "render handle attached");

    if let Some(options) = push {
        if let Err(err) = handle.borrow_mut().set_option(&options, true) {
            warn!(widget_id = %widget_id, error = %err, "initial option push failed");
            return Err(err);
        }
    }
    Ok(())
}
