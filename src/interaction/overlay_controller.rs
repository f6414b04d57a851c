use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::time_range::{
    OverlayLayout, OverlayPrimitives, TIME_RANGE_FILTER_TYPE, hit_test, range_at, range_at_json,
    render_overlay,
};
use crate::core::{EventScope, FilterChangeEvent, FilterEventKind, TimeRange, WidgetEventHandler};
use crate::render::{ChartEventParams, EventFlow};

pub type FilterChangeCallback = Rc<dyn Fn(&FilterChangeEvent)>;
pub type TimeRangeCallback = Rc<dyn Fn(TimeRange)>;

/// Host-provided last resort for time-range selections nobody subscribed to.
pub type FallbackHook = Rc<dyn Fn(&FilterChangeEvent)>;

struct OverlayState {
    ranges: Vec<TimeRange>,
    selected: TimeRange,
    elements: OverlayPrimitives,
}

/// Owns the time-range strip of one candlestick widget and routes clicks on it.
pub struct TimeRangeOverlayController {
    widget_id: String,
    layout: OverlayLayout,
    state: RefCell<OverlayState>,
    on_filter_change: Option<FilterChangeCallback>,
    on_time_range: Option<TimeRangeCallback>,
    fallback: Option<FallbackHook>,
    passthrough: Option<WidgetEventHandler>,
}

impl TimeRangeOverlayController {
    #[must_use]
    pub fn new(
        widget_id: impl Into<String>,
        ranges: Vec<TimeRange>,
        selected: TimeRange,
        layout: OverlayLayout,
    ) -> Self {
        let elements = render_overlay(&ranges, selected, &layout);
        Self {
            widget_id: widget_id.into(),
            layout,
            state: RefCell::new(OverlayState {
                ranges,
                selected,
                elements,
            }),
            on_filter_change: None,
            on_time_range: None,
            fallback: None,
            passthrough: None,
        }
    }

    #[must_use]
    pub fn with_filter_change_callback(mut self, callback: FilterChangeCallback) -> Self {
        self.on_filter_change = Some(callback);
        self
    }

    #[must_use]
    pub fn with_time_range_callback(mut self, callback: TimeRangeCallback) -> Self {
        self.on_time_range = Some(callback);
        self
    }

    #[must_use]
    pub fn with_fallback_hook(mut self, hook: FallbackHook) -> Self {
        self.fallback = Some(hook);
        self
    }

    /// Handler that receives clicks outside the strip.
    #[must_use]
    pub fn with_passthrough(mut self, handler: WidgetEventHandler) -> Self {
        self.passthrough = Some(handler);
        self
    }

    #[must_use]
    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    #[must_use]
    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    #[must_use]
    pub fn selected(&self) -> TimeRange {
        self.state.borrow().selected
    }

    #[must_use]
    pub fn ranges(&self) -> Vec<TimeRange> {
        self.state.borrow().ranges.clone()
    }

    #[must_use]
    pub fn elements(&self) -> OverlayPrimitives {
        self.state.borrow().elements.clone()
    }

    /// The primitive list as the engine's `graphic` component.
    #[must_use]
    pub fn graphic_json(&self) -> Value {
        serde_json::to_value(self.state.borrow().elements.as_slice()).unwrap_or_else(|err| {
            warn!(widget_id = %self.widget_id, error = %err, "overlay serialization failed");
            Value::Array(Vec::new())
        })
    }

    /// Changes the selection and regenerates every primitive.
    ///
    /// Returns `false` when `range` is not offered by this strip.
    pub fn select(&self, range: TimeRange) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.ranges.contains(&range) {
            return false;
        }
        state.selected = range;
        state.elements = render_overlay(&state.ranges, range, &self.layout);
        true
    }

    /// Resolves the range a graphic click targets.
    ///
    /// The index is looked up in `live` (what the engine currently renders)
    /// and then in the cached list; clicks without an index are hit-tested.
    #[must_use]
    pub fn resolve(&self, params: &ChartEventParams, live: Option<&Value>) -> Option<TimeRange> {
        let state = self.state.borrow();
        match params.component_index {
            Some(index) => live
                .and_then(|graphic| range_at_json(graphic, index))
                .or_else(|| range_at(&state.elements, index)),
            None => params
                .offset()
                .and_then(|(x, y)| hit_test(&state.elements, x, y)),
        }
    }

    /// Click entry point bound on the render handle.
    pub fn handle_click(&self, params: &ChartEventParams, scope: &EventScope) -> EventFlow {
        if !params.is_graphic() {
            return match &self.passthrough {
                Some(handler) => handler(params, scope),
                None => EventFlow::PassThrough,
            };
        }

        let handle = scope.render_handle();
        let live = handle
            .as_ref()
            .and_then(|handle| handle.borrow().get_option())
            .and_then(|mut options| options.get_mut("graphic").map(Value::take));

        let Some(range) = self.resolve(params, live.as_ref()) else {
            warn!(
                widget_id = %self.widget_id,
                component_index = ?params.component_index,
                "graphic click did not resolve to a time range"
            );
            return EventFlow::Handled;
        };

        let previous = self.selected();
        if !self.select(range) {
            warn!(widget_id = %self.widget_id, range = %range, "clicked range is not offered");
            return EventFlow::Handled;
        }
        let graphic = self.graphic_json();

        if let Some(handle) = handle {
            if let Err(err) = handle
                .borrow_mut()
                .set_option(&json!({ "graphic": graphic.clone() }), false)
            {
                warn!(widget_id = %self.widget_id, error = %err, "overlay push failed");
            }
        }
        self.sync_widget(scope, range, graphic);
        debug!(widget_id = %self.widget_id, from = %previous, to = %range, "time range selected");

        self.notify(range);
        EventFlow::Handled
    }

    fn sync_widget(&self, scope: &EventScope, range: TimeRange, graphic: Value) {
        let Some(widget) = scope.widget() else {
            return;
        };
        let Ok(mut widget) = widget.try_borrow_mut() else {
            warn!(widget_id = %self.widget_id, "widget busy, overlay state not synced");
            return;
        };
        let filters = widget.time_range_filters.get_or_insert_with(Default::default);
        filters.selected_range = range;
        if let Value::Object(options) = &mut widget.config.options {
            options.insert("graphic".to_owned(), graphic);
        }
    }

    fn notify(&self, range: TimeRange) {
        if let Some(callback) = &self.on_filter_change {
            let event = FilterChangeEvent::new(
                FilterEventKind::CustomFilter,
                TIME_RANGE_FILTER_TYPE,
                json!(range.label()),
                self.widget_id.clone(),
            );
            callback(&event);
        }
        if let Some(callback) = &self.on_time_range {
            callback(range);
        }
        if self.on_filter_change.is_none() && self.on_time_range.is_none() {
            if let Some(hook) = &self.fallback {
                let event = FilterChangeEvent::new(
                    FilterEventKind::TimeRangeChange,
                    TIME_RANGE_FILTER_TYPE,
                    json!(range.label()),
                    self.widget_id.clone(),
                );
                hook(&event);
            }
        }
    }

    /// Wraps the controller as a widget click handler.
    #[must_use]
    pub fn into_handler(self: Rc<Self>) -> WidgetEventHandler {
        Rc::new(move |params, scope| self.handle_click(params, scope))
    }
}

impl fmt::Debug for TimeRangeOverlayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TimeRangeOverlayController")
            .field("widget_id", &self.widget_id)
            .field("ranges", &state.ranges)
            .field("selected", &state.selected)
            .field("elements", &state.elements.len())
            .field("has_filter_change_callback", &self.on_filter_change.is_some())
            .field("has_time_range_callback", &self.on_time_range.is_some())
            .field("has_fallback_hook", &self.fallback.is_some())
            .finish()
    }
}
