//! Event registration on the builder.
//!
//! Handlers are stored per event kind and travel with the built widget;
//! they reach the engine when a render handle is attached.

use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use super::builder::ChartWidgetBuilder;
use crate::core::record::{display_string, is_truthy, lookup};
use crate::core::{EventScope, WidgetEventHandler};
use crate::render::{ChartEventKind, ChartEventParams, EventFlow};

/// Receives the symbol of the stock a navigation event pointed at.
pub type NavigationCallback = Rc<dyn Fn(&str)>;

impl ChartWidgetBuilder {
    /// Binds `handler` to `event`, replacing an earlier handler for it.
    #[must_use]
    pub fn on_event(mut self, event: ChartEventKind, handler: WidgetEventHandler) -> Self {
        self.events.bind(event, handler);
        self
    }

    #[must_use]
    pub fn set_click_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::Click, handler)
    }

    #[must_use]
    pub fn set_double_click_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::DblClick, handler)
    }

    #[must_use]
    pub fn set_mouse_down_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::MouseDown, handler)
    }

    #[must_use]
    pub fn set_mouse_up_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::MouseUp, handler)
    }

    #[must_use]
    pub fn set_mouse_over_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::MouseOver, handler)
    }

    #[must_use]
    pub fn set_mouse_out_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::MouseOut, handler)
    }

    #[must_use]
    pub fn set_mouse_move_event(self, handler: WidgetEventHandler) -> Self {
        self.on_event(ChartEventKind::MouseMove, handler)
    }

    #[must_use]
    pub fn set_multiple_events(
        self,
        handlers: impl IntoIterator<Item = (ChartEventKind, WidgetEventHandler)>,
    ) -> Self {
        handlers
            .into_iter()
            .fold(self, |builder, (event, handler)| builder.on_event(event, handler))
    }

    /// Calls `navigate` with the symbol of a clicked series item.
    ///
    /// The symbol is read from `symbol_field` of the item data, or from the
    /// first element when the data is a tuple.
    #[must_use]
    pub fn set_stock_navigation_events(
        self,
        navigate: NavigationCallback,
        symbol_field: impl Into<String>,
        event: ChartEventKind,
    ) -> Self {
        let symbol_field = symbol_field.into();
        let handler: WidgetEventHandler =
            Rc::new(move |params: &ChartEventParams, scope: &EventScope| {
                if params.component_type != "series" {
                    return EventFlow::PassThrough;
                }
                match stock_symbol(&params.data, &symbol_field) {
                    Some(symbol) => {
                        debug!(widget_id = %scope.widget_id, symbol = %symbol, event = %event, "stock navigation");
                        navigate(&symbol);
                        EventFlow::Handled
                    }
                    None => EventFlow::PassThrough,
                }
            });
        self.on_event(event, handler)
    }
}

fn stock_symbol(data: &Value, symbol_field: &str) -> Option<String> {
    lookup(data, symbol_field)
        .filter(|value| is_truthy(value))
        .or_else(|| data.get(0).filter(|value| is_truthy(value)))
        .map(display_string)
}
