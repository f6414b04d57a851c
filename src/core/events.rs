use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::widget::{SharedWidget, Widget};
use crate::render::{ChartEventKind, ChartEventParams, EventFlow, SharedRenderHandle, WeakRenderHandle};

/// Context handed to widget event handlers.
#[derive(Clone)]
pub struct EventScope {
    pub widget_id: String,
    handle: WeakRenderHandle,
    widget: Weak<RefCell<Widget>>,
}

impl EventScope {
    #[must_use]
    pub fn new(
        widget_id: impl Into<String>,
        handle: WeakRenderHandle,
        widget: Weak<RefCell<Widget>>,
    ) -> Self {
        Self {
            widget_id: widget_id.into(),
            handle,
            widget,
        }
    }

    /// The render handle that delivered the event, if the engine still holds it.
    #[must_use]
    pub fn render_handle(&self) -> Option<SharedRenderHandle> {
        self.handle.upgrade()
    }

    /// The widget the handler was bound for, unless it has been dropped.
    #[must_use]
    pub fn widget(&self) -> Option<SharedWidget> {
        self.widget.upgrade()
    }
}

impl fmt::Debug for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventScope")
            .field("widget_id", &self.widget_id)
            .field("handle_alive", &(self.handle.strong_count() > 0))
            .field("widget_alive", &(self.widget.strong_count() > 0))
            .finish()
    }
}

pub type WidgetEventHandler = Rc<dyn Fn(&ChartEventParams, &EventScope) -> EventFlow>;

/// Handlers a widget binds on the render handle, one per event kind.
///
/// Registering a kind twice replaces the earlier handler; distinct kinds
/// accumulate.
#[derive(Clone, Default)]
pub struct EventBindings {
    handlers: IndexMap<ChartEventKind, WidgetEventHandler>,
}

impl EventBindings {
    pub fn bind(&mut self, event: ChartEventKind, handler: WidgetEventHandler) {
        self.handlers.insert(event, handler);
    }

    pub fn unbind(&mut self, event: ChartEventKind) -> bool {
        self.handlers.shift_remove(&event).is_some()
    }

    #[must_use]
    pub fn get(&self, event: ChartEventKind) -> Option<&WidgetEventHandler> {
        self.handlers.get(&event)
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ChartEventKind> {
        self.handlers.keys().copied().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ChartEventKind, &WidgetEventHandler)> {
        self.handlers.iter().map(|(kind, handler)| (*kind, handler))
    }
}

impl fmt::Debug for EventBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}
