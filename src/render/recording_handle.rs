use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{WidgetError, WidgetResult};
use crate::render::{ChartEventKind, ChartEventParams, EngineEventHandler, EventFlow, RenderHandle};

/// One `set_option` call observed by [`RecordingRenderHandle`].
#[derive(Debug, Clone, PartialEq)]
pub struct PushRecord {
    pub options: Value,
    pub replace: bool,
}

/// Headless render handle used by tests and hosts without a chart engine.
///
/// It keeps the merged option tree like the engine would, records every
/// push and listener change, and can be told to reject pushes.
#[derive(Default)]
pub struct RecordingRenderHandle {
    current: Option<Value>,
    pushes: Vec<PushRecord>,
    listeners: IndexMap<ChartEventKind, EngineEventHandler>,
    off_calls: Vec<ChartEventKind>,
    on_calls: Vec<ChartEventKind>,
    failures_remaining: usize,
    always_fail: bool,
    hide_options: bool,
}

impl RecordingRenderHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Rejects the next `count` pushes, then accepts again.
    pub fn fail_next_pushes(&mut self, count: usize) {
        self.failures_remaining = count;
    }

    pub fn set_always_fail(&mut self, always_fail: bool) {
        self.always_fail = always_fail;
    }

    /// Makes `get_option` return `None`, like an engine that has not
    /// finished initializing its model.
    pub fn set_hide_options(&mut self, hide: bool) {
        self.hide_options = hide;
    }

    #[must_use]
    pub fn pushes(&self) -> &[PushRecord] {
        &self.pushes
    }

    #[must_use]
    pub fn push_count(&self) -> usize {
        self.pushes.len()
    }

    #[must_use]
    pub fn current_options(&self) -> Option<&Value> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn has_listener(&self, event: ChartEventKind) -> bool {
        self.listeners.contains_key(&event)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn off_calls(&self) -> &[ChartEventKind] {
        &self.off_calls
    }

    #[must_use]
    pub fn on_calls(&self) -> &[ChartEventKind] {
        &self.on_calls
    }

    /// Delivers a synthetic engine event to the bound listener.
    ///
    /// The listener runs after the handle borrow is released, so it may push
    /// options back into the same handle.
    pub fn dispatch(
        handle: &Rc<RefCell<Self>>,
        event: ChartEventKind,
        params: &ChartEventParams,
    ) -> EventFlow {
        let listener = handle.borrow().listeners.get(&event).cloned();
        match listener {
            Some(listener) => listener(params),
            None => EventFlow::PassThrough,
        }
    }
}

impl RenderHandle for RecordingRenderHandle {
    fn set_option(&mut self, options: &Value, replace: bool) -> WidgetResult<()> {
        if self.always_fail {
            return Err(WidgetError::RenderPush("engine rejected option tree".to_owned()));
        }
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(WidgetError::RenderPush("engine rejected option tree".to_owned()));
        }

        self.pushes.push(PushRecord {
            options: options.clone(),
            replace,
        });

        match (&mut self.current, options) {
            (Some(Value::Object(current)), Value::Object(incoming)) if !replace => {
                for (key, value) in incoming {
                    current.insert(key.clone(), value.clone());
                }
            }
            _ => self.current = Some(options.clone()),
        }
        Ok(())
    }

    fn get_option(&self) -> Option<Value> {
        if self.hide_options {
            return None;
        }
        self.current.clone()
    }

    fn on(&mut self, event: ChartEventKind, handler: EngineEventHandler) {
        self.on_calls.push(event);
        self.listeners.insert(event, handler);
    }

    fn off(&mut self, event: ChartEventKind) {
        self.off_calls.push(event);
        self.listeners.shift_remove(&event);
    }
}
