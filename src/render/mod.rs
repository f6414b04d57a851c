mod events;
mod graphic;
mod recording_handle;

pub use events::{ChartEventKind, ChartEventParams, EngineEventHandler, EventFlow};
pub use graphic::{FilterTag, GraphicElement, RectPrimitive, ShapeStyle, TextPrimitive, TextStyle};
pub use recording_handle::{PushRecord, RecordingRenderHandle};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::error::WidgetResult;

/// Contract of the live chart object owned by the rendering engine.
///
/// The engine creates handles asynchronously, after the widget exists, and
/// may drop them at any time. Widgets therefore only ever hold a
/// [`WeakRenderHandle`].
pub trait RenderHandle {
    /// Pushes a configuration tree. `replace` discards the previous tree,
    /// otherwise top-level components are merged.
    fn set_option(&mut self, options: &Value, replace: bool) -> WidgetResult<()>;

    /// Returns the tree currently rendered, if the engine exposes it.
    fn get_option(&self) -> Option<Value>;

    fn on(&mut self, event: ChartEventKind, handler: EngineEventHandler);

    fn off(&mut self, event: ChartEventKind);
}

pub type SharedRenderHandle = Rc<RefCell<dyn RenderHandle>>;
pub type WeakRenderHandle = Weak<RefCell<dyn RenderHandle>>;
