//! chart-widgets: fluent builders for ECharts-style dashboard widgets.
//!
//! Builders assemble declarative option trees wrapped as [`Widget`]s. The
//! rendering engine lives outside this crate and is reached through the
//! [`render::RenderHandle`] contract, which may appear after the widget is
//! built; [`UpdateDispatcher`] bridges that gap with bounded retries.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{
    ChartWidgetBuilder, ChartWidgetsConfig, ExportAdapter, RetryPolicy, TransformOptions,
    UpdateDispatcher,
};
pub use core::{ChartKind, SharedWidget, Widget};
pub use error::{WidgetError, WidgetResult};
