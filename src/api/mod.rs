//! Builder surface of the crate: per-kind defaults, the record pipeline,
//! widget assembly, live updates and export.

mod builder;
mod candlestick;
mod chart_kind;
mod config;
mod events;
mod export;
mod options;
pub mod pipeline;
pub mod series_transform;
mod update_dispatcher;
mod update_strategy;

pub use builder::ChartWidgetBuilder;
pub use candlestick::CandlestickSettings;
pub use chart_kind::CategoryAxis;
pub use config::ChartWidgetsConfig;
pub use events::NavigationCallback;
pub use export::{ExportAdapter, ExportRow, MAX_SHEET_NAME_LEN, sanitize_sheet_name};
pub use options::{GradientDirection, Palette};
pub use pipeline::{
    AggregateFunction, SeriesPoint, SortField, SortOrder, TransformOptions, TransformOutput,
    transform,
};
pub use series_transform::{
    BarPalette, SeriesFields, SeriesUpdate, ShapeSettings, StackSeries, parse_record_date,
    shape_series,
};
pub use update_dispatcher::{
    DispatchOutcome, DispatchReport, RetryGrowth, RetryPolicy, UpdateDispatcher, UpdateId,
};
pub use update_strategy::apply_update;
