//! Interactive overlays drawn on top of rendered charts.

mod overlay_controller;
mod time_range;

pub use overlay_controller::{
    FallbackHook, FilterChangeCallback, TimeRangeCallback, TimeRangeOverlayController,
};
pub use time_range::{
    OverlayLayout, OverlayPrimitives, TIME_RANGE_FILTER_TYPE, hit_test, range_at, range_at_json,
    render_overlay,
};
