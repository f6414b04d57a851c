pub mod events;
pub mod filter;
pub mod format;
pub mod kind;
pub mod record;
pub mod time_range;
pub mod widget;

pub use events::{EventBindings, EventScope, WidgetEventHandler};
pub use filter::{
    DataFilter, FilterBy, FilterChangeEvent, FilterEventKind, FilterOperator, GlobalFilter,
    apply_filters,
};
pub use format::{DisplayLocale, ValueFormatter};
pub use kind::ChartKind;
pub use record::{LenientNumber, UNKNOWN_NAME, lenient_number, lookup, name_field, number_field};
pub use time_range::{TimeRange, TimeRangeFilters};
pub use widget::{
    ECHART_COMPONENT, SharedWidget, Widget, WidgetConfig, WidgetHeader, WidgetPosition,
    attach_render_handle,
};
