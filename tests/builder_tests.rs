use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use chart_widgets::api::{ChartWidgetBuilder, Palette, SortField, SortOrder, TransformOptions};
use chart_widgets::core::{
    ChartKind, DisplayLocale, EventScope, FilterBy, ValueFormatter, WidgetEventHandler,
    WidgetPosition, attach_render_handle,
};
use chart_widgets::render::{
    ChartEventKind, ChartEventParams, EventFlow, RecordingRenderHandle, SharedRenderHandle,
};
use serde_json::{Value, json};

fn sales() -> Value {
    json!([
        {"name": "North", "value": 120},
        {"name": "South", "value": 80},
        {"name": "East", "value": 200},
    ])
}

#[test]
fn series_is_an_array_for_every_kind() {
    for kind in ChartKind::ALL {
        let widget = ChartWidgetBuilder::new(kind).build();
        let series = widget.config.options.get("series").expect("series key");
        assert!(series.is_array(), "{kind} built without a series array");
        assert_eq!(widget.config.chart_kind, Some(kind));
        assert_eq!(widget.chart_kind(), Some(kind));
    }
}

#[test]
fn build_is_idempotent() {
    let builder = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_title("Sales", Some("by region"))
        .set_data(sales())
        .transform_data(TransformOptions::default());
    let first = builder.build();
    let second = builder.build();
    assert_eq!(first.config.options, second.config.options);
    assert_eq!(first.id(), second.id());
}

#[test]
fn every_builder_gets_its_own_id() {
    let a = ChartWidgetBuilder::new(ChartKind::Pie);
    let b = ChartWidgetBuilder::new(ChartKind::Pie);
    assert_ne!(a.id(), b.id());
    let fixed = ChartWidgetBuilder::new(ChartKind::Pie).set_id("pie-1").build();
    assert_eq!(fixed.id(), "pie-1");
}

#[test]
fn set_data_is_used_verbatim_as_primary_series_data() {
    let widget = ChartWidgetBuilder::new(ChartKind::Line)
        .set_data(json!([1, 2, 3]))
        .build();
    assert_eq!(widget.config.options["series"][0]["data"], json!([1, 2, 3]));
    assert_eq!(widget.data, json!([1, 2, 3]));
}

#[test]
fn set_data_discards_an_earlier_transform() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_data(sales())
        .transform_data(TransformOptions::default())
        .set_data(json!([5]))
        .build();
    assert_eq!(widget.config.options["series"][0]["data"], json!([5]));
}

#[test]
fn bar_transform_fills_series_and_category_axis() {
    let options = TransformOptions::default().with_sort(SortField::Value, SortOrder::Desc);
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_data(sales())
        .transform_data(options)
        .build();
    let options = &widget.config.options;
    assert_eq!(options["xAxis"]["data"], json!(["East", "North", "South"]));
    assert_eq!(options["series"][0]["data"][0], json!({"name": "East", "value": 200.0}));
    assert_eq!(options["series"][0]["type"], json!("bar"));
}

#[test]
fn horizontal_bars_put_categories_on_the_y_axis() {
    let widget = ChartWidgetBuilder::new(ChartKind::HorizontalBar)
        .set_data(sales())
        .transform_data(TransformOptions::default())
        .build();
    assert_eq!(widget.config.options["yAxis"]["data"], json!(["North", "South", "East"]));
    assert!(widget.config.options["xAxis"].get("data").is_none());
}

#[test]
fn transform_without_records_keeps_previous_state() {
    let mut builder = ChartWidgetBuilder::new(ChartKind::Bar).set_data(json!({"not": "records"}));
    assert!(builder.try_transform_data(&TransformOptions::default()).is_err());
    let widget = builder.transform_data(TransformOptions::default()).build();
    assert_eq!(widget.config.options["series"][0]["data"], json!([]));
}

#[test]
fn coerced_values_are_reported() {
    let mut builder = ChartWidgetBuilder::new(ChartKind::Pie).set_data(json!([
        {"name": "a", "value": "not-a-number"},
        {"name": "b", "value": 4},
    ]));
    let coerced = builder
        .try_transform_data(&TransformOptions::default())
        .expect("transform");
    assert_eq!(coerced, 1);
    assert_eq!(builder.coerced_values(), 1);
    let widget = builder.build();
    assert_eq!(widget.config.options["series"][0]["data"][0]["value"], json!(0.0));
}

#[test]
fn default_sort_order_follows_the_kind() {
    assert_eq!(
        ChartWidgetBuilder::new(ChartKind::Line).transform_options().sort_order,
        SortOrder::Asc
    );
    assert_eq!(
        ChartWidgetBuilder::new(ChartKind::Pie).transform_options().sort_order,
        SortOrder::Desc
    );
}

#[test]
fn chart_level_setters_merge_into_options() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_title("Revenue", None)
        .set_tooltip("item", None)
        .set_legend("vertical", "right")
        .set_grid(json!({"top": "20%"}))
        .set_background_color("#fafafa")
        .set_animation(json!(false))
        .set_custom_options(json!({"color": ["#000"]}))
        .build();
    let options = &widget.config.options;
    assert_eq!(options["title"]["text"], json!("Revenue"));
    assert!(options["title"].get("subtext").is_none());
    assert_eq!(options["tooltip"]["trigger"], json!("item"));
    assert_eq!(options["tooltip"]["formatter"], json!("{b}: {c}"));
    assert_eq!(options["tooltip"]["axisPointer"]["type"], json!("shadow"));
    assert_eq!(options["legend"]["left"], json!("right"));
    assert_eq!(options["legend"]["top"], json!("middle"));
    assert_eq!(options["grid"]["top"], json!("20%"));
    assert_eq!(options["grid"]["containLabel"], json!(true));
    assert_eq!(options["backgroundColor"], json!("#fafafa"));
    assert_eq!(options["animation"], json!(false));
    assert_eq!(options["color"], json!(["#000"]));
}

#[test]
fn extra_series_follow_the_generated_ones() {
    let widget = ChartWidgetBuilder::new(ChartKind::Line)
        .set_data(json!([1, 2]))
        .add_series(json!({"type": "line", "name": "Target", "data": [3, 3]}))
        .build();
    let series = widget.config.options["series"].as_array().expect("series");
    assert_eq!(series.len(), 2);
    assert_eq!(series[1]["name"], json!("Target"));

    let replaced = ChartWidgetBuilder::new(ChartKind::Line)
        .add_series(json!({"name": "old"}))
        .set_series(vec![json!({"name": "new"})])
        .build();
    let series = replaced.config.options["series"].as_array().expect("series");
    assert_eq!(series.len(), 2);
    assert_eq!(series[1]["name"], json!("new"));
}

#[test]
fn series_level_helpers_edit_the_primary_series() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_label_show(true)
        .set_label_position("inside")
        .set_label_formatter("{c}")
        .set_border_radius(6.0)
        .set_border("#111", 2.0)
        .set_emphasis(12.0, 1.0, "#222")
        .build();
    let primary = &widget.config.options["series"][0];
    assert_eq!(primary["label"], json!({"show": true, "position": "inside", "formatter": "{c}"}));
    assert_eq!(primary["itemStyle"]["borderRadius"], json!(6.0));
    assert_eq!(primary["itemStyle"]["borderColor"], json!("#111"));
    assert_eq!(primary["emphasis"]["itemStyle"]["shadowBlur"], json!(12.0));
}

#[test]
fn palettes_land_where_each_kind_reads_colors() {
    let bar = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_predefined_palette(Palette::Finance)
        .build();
    assert_eq!(
        bar.config.options["series"][0]["itemStyle"]["color"][0],
        json!("#2E8B57")
    );

    let pie = ChartWidgetBuilder::new(ChartKind::Pie)
        .set_predefined_palette(Palette::Pastel)
        .build();
    let colors = pie.config.options["series"][0]["color"].as_array().expect("colors");
    assert_eq!(colors.len(), 9);
    assert_eq!(colors[0], json!("#FFB6C1"));

    let candles = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_predefined_palette(Palette::Dark)
        .build();
    let style = &candles.config.options["series"][0]["itemStyle"];
    assert_eq!(style["color"], json!("#2c3e50"));
    assert_eq!(style["color0"], json!("#34495e"));
}

#[test]
fn gradient_colors_build_a_linear_gradient() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_gradient_colors("#fff", "#000", chart_widgets::api::GradientDirection::Vertical)
        .build();
    let color = &widget.config.options["series"][0]["itemStyle"]["color"];
    assert_eq!(color["type"], json!("linear"));
    assert_eq!(color["y2"], json!(1));
    assert_eq!(color["colorStops"][1]["color"], json!("#000"));
}

#[test]
fn currency_formatter_uses_the_builder_locale() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_locale(DisplayLocale::DeDe)
        .set_currency_formatter("eur")
        .build();
    let formatter = widget.config.value_formatter.clone().expect("formatter");
    assert_eq!(formatter, ValueFormatter::currency("EUR", DisplayLocale::DeDe));
    assert_eq!(
        widget.config.options["tooltip"]["formatter"],
        json!({"kind": "currency", "currency": "EUR", "locale": "de-DE"})
    );
    assert_eq!(widget.config.options["tooltip"]["trigger"], json!("axis"));
    assert_eq!(formatter.format(1234.5), "1.234,50 €");
}

#[test]
fn custom_filters_are_an_ordered_registry() {
    let builder = ChartWidgetBuilder::new(ChartKind::Bar)
        .add_custom_filter("region", json!({"values": ["north"]}))
        .add_custom_filter("year", json!(2024))
        .add_custom_filter("region", json!({"values": ["south"]}))
        .remove_custom_filter("year");
    assert_eq!(builder.custom_filter("region"), Some(&json!({"values": ["south"]})));
    assert!(builder.custom_filter("year").is_none());
    let widget = builder
        .set_filter_column("region", FilterBy::Value)
        .set_accessor("region")
        .set_skip_default_filtering(true)
        .build();
    assert_eq!(widget.config.custom_filters.len(), 1);
    assert_eq!(widget.config.filter_column.as_deref(), Some("region"));
    assert_eq!(widget.config.filter_by, Some(FilterBy::Value));
    assert!(widget.config.skip_default_filtering);
}

#[test]
fn height_follows_the_grid_row_span() {
    let widget = ChartWidgetBuilder::new(ChartKind::Gauge)
        .set_position(WidgetPosition::new(0, 0, 4, 3))
        .set_height_from_grid(100.0, 10.0)
        .build();
    assert_relative_eq!(widget.height.expect("height"), 320.0);

    let tiny = ChartWidgetBuilder::new(ChartKind::Gauge)
        .set_position(WidgetPosition::new(0, 0, 1, 2))
        .set_height_from_grid(10.0, 0.0)
        .build();
    assert_relative_eq!(tiny.height.expect("height"), 100.0);
}

#[test]
fn header_round_trips_through_json() {
    let widget = ChartWidgetBuilder::new(ChartKind::Pie)
        .set_header("Market share", vec!["export".to_owned()])
        .set_data(json!([{"name": "a", "value": 1}]))
        .build();
    let text = widget.to_json_pretty().expect("serialize");
    let back = chart_widgets::Widget::from_json_str(&text).expect("parse");
    assert_eq!(back.header_title(), Some("Market share"));
    assert_eq!(back.config.options, widget.config.options);
    assert_eq!(back.id(), widget.id());
}

fn counting_handler(log: &Rc<RefCell<Vec<String>>>) -> WidgetEventHandler {
    let log = Rc::clone(log);
    Rc::new(move |params: &ChartEventParams, scope: &EventScope| {
        log.borrow_mut()
            .push(format!("{}:{}", scope.widget_id, params.name.clone().unwrap_or_default()));
        EventFlow::Handled
    })
}

#[test]
fn events_stay_off_the_engine_until_a_handle_is_attached() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let widget = ChartWidgetBuilder::new(ChartKind::Pie)
        .set_id("pie")
        .set_click_event(counting_handler(&log))
        .set_mouse_over_event(counting_handler(&log))
        .build_shared();
    assert_eq!(widget.borrow().events().len(), 2);
    assert!(!widget.borrow().is_render_ready());

    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");

    assert!(recording.borrow().has_listener(ChartEventKind::Click));
    assert!(recording.borrow().has_listener(ChartEventKind::MouseOver));
    let flow = RecordingRenderHandle::dispatch(
        &recording,
        ChartEventKind::Click,
        &ChartEventParams::series_item("pie", "North", json!(3)),
    );
    assert_eq!(flow, EventFlow::Handled);
    assert_eq!(log.borrow().as_slice(), ["pie:North"]);
}

#[test]
fn reattaching_replaces_listeners_instead_of_stacking_them() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_click_event(counting_handler(&log))
        .set_click_event(counting_handler(&log))
        .build_shared();
    assert_eq!(widget.borrow().events().len(), 1);

    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");
    attach_render_handle(&widget, &handle).expect("attach again");

    assert_eq!(recording.borrow().listener_count(), 1);
    assert_eq!(recording.borrow().off_calls(), [ChartEventKind::Click, ChartEventKind::Click]);
    RecordingRenderHandle::dispatch(&recording, ChartEventKind::Click, &ChartEventParams::default());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn attaching_pushes_options_only_when_data_exists() {
    let empty = ChartWidgetBuilder::new(ChartKind::Bar).build_shared();
    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&empty, &handle).expect("attach");
    assert_eq!(recording.borrow().push_count(), 0);

    let filled = ChartWidgetBuilder::new(ChartKind::Bar).set_data(sales()).build_shared();
    attach_render_handle(&filled, &handle).expect("attach");
    let recording = recording.borrow();
    assert_eq!(recording.push_count(), 1);
    assert!(recording.pushes()[0].replace);
}

#[test]
fn stock_navigation_reads_the_clicked_symbol() {
    let visited = Rc::new(RefCell::new(Vec::<String>::new()));
    let sink = Rc::clone(&visited);
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .set_stock_navigation_events(
            Rc::new(move |symbol: &str| sink.borrow_mut().push(symbol.to_owned())),
            "symbol",
            ChartEventKind::DblClick,
        )
        .build_shared();
    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");

    let click = ChartEventParams::series_item("bar", "Apple", json!(1))
        .with_data(json!({"symbol": "AAPL"}));
    let flow = RecordingRenderHandle::dispatch(&recording, ChartEventKind::DblClick, &click);
    assert_eq!(flow, EventFlow::Handled);

    let miss = RecordingRenderHandle::dispatch(
        &recording,
        ChartEventKind::DblClick,
        &ChartEventParams::graphic(0),
    );
    assert_eq!(miss, EventFlow::PassThrough);
    assert_eq!(visited.borrow().as_slice(), ["AAPL"]);
}
