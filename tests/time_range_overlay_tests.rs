use std::cell::RefCell;
use std::rc::Rc;

use chart_widgets::api::ChartWidgetBuilder;
use chart_widgets::core::{
    ChartKind, EventScope, FilterChangeEvent, FilterEventKind, SharedWidget, TimeRange, attach_render_handle,
};
use chart_widgets::interaction::{OverlayLayout, TIME_RANGE_FILTER_TYPE};
use chart_widgets::render::{
    ChartEventKind, ChartEventParams, EventFlow, RecordingRenderHandle, SharedRenderHandle,
};
use serde_json::{Value, json};

fn rows() -> Value {
    json!([
        {"date": "2024-01-02", "open": 10, "close": 11, "low": 9, "high": 12, "volume": 800},
        {"date": "2024-01-03", "open": 11, "close": 12, "low": 10, "high": 13, "volume": 900},
    ])
}

fn attached(builder: &ChartWidgetBuilder) -> (SharedWidget, Rc<RefCell<RecordingRenderHandle>>) {
    let widget = builder.build_shared();
    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");
    (widget, recording)
}

fn click(recording: &Rc<RefCell<RecordingRenderHandle>>, params: &ChartEventParams) -> EventFlow {
    RecordingRenderHandle::dispatch(recording, ChartEventKind::Click, params)
}

fn selected_buttons(graphic: &Value) -> Vec<String> {
    graphic
        .as_array()
        .expect("graphic list")
        .iter()
        .filter(|element| element["type"] == json!("rect") && element["style"]["fill"] == json!("#2196f3"))
        .filter_map(|element| element["range"].as_str().map(str::to_owned))
        .collect()
}

#[test]
fn candlestick_build_carries_the_full_strip() {
    let widget = ChartWidgetBuilder::new(ChartKind::Candlestick).set_data(rows()).build();
    let graphic = widget.config.options["graphic"].as_array().expect("graphic");
    assert_eq!(graphic.len(), 21);
    assert_eq!(graphic[0]["range"], json!("1D"));
    assert_eq!(graphic[10]["type"], json!("text"));
    assert_eq!(selected_buttons(&widget.config.options["graphic"]), vec!["1Y"]);
    let filters = widget.time_range_filters.as_ref().expect("filters");
    assert_eq!(filters.selected_range, TimeRange::OneYear);
    assert!(widget.events().get(ChartEventKind::Click).is_some());
}

#[test]
fn disabled_strip_adds_no_graphic() {
    let widget = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .disable_time_range_filters()
        .build();
    assert!(widget.config.options.get("graphic").is_none());
    assert!(widget.time_range_filters.is_none());
}

#[test]
fn clicking_a_button_selects_its_range() {
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick).set_data(rows());
    let (widget, recording) = attached(&builder);

    let flow = click(&recording, &ChartEventParams::graphic(2));
    assert_eq!(flow, EventFlow::Handled);

    let recording = recording.borrow();
    let last = recording.pushes().last().expect("overlay push");
    assert!(!last.replace);
    assert_eq!(last.options.as_object().map(|map| map.len()), Some(1));
    assert_eq!(selected_buttons(&last.options["graphic"]), vec!["1M"]);

    let widget = widget.borrow();
    let filters = widget.time_range_filters.as_ref().expect("filters");
    assert_eq!(filters.selected_range, TimeRange::OneMonth);
    assert_eq!(selected_buttons(&widget.config.options["graphic"]), vec!["1M"]);
}

#[test]
fn clicking_a_label_resolves_like_its_button() {
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick).set_data(rows());
    let (widget, recording) = attached(&builder);
    click(&recording, &ChartEventParams::graphic(12));
    assert_eq!(
        widget.borrow().time_range_filters.as_ref().map(|f| f.selected_range),
        Some(TimeRange::OneMonth)
    );
}

#[test]
fn clicks_without_an_index_are_hit_tested() {
    let layout = OverlayLayout::default();
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_data(rows())
        .set_overlay_layout(layout);
    let (widget, recording) = attached(&builder);

    let (x, y) = layout.button_center(2);
    let params = ChartEventParams {
        component_type: "graphic".to_owned(),
        ..ChartEventParams::default()
    }
    .with_offset(x, y);
    assert_eq!(click(&recording, &params), EventFlow::Handled);
    assert_eq!(
        widget.borrow().time_range_filters.as_ref().map(|f| f.selected_range),
        Some(TimeRange::OneMonth)
    );
}

#[test]
fn callbacks_fire_filter_change_first() {
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let filter_log = log.clone();
    let range_log = log.clone();
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_id("stock")
        .set_data(rows())
        .set_filter_change_callback(Rc::new(move |event: &FilterChangeEvent| {
            assert_eq!(event.kind, FilterEventKind::CustomFilter);
            assert_eq!(event.filter_type, TIME_RANGE_FILTER_TYPE);
            assert_eq!(event.widget_id, "stock");
            filter_log.borrow_mut().push(format!("filter:{}", event.value));
        }))
        .set_time_range_callback(Rc::new(move |range: TimeRange| {
            range_log.borrow_mut().push(format!("range:{range}"));
        }));
    let (_widget, recording) = attached(&builder);

    click(&recording, &ChartEventParams::graphic(3));
    assert_eq!(*log.borrow(), vec!["filter:\"3M\"", "range:3M"]);
}

#[test]
fn fallback_hook_fires_only_without_callbacks() {
    let fallback_events: Rc<RefCell<Vec<FilterChangeEvent>>> = Rc::default();
    let sink = fallback_events.clone();
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_data(rows())
        .set_fallback_hook(Rc::new(move |event: &FilterChangeEvent| {
            sink.borrow_mut().push(event.clone());
        }));
    let (_widget, recording) = attached(&builder);
    click(&recording, &ChartEventParams::graphic(0));
    {
        let events = fallback_events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FilterEventKind::TimeRangeChange);
        assert_eq!(events[0].value, json!("1D"));
    }

    let fallback_hits = Rc::new(RefCell::new(0usize));
    let hits = fallback_hits.clone();
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_data(rows())
        .set_time_range_callback(Rc::new(|_range: TimeRange| {}))
        .set_fallback_hook(Rc::new(move |_event: &FilterChangeEvent| {
            *hits.borrow_mut() += 1;
        }));
    let (_widget, recording) = attached(&builder);
    click(&recording, &ChartEventParams::graphic(0));
    assert_eq!(*fallback_hits.borrow(), 0);
}

#[test]
fn unresolved_graphic_clicks_are_swallowed() {
    let calls = Rc::new(RefCell::new(0usize));
    let counter = calls.clone();
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_data(rows())
        .set_time_range_callback(Rc::new(move |_range: TimeRange| {
            *counter.borrow_mut() += 1;
        }));
    let (widget, recording) = attached(&builder);
    let pushes_before = recording.borrow().push_count();

    assert_eq!(click(&recording, &ChartEventParams::graphic(20)), EventFlow::Handled);
    assert_eq!(click(&recording, &ChartEventParams::graphic(99)), EventFlow::Handled);
    assert_eq!(*calls.borrow(), 0);
    assert_eq!(recording.borrow().push_count(), pushes_before);
    assert_eq!(
        widget.borrow().time_range_filters.as_ref().map(|f| f.selected_range),
        Some(TimeRange::OneYear)
    );
}

#[test]
fn series_clicks_reach_the_earlier_click_handler() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = seen.clone();
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_data(rows())
        .set_click_event(Rc::new(move |params: &ChartEventParams, scope: &EventScope| {
            sink.borrow_mut()
                .push(format!("{}:{}", scope.widget_id, params.name.clone().unwrap_or_default()));
            EventFlow::PassThrough
        }))
        .set_id("stock");
    let (_widget, recording) = attached(&builder);

    let params = ChartEventParams::series_item("candlestick", "2024-01-02", json!([10, 11, 9, 12]));
    assert_eq!(click(&recording, &params), EventFlow::PassThrough);
    assert_eq!(*seen.borrow(), vec!["stock:2024-01-02"]);
}

#[test]
fn series_clicks_pass_through_without_a_handler() {
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick).set_data(rows());
    let (_widget, recording) = attached(&builder);
    let params = ChartEventParams::series_item("candlestick", "2024-01-02", json!([]));
    assert_eq!(click(&recording, &params), EventFlow::PassThrough);
}

#[test]
fn restricted_strip_only_offers_its_ranges() {
    let builder = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .set_data(rows())
        .enable_time_range_filters(
            vec![TimeRange::OneMonth, TimeRange::OneYear, TimeRange::Max],
            TimeRange::FiveYears,
        );
    let widget = builder.build();
    let graphic = &widget.config.options["graphic"];
    assert_eq!(graphic.as_array().map(Vec::len), Some(7));
    assert_eq!(selected_buttons(graphic), vec!["1M"]);

    let (widget, recording) = attached(&builder);
    click(&recording, &ChartEventParams::graphic(2));
    assert_eq!(
        widget.borrow().time_range_filters.as_ref().map(|f| f.selected_range),
        Some(TimeRange::Max)
    );
}
