use std::time::Duration;

use chart_widgets::api::{
    ChartWidgetBuilder, DispatchOutcome, RetryGrowth, RetryPolicy, UpdateDispatcher,
};
use chart_widgets::core::{ChartKind, attach_render_handle};
use chart_widgets::render::{RecordingRenderHandle, SharedRenderHandle};
use serde_json::json;

const MS: Duration = Duration::from_millis(1);

#[test]
fn standard_policy_grows_by_half_and_caps() {
    let policy = RetryPolicy::standard();
    assert_eq!(policy.max_attempts, 10);
    assert_eq!(policy.delay_after(1), 100 * MS);
    assert_eq!(policy.delay_after(2), 150 * MS);
    assert_eq!(policy.delay_after(3), 225 * MS);
    assert_eq!(policy.delay_after(4), Duration::from_micros(337_500));
    assert_eq!(policy.delay_after(9), policy.max_delay);
}

#[test]
fn quick_policy_grows_linearly() {
    let policy = RetryPolicy::quick();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.growth, RetryGrowth::Linear);
    assert_eq!(policy.delay_after(1), 100 * MS);
    assert_eq!(policy.delay_after(2), 200 * MS);
}

#[test]
fn policy_validation_rejects_degenerate_values() {
    assert!(RetryPolicy::standard().validate().is_ok());
    assert!(RetryPolicy::standard().with_max_attempts(0).validate().is_err());
    assert!(
        RetryPolicy::standard()
            .with_base_delay(Duration::from_secs(10))
            .validate()
            .is_err()
    );
    let shrinking = RetryPolicy {
        growth: RetryGrowth::Exponential { factor: 0.5 },
        ..RetryPolicy::standard()
    };
    assert!(shrinking.validate().is_err());
}

#[test]
fn policy_serializes_delays_in_milliseconds() {
    let value = serde_json::to_value(RetryPolicy::quick()).expect("serialize");
    assert_eq!(value["baseDelay"], json!(100));
    assert_eq!(value["maxDelay"], json!(2000));
    assert_eq!(value["growth"], json!({"kind": "linear"}));
    let back: RetryPolicy = serde_json::from_value(value).expect("parse");
    assert_eq!(back, RetryPolicy::quick());
}

#[test]
fn missing_handle_sees_exactly_max_attempts() {
    let widget = ChartWidgetBuilder::new(ChartKind::Line).build_shared();
    let mut dispatcher = UpdateDispatcher::new();

    let first = dispatcher.schedule_update(&widget, json!([1, 2, 3]), RetryPolicy::standard());
    assert_eq!(
        first.outcome,
        DispatchOutcome::Pending {
            attempts: 1,
            next_due: 100 * MS
        }
    );
    assert_eq!(dispatcher.pending_count(), 1);
    assert_eq!(widget.borrow().config.options["series"][0]["data"], json!([1, 2, 3]));

    let reports = dispatcher.advance_by(Duration::from_secs(60));
    assert_eq!(reports.len(), 9);
    let last = reports.last().expect("last report");
    assert!(last.is_terminal());
    match &last.outcome {
        DispatchOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(*attempts, 10);
            assert!(last_error.as_deref().is_some_and(|e| e.contains("not available")));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(dispatcher.pending_count(), 0);
    assert_eq!(dispatcher.next_due(), None);
}

#[test]
fn retries_wait_for_their_due_time() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar).build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    dispatcher.schedule_update(&widget, json!([1]), RetryPolicy::standard());

    assert!(dispatcher.advance_by(99 * MS).is_empty());
    let reports = dispatcher.advance_by(MS);
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].outcome,
        DispatchOutcome::Pending {
            attempts: 2,
            next_due: 250 * MS
        }
    );
    assert_eq!(dispatcher.next_due(), Some(250 * MS));
    assert_eq!(dispatcher.now(), 100 * MS);
}

#[test]
fn live_handle_succeeds_on_the_first_attempt() {
    let widget = ChartWidgetBuilder::new(ChartKind::Pie).build_shared();
    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");

    let mut dispatcher = UpdateDispatcher::new();
    let data = json!([{"name": "a", "value": 1}]);
    let report = dispatcher.schedule_update(&widget, data.clone(), RetryPolicy::standard());

    assert_eq!(report.outcome, DispatchOutcome::Succeeded { attempts: 1 });
    assert_eq!(report.widget_id, widget.borrow().id());
    let recording = recording.borrow();
    assert_eq!(recording.push_count(), 1);
    assert!(recording.pushes()[0].replace);
    assert_eq!(
        recording.pushes()[0].options["series"][0]["data"],
        json!([{"name": "a", "value": 1.0}])
    );
    assert_eq!(dispatcher.pending_count(), 0);
}

#[test]
fn handle_created_later_is_picked_up_by_the_next_retry() {
    let widget = ChartWidgetBuilder::new(ChartKind::Line).build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    dispatcher.schedule_update(&widget, json!([4, 5]), RetryPolicy::standard());

    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");

    let reports = dispatcher.advance_by(100 * MS);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, DispatchOutcome::Succeeded { attempts: 2 });
    let current = recording.borrow().current_options().cloned().expect("options");
    assert_eq!(current["series"][0]["data"], json!([4, 5]));
}

#[test]
fn rejected_pushes_count_as_failed_attempts() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar).build_shared();
    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");
    recording.borrow_mut().fail_next_pushes(2);

    let mut dispatcher = UpdateDispatcher::new();
    let first = dispatcher.schedule_update(&widget, json!([1]), RetryPolicy::standard());
    assert!(!first.is_terminal());

    let reports = dispatcher.advance_by(Duration::from_secs(1));
    let outcomes: Vec<_> = reports.iter().map(|report| report.outcome.clone()).collect();
    assert_eq!(
        outcomes,
        vec![
            DispatchOutcome::Pending {
                attempts: 2,
                next_due: 250 * MS
            },
            DispatchOutcome::Succeeded { attempts: 3 },
        ]
    );
    assert_eq!(recording.borrow().push_count(), 1);
}

#[test]
fn always_failing_engine_exhausts_with_the_push_error() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar).build_shared();
    let recording = RecordingRenderHandle::shared();
    let handle: SharedRenderHandle = recording.clone();
    attach_render_handle(&widget, &handle).expect("attach");
    recording.borrow_mut().set_always_fail(true);

    let mut dispatcher = UpdateDispatcher::new();
    dispatcher.schedule_update(&widget, json!([1]), RetryPolicy::quick());
    let reports = dispatcher.advance_by(Duration::from_secs(5));
    assert_eq!(reports.len(), 2);
    match &reports[1].outcome {
        DispatchOutcome::Exhausted { attempts, last_error } => {
            assert_eq!(*attempts, 3);
            assert!(last_error.as_deref().is_some_and(|e| e.contains("render push rejected")));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn dropped_handle_reads_as_not_ready() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar).build_shared();
    {
        let handle: SharedRenderHandle = RecordingRenderHandle::shared();
        attach_render_handle(&widget, &handle).expect("attach");
        assert!(widget.borrow().is_render_ready());
    }
    assert!(!widget.borrow().is_render_ready());

    let mut dispatcher = UpdateDispatcher::new();
    let report = dispatcher.schedule_update(&widget, json!([1]), RetryPolicy::quick());
    assert!(matches!(report.outcome, DispatchOutcome::Pending { attempts: 1, .. }));
}

#[test]
fn concurrent_chains_run_in_due_order() {
    let slow = ChartWidgetBuilder::new(ChartKind::Bar).set_id("slow").build_shared();
    let fast = ChartWidgetBuilder::new(ChartKind::Bar).set_id("fast").build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    dispatcher.schedule_update(&slow, json!([1]), RetryPolicy::standard().with_base_delay(300 * MS));
    dispatcher.schedule_update(&fast, json!([2]), RetryPolicy::quick());

    let reports = dispatcher.advance_by(300 * MS);
    let order: Vec<&str> = reports.iter().map(|report| report.widget_id.as_str()).collect();
    // Equal due times run in scheduling order.
    assert_eq!(order, vec!["fast", "slow", "fast"]);
    assert!(reports[0].id > reports[1].id);
    assert_eq!(reports[0].id, reports[2].id);
}

#[test]
fn sankey_updates_accept_nodes_and_links() {
    let widget = ChartWidgetBuilder::new(ChartKind::Sankey).build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    let shaped = json!({
        "nodes": [{"name": "a"}, {"name": "b"}],
        "links": [{"source": "a", "target": "b", "value": 5}],
    });
    dispatcher.schedule_update(&widget, shaped, RetryPolicy::quick());
    let widget = widget.borrow();
    let primary = &widget.config.options["series"][0];
    assert_eq!(primary["data"], json!([{"name": "a"}, {"name": "b"}]));
    assert_eq!(primary["links"][0]["value"], json!(5));
}

#[test]
fn candlestick_updates_refresh_overlays_and_dates() {
    let widget = ChartWidgetBuilder::new(ChartKind::Candlestick)
        .disable_time_range_filters()
        .build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    let rows = json!([
        {"date": "2024-01-03", "open": 11, "close": 12, "low": 10, "high": 13, "volume": 900},
        {"date": "2024-01-02", "open": 10, "close": 11, "low": 9, "high": 12, "volume": 800},
    ]);
    dispatcher.schedule_update(&widget, rows, RetryPolicy::quick());

    let widget = widget.borrow();
    let options = &widget.config.options;
    assert_eq!(options["series"][0]["data"][0], json!([10.0, 11.0, 9.0, 12.0]));
    assert_eq!(options["xAxis"][0]["data"], json!(["2024-01-02", "2024-01-03"]));
    let volume = options["series"]
        .as_array()
        .expect("series")
        .iter()
        .find(|series| series["name"] == json!("Volume"))
        .expect("volume series");
    assert_eq!(volume["data"][1], json!(["2024-01-03", 900.0]));
}

#[test]
fn record_updates_are_coerced_and_leave_extra_series_alone() {
    let widget = ChartWidgetBuilder::new(ChartKind::Bar)
        .add_series(json!({"name": "Target", "type": "line", "data": [9, 9]}))
        .build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    let rows = json!([
        {"name": "A", "value": "not-a-number"},
        {"category": "B", "value": "5"},
        {"value": 2},
    ]);
    dispatcher.schedule_update(&widget, rows.clone(), RetryPolicy::quick());

    let widget = widget.borrow();
    let options = &widget.config.options;
    assert_eq!(
        options["series"][0]["data"],
        json!([
            {"name": "A", "value": 0.0},
            {"name": "B", "value": 5.0},
            {"name": "Unknown", "value": 2.0},
        ])
    );
    assert_eq!(options["series"][1]["name"], json!("Target"));
    assert_eq!(options["series"][1]["data"], json!([9, 9]));
    assert_eq!(options["xAxis"]["data"], json!(["A", "B", "Unknown"]));
    assert_eq!(widget.data, rows);
}

#[test]
fn stacked_record_updates_target_series_by_name() {
    let widget = ChartWidgetBuilder::new(ChartKind::StackedVerticalBar)
        .set_data(json!([
            {"name": "Q1", "stack": "EU", "value": 1},
            {"name": "Q1", "stack": "US", "value": 2},
        ]))
        .transform_data(chart_widgets::api::TransformOptions::default())
        .build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    dispatcher.schedule_update(
        &widget,
        json!([
            {"name": "Q1", "stack": "EU", "value": "7"},
            {"name": "Q1", "stack": "US", "value": 3},
        ]),
        RetryPolicy::quick(),
    );

    let widget = widget.borrow();
    let series = widget.config.options["series"].as_array().expect("series");
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["name"], json!("EU"));
    assert_eq!(series[0]["data"], json!([7.0]));
    assert_eq!(series[1]["data"], json!([3.0]));
}

#[test]
fn zero_attempt_policies_are_read_as_one_attempt() {
    let widget = ChartWidgetBuilder::new(ChartKind::Line).build_shared();
    let mut dispatcher = UpdateDispatcher::new();
    let report =
        dispatcher.schedule_update(&widget, json!([1]), RetryPolicy::quick().with_max_attempts(0));
    assert!(matches!(report.outcome, DispatchOutcome::Exhausted { attempts: 1, .. }));
    assert_eq!(dispatcher.pending_count(), 0);
}

#[test]
fn clamped_policies_always_validate() {
    let broken = RetryPolicy {
        max_attempts: 0,
        base_delay: 5000 * MS,
        growth: RetryGrowth::Exponential { factor: 0.5 },
        max_delay: 2000 * MS,
    };
    assert!(broken.validate().is_err());
    let clamped = broken.clamped();
    assert!(clamped.validate().is_ok());
    assert_eq!(clamped.max_attempts, 1);
    assert_eq!(clamped.base_delay, 2000 * MS);
    assert_eq!(clamped.growth, RetryGrowth::Exponential { factor: 1.0 });
}
