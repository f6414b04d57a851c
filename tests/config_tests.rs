use std::time::Duration;

use chart_widgets::api::{ChartWidgetBuilder, ChartWidgetsConfig, RetryGrowth, RetryPolicy};
use chart_widgets::core::{ChartKind, DisplayLocale, ValueFormatter};
use chart_widgets::error::WidgetError;
use chart_widgets::interaction::OverlayLayout;

#[test]
fn default_config_round_trips() {
    let config = ChartWidgetsConfig::default();
    assert!(config.validate().is_ok());
    let text = config.to_json_pretty().expect("serialize");
    assert!(text.contains("\"retry\""));
    assert!(text.contains("\"en-US\""));
    assert_eq!(ChartWidgetsConfig::from_json_str(&text).expect("parse"), config);
}

#[test]
fn partial_documents_fill_in_defaults() {
    let config = ChartWidgetsConfig::from_json_str(r#"{"locale": "de-DE"}"#).expect("parse");
    assert_eq!(config.locale, DisplayLocale::DeDe);
    assert_eq!(config.retry, RetryPolicy::standard());
    assert_eq!(config.overlay, OverlayLayout::default());

    let config =
        ChartWidgetsConfig::from_json_str(r#"{"overlay": {"pitch": 50}}"#).expect("parse");
    assert_eq!(config.overlay.pitch, 50.0);
    assert_eq!(config.overlay.button_width, 35.0);
}

#[test]
fn retry_policy_reads_milliseconds() {
    let config = ChartWidgetsConfig::from_json_str(
        r#"{"retry": {"maxAttempts": 4, "baseDelay": 250, "growth": {"kind": "linear"}, "maxDelay": 1000}}"#,
    )
    .expect("parse");
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.base_delay, Duration::from_millis(250));
    assert_eq!(config.retry.growth, RetryGrowth::Linear);
}

#[test]
fn invalid_values_are_config_errors() {
    let too_wide = ChartWidgetsConfig::from_json_str(r#"{"overlay": {"buttonWidth": 60}}"#);
    assert!(matches!(too_wide, Err(WidgetError::Config(_))));

    let no_attempts = ChartWidgetsConfig::from_json_str(
        r#"{"retry": {"maxAttempts": 0, "baseDelay": 100, "growth": {"kind": "linear"}, "maxDelay": 2000}}"#,
    );
    assert!(matches!(no_attempts, Err(WidgetError::Config(_))));

    let zero_font = ChartWidgetsConfig::default().with_overlay(OverlayLayout {
        font_size: 0.0,
        ..OverlayLayout::default()
    });
    assert!(zero_font.validate().is_err());

    match ChartWidgetsConfig::from_json_str("{") {
        Err(WidgetError::Config(message)) => assert!(message.starts_with("failed to parse config")),
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn builders_pick_up_locale_and_overlay_geometry() {
    let config = ChartWidgetsConfig::default()
        .with_locale(DisplayLocale::DeDe)
        .with_overlay(OverlayLayout {
            pitch: 60.0,
            ..OverlayLayout::default()
        })
        .with_retry(RetryPolicy::quick());

    let builder = ChartWidgetBuilder::with_config(ChartKind::Candlestick, &config);
    assert_eq!(builder.locale(), DisplayLocale::DeDe);
    let widget = builder.set_currency_formatter("EUR").build();
    assert_eq!(
        widget.config.value_formatter,
        Some(ValueFormatter::currency("EUR", DisplayLocale::DeDe))
    );
    assert_eq!(widget.config.options["graphic"][1]["left"], serde_json::json!(70.0));
}
