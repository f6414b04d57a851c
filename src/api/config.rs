use serde::{Deserialize, Serialize};

use crate::core::DisplayLocale;
use crate::error::{WidgetError, WidgetResult};
use crate::interaction::OverlayLayout;

use super::update_dispatcher::RetryPolicy;

/// Library-wide settings a dashboard host loads once.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartWidgetsConfig {
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub overlay: OverlayLayout,
    #[serde(default)]
    pub locale: DisplayLocale,
}

impl ChartWidgetsConfig {
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayLayout) -> Self {
        self.overlay = overlay;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: DisplayLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn validate(&self) -> WidgetResult<()> {
        self.retry.validate()?;
        let overlay = &self.overlay;
        let sizes = [
            ("pitch", overlay.pitch),
            ("buttonWidth", overlay.button_width),
            ("buttonHeight", overlay.button_height),
            ("fontSize", overlay.font_size),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(WidgetError::Config(format!(
                    "overlay {name} must be finite and > 0"
                )));
            }
        }
        if overlay.button_width > overlay.pitch {
            return Err(WidgetError::Config(
                "overlay buttonWidth must not exceed pitch".to_owned(),
            ));
        }
        Ok(())
    }

    /// Serializes config to pretty JSON for config files.
    pub fn to_json_pretty(self) -> WidgetResult<String> {
        serde_json::to_string_pretty(&self)
            .map_err(|e| WidgetError::Config(format!("failed to serialize config: {e}")))
    }

    /// Parses and validates config from JSON.
    pub fn from_json_str(input: &str) -> WidgetResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| WidgetError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
