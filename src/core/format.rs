use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{display_string, format_plain_number, lenient_number};

const MAX_FRACTION_DIGITS: u32 = 12;

/// Display locale presets for tooltip and label formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayLocale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "es-ES")]
    EsEs,
    #[serde(rename = "it-IT")]
    ItIt,
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "nl-NL")]
    NlNl,
    #[serde(rename = "ja-JP")]
    JaJp,
}

impl DisplayLocale {
    /// Maps a BCP-47 style tag (`en-US`, `de_DE`, `fr`) to a preset.
    ///
    /// Unknown tags fall back to `en-US`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().replace('_', "-").as_str() {
            "en-gb" | "gb" | "uk" => Self::EnGb,
            "de" | "de-de" | "de-at" | "de-ch" | "german" => Self::DeDe,
            "fr" | "fr-fr" | "fr-ca" => Self::FrFr,
            "es" | "es-es" | "es-mx" => Self::EsEs,
            "it" | "it-it" => Self::ItIt,
            "pt" | "pt-br" | "pt-pt" => Self::PtBr,
            "nl" | "nl-nl" => Self::NlNl,
            "ja" | "ja-jp" => Self::JaJp,
            _ => Self::EnUs,
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::DeDe => "de-DE",
            Self::FrFr => "fr-FR",
            Self::EsEs => "es-ES",
            Self::ItIt => "it-IT",
            Self::PtBr => "pt-BR",
            Self::NlNl => "nl-NL",
            Self::JaJp => "ja-JP",
        }
    }

    fn num_locale(self) -> &'static Locale {
        match self {
            Self::EnUs => &Locale::en,
            Self::EnGb => &Locale::en_GB,
            Self::DeDe => &Locale::de,
            Self::FrFr => &Locale::fr,
            Self::EsEs => &Locale::es,
            Self::ItIt => &Locale::it,
            Self::PtBr => &Locale::pt,
            Self::NlNl => &Locale::nl,
            Self::JaJp => &Locale::ja,
        }
    }

    fn currency_symbol_leads(self) -> bool {
        matches!(self, Self::EnUs | Self::EnGb | Self::JaJp | Self::PtBr | Self::NlNl)
    }
}

/// Value formatter installed into tooltips and labels.
///
/// Formatters stay declarative so the configuration tree remains plain data.
/// Hosts either call [`ValueFormatter::format`] directly or translate the
/// serialized descriptor into an engine callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueFormatter {
    Currency {
        currency: String,
        locale: DisplayLocale,
    },
    Percentage {
        decimals: u32,
    },
    Number {
        decimals: u32,
        locale: DisplayLocale,
    },
}

impl ValueFormatter {
    #[must_use]
    pub fn currency(currency: impl Into<String>, locale: DisplayLocale) -> Self {
        Self::Currency {
            currency: currency.into().to_ascii_uppercase(),
            locale,
        }
    }

    #[must_use]
    pub fn percentage(decimals: u32) -> Self {
        Self::Percentage { decimals }
    }

    #[must_use]
    pub fn number(decimals: u32, locale: DisplayLocale) -> Self {
        Self::Number { decimals, locale }
    }

    /// Formats one value.
    #[must_use]
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return "NaN".to_owned();
        }
        match self {
            Self::Currency { currency, locale } => format_currency(value, currency, *locale),
            Self::Percentage { decimals } => {
                format!("{}%", fixed_with_separator(value, *decimals, "."))
            }
            Self::Number { decimals, locale } => group_fixed(value, *decimals, *locale),
        }
    }

    /// Renders tooltip text for one engine tooltip payload.
    ///
    /// Axis tooltips receive an array of points, item tooltips a single one.
    #[must_use]
    pub fn format_tooltip(&self, params: &Value) -> String {
        match params {
            Value::Array(points) => points
                .iter()
                .map(|point| {
                    format!(
                        "{}<br/>{}: {}",
                        label_of(point, "seriesName"),
                        label_of(point, "name"),
                        self.format(lenient_number(point.get("value")).value)
                    )
                })
                .collect::<Vec<_>>()
                .join("<br/>"),
            point => format!(
                "{}: {}",
                label_of(point, "name"),
                self.format(lenient_number(point.get("value")).value)
            ),
        }
    }

    /// Descriptor written into the configuration tree.
    #[must_use]
    pub fn descriptor(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn label_of(point: &Value, key: &str) -> String {
    point.get(key).map(display_string).unwrap_or_default()
}

fn format_currency(value: f64, currency: &str, locale: DisplayLocale) -> String {
    let (symbol, decimals) = match currency {
        "USD" => ("$", 2),
        "EUR" => ("€", 2),
        "GBP" => ("£", 2),
        "JPY" => ("¥", 0),
        "INR" => ("₹", 2),
        "CNY" => ("CN¥", 2),
        "BRL" => ("R$", 2),
        "CHF" => ("CHF", 2),
        other => (other, 2),
    };
    let magnitude = group_fixed(value.abs(), decimals, locale);
    let sign = if value < 0.0 && magnitude.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    if locale.currency_symbol_leads() {
        let gap = if symbol.chars().all(char::is_alphabetic)
            || matches!(locale, DisplayLocale::PtBr | DisplayLocale::NlNl)
        {
            " "
        } else {
            ""
        };
        format!("{sign}{symbol}{gap}{magnitude}")
    } else {
        format!("{sign}{magnitude} {symbol}")
    }
}

fn round_fixed(value: f64, decimals: u32) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
}

/// Fixed decimals with half-away-from-zero rounding and no grouping.
fn fixed_with_separator(value: f64, decimals: u32, separator: &str) -> String {
    let decimals = decimals.min(MAX_FRACTION_DIGITS);
    match round_fixed(value, decimals) {
        Some(rounded) => {
            let (negative, int_part, frac) = split_fixed(rounded, decimals);
            let mut out = String::new();
            if negative {
                out.push('-');
            }
            out.push_str(&int_part.to_string());
            if let Some(frac) = frac {
                out.push_str(separator);
                out.push_str(&frac);
            }
            out
        }
        None => format_plain_number(value),
    }
}

/// Fixed decimals with the locale's grouping and decimal separators.
fn group_fixed(value: f64, decimals: u32, locale: DisplayLocale) -> String {
    let decimals = decimals.min(MAX_FRACTION_DIGITS);
    let Some(rounded) = round_fixed(value, decimals) else {
        return format_plain_number(value);
    };
    let num_locale = locale.num_locale();
    let (negative, int_part, frac) = split_fixed(rounded, decimals);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&int_part.to_formatted_string(num_locale));
    if let Some(frac) = frac {
        out.push_str(num_locale.decimal());
        out.push_str(&frac);
    }
    out
}

fn split_fixed(rounded: Decimal, decimals: u32) -> (bool, u64, Option<String>) {
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let int_part = abs.trunc().to_u64().unwrap_or(u64::MAX);
    if decimals == 0 {
        return (negative, int_part, None);
    }
    let scale = Decimal::from(10_u64.pow(decimals));
    let frac_digits = (abs.fract() * scale).round().to_u64().unwrap_or(0);
    let width = decimals as usize;
    (negative, int_part, Some(format!("{frac_digits:0width$}")))
}
