use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::WidgetError;

/// Look-back window offered by the candlestick time-range strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "5D")]
    FiveDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "MAX")]
    Max,
}

impl TimeRange {
    pub const ALL: [Self; 10] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::YearToDate,
        Self::OneYear,
        Self::ThreeYears,
        Self::FiveYears,
        Self::Max,
    ];

    pub const DEFAULT_SELECTED: Self = Self::OneYear;

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::FiveDays => "5D",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::YearToDate => "YTD",
            Self::OneYear => "1Y",
            Self::ThreeYears => "3Y",
            Self::FiveYears => "5Y",
            Self::Max => "MAX",
        }
    }

    /// First date covered when the window ends at `end`.
    ///
    /// `None` means unbounded (`MAX`) or a date chrono cannot represent.
    #[must_use]
    pub fn window_start(self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::OneDay => end.checked_sub_days(Days::new(1)),
            Self::FiveDays => end.checked_sub_days(Days::new(5)),
            Self::OneMonth => end.checked_sub_months(Months::new(1)),
            Self::ThreeMonths => end.checked_sub_months(Months::new(3)),
            Self::SixMonths => end.checked_sub_months(Months::new(6)),
            Self::YearToDate => NaiveDate::from_ymd_opt(end.year(), 1, 1),
            Self::OneYear => end.checked_sub_months(Months::new(12)),
            Self::ThreeYears => end.checked_sub_months(Months::new(36)),
            Self::FiveYears => end.checked_sub_months(Months::new(60)),
            Self::Max => None,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| WidgetError::InvalidData(format!("unknown time range `{s}`")))
    }
}

/// Time-range strip state published on the widget for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeFilters {
    pub ranges: Vec<TimeRange>,
    pub selected_range: TimeRange,
}

impl Default for TimeRangeFilters {
    fn default() -> Self {
        Self {
            ranges: TimeRange::ALL.to_vec(),
            selected_range: TimeRange::DEFAULT_SELECTED,
        }
    }
}
