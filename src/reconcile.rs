//! Period reconciliation: cadence classification and window aggregation.
//!
//! Everything here is a pure function over indicator metadata and a
//! [`MonthlyResults`] map - no I/O, no cache access - so the display rules
//! can be tested directly.

use serde::{Deserialize, Serialize};

use crate::models::{Indicator, MonthlyResults, ResultValue};

/// The period tab the committee is viewing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "매월")]
    Monthly,
    #[serde(rename = "반기")]
    Semiannual,
    #[serde(rename = "1~3월")]
    FirstQuarter,
    #[serde(rename = "연중")]
    Yearly,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Period::Monthly => "매월",
            Period::Semiannual => "반기",
            Period::FirstQuarter => "1~3월",
            Period::Yearly => "연중",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "매월" => Some(Period::Monthly),
            "반기" => Some(Period::Semiannual),
            "1~3월" => Some(Period::FirstQuarter),
            "연중" => Some(Period::Yearly),
            _ => None,
        }
    }
}

/// An aggregation window over the monthly map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    FirstQuarter,
    FirstHalf,
    SecondHalf,
}

impl Window {
    pub fn months(&self) -> std::ops::RangeInclusive<u32> {
        match self {
            Window::FirstQuarter => 1..=3,
            Window::FirstHalf => 1..=6,
            Window::SecondHalf => 7..=12,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Window::FirstQuarter => "1~3월",
            Window::FirstHalf => "상반기(1~6월)",
            Window::SecondHalf => "하반기(7~12월)",
        }
    }
}

/// How an indicator's results are presented for the current period tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Single first-quarter window cell
    FirstQuarter,
    /// First-half and second-half window cells
    Semiannual,
    /// Standing flag; results are shown but never window-aggregated
    Yearly,
    /// Twelve independent month cells
    Monthly,
}

/// Classify how an indicator is displayed and edited on the given tab.
///
/// Priority order matters and is part of the product's behavior: the
/// first-quarter tab overrides everything, semiannual markers beat the
/// yearly category, and monthly is the fallback.
pub fn classify(indicator: &Indicator, period: Period) -> DisplayMode {
    if period == Period::FirstQuarter {
        return DisplayMode::FirstQuarter;
    }
    if indicator.is_semiannual() || (period == Period::Semiannual && !indicator.is_yearly()) {
        return DisplayMode::Semiannual;
    }
    if indicator.is_yearly() {
        return DisplayMode::Yearly;
    }
    DisplayMode::Monthly
}

/// Reduce a window of monthly values to one display value.
///
/// Precedence favors the best recorded outcome: fulfilled beats
/// unfulfilled beats not-applicable beats unchecked, regardless of which
/// months hold which. This matches the recorded data's existing
/// interpretation and must not change.
pub fn aggregate_window(map: &MonthlyResults, window: Window) -> ResultValue {
    aggregate_months(map, window.months())
}

/// Precedence fold over an arbitrary month range; `aggregate_window` and
/// the period summary both reduce through here.
pub fn aggregate_months(
    map: &MonthlyResults,
    months: std::ops::RangeInclusive<u32>,
) -> ResultValue {
    let mut has_fulfilled = false;
    let mut has_unfulfilled = false;
    let mut has_na = false;

    for month in months {
        match map.get(month) {
            ResultValue::Fulfilled => has_fulfilled = true,
            ResultValue::Unfulfilled => has_unfulfilled = true,
            ResultValue::NotApplicable => has_na = true,
            ResultValue::Unchecked => {}
        }
    }

    if has_fulfilled {
        ResultValue::Fulfilled
    } else if has_unfulfilled {
        ResultValue::Unfulfilled
    } else if has_na {
        ResultValue::NotApplicable
    } else {
        ResultValue::Unchecked
    }
}

/// Monthly cells are editable only up to the current calendar month.
/// Window cells are always editable; that asymmetry is intentional.
pub fn month_editable(month: u32, current_month: u32) -> bool {
    (1..=12).contains(&month) && month <= current_month
}
