//! Derived view data for the indicator list and detail panes.
//!
//! Nothing here renders; these functions reduce indicator metadata plus
//! cache lookups into plain structs a view layer paints from.

use std::collections::HashMap;

use crate::models::{
    Characteristic, CheckMethod, Indicator, MonitoringResult, MonthlyResults, ResultValue,
};
use crate::reconcile::{aggregate_window, classify, month_editable, DisplayMode, Period, Window};
use crate::utils::month_label;

/// Sidebar entry for one indicator: its latest status plus the
/// presentation flags the card styling keys off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorCard {
    pub indicator_id: String,
    pub code: String,
    pub name: String,
    pub status: ResultValue,
    pub status_month: Option<u32>,
    pub yearly: bool,
    pub special: bool,
    pub semiannual: bool,
    pub evaluation_linked: bool,
}

impl IndicatorCard {
    /// Status label as the sidebar shows it, e.g. `충족 (4월)`
    pub fn status_label(&self) -> String {
        match self.status_month {
            Some(month) => format!("{} ({})", self.status, month_label(month)),
            None => self.status.to_string(),
        }
    }
}

/// Pick the result shown on an indicator's card: the current month's
/// newest record when one exists, otherwise the newest overall.
fn card_status(results: &mut Vec<&MonitoringResult>, current_month: u32) -> (ResultValue, Option<u32>) {
    if results.is_empty() {
        return (ResultValue::Unchecked, None);
    }

    results.sort_by(|a, b| b.eval_time().cmp(&a.eval_time()));

    let chosen = results
        .iter()
        .find(|r| r.month_number() == Some(current_month))
        .or_else(|| results.first());

    match chosen {
        Some(r) => (r.value, r.month_number()),
        None => (ResultValue::Unchecked, None),
    }
}

/// Build the sidebar card list for a period tab
pub fn build_cards(
    indicators: &[Indicator],
    results: &[MonitoringResult],
    period: Period,
    current_month: u32,
) -> Vec<IndicatorCard> {
    // Group once so each card lookup is cheap
    let mut by_indicator: HashMap<&str, Vec<&MonitoringResult>> = HashMap::new();
    for result in results {
        by_indicator
            .entry(result.indicator_id.as_str())
            .or_default()
            .push(result);
    }

    indicators
        .iter()
        .map(|indicator| {
            let mut candidates = by_indicator
                .get(indicator.id.as_str())
                .cloned()
                .unwrap_or_default();
            let (status, status_month) = card_status(&mut candidates, current_month);

            let semiannual = indicator.is_semiannual()
                || (period == Period::Semiannual && !indicator.is_yearly());

            IndicatorCard {
                indicator_id: indicator.id.clone(),
                code: indicator.code.clone(),
                name: indicator.name.clone(),
                status,
                status_month,
                yearly: indicator.is_yearly(),
                special: indicator.is_special(),
                semiannual,
                evaluation_linked: indicator.evaluation_linked,
            }
        })
        .collect()
}

/// Sidebar status right after a save: the current month's cached value
/// takes precedence over whatever was just written for another month.
pub fn sidebar_status_after_save(
    monthly: &MonthlyResults,
    saved_value: ResultValue,
    saved_month: Option<u32>,
    current_month: u32,
) -> (ResultValue, Option<u32>) {
    let current = monthly.get(current_month);
    if current.is_checked() {
        return (current, Some(current_month));
    }
    (saved_value, saved_month)
}

/// One month cell in the monthly grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCell {
    pub month: u32,
    pub value: ResultValue,
    pub editable: bool,
}

/// One aggregated window cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCell {
    pub window: Window,
    pub value: ResultValue,
}

/// The detail pane's grid, shaped by the indicator's display mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailCells {
    /// Twelve cells, editable up to the current month
    Monthly(Vec<MonthCell>),
    /// Aggregated windows; always editable
    Windows(Vec<WindowCell>),
    /// Yearly indicators show a standing flag, nothing to aggregate
    YearlyFlag,
}

/// Everything the detail pane needs for one indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorDetail {
    pub indicator_id: String,
    pub mode: DisplayMode,
    pub cells: DetailCells,
    pub characteristic: Option<Characteristic>,
    pub check_method: CheckMethod,
}

/// Build the detail pane data for one indicator on the given tab
pub fn build_detail(
    indicator: &Indicator,
    monthly: &MonthlyResults,
    period: Period,
    current_month: u32,
) -> IndicatorDetail {
    let mode = classify(indicator, period);

    let cells = match mode {
        DisplayMode::FirstQuarter => DetailCells::Windows(vec![WindowCell {
            window: Window::FirstQuarter,
            value: aggregate_window(monthly, Window::FirstQuarter),
        }]),
        DisplayMode::Semiannual => DetailCells::Windows(vec![
            WindowCell {
                window: Window::FirstHalf,
                value: aggregate_window(monthly, Window::FirstHalf),
            },
            WindowCell {
                window: Window::SecondHalf,
                value: aggregate_window(monthly, Window::SecondHalf),
            },
        ]),
        DisplayMode::Yearly => DetailCells::YearlyFlag,
        DisplayMode::Monthly => DetailCells::Monthly(
            monthly
                .iter()
                .map(|(month, value)| MonthCell {
                    month,
                    value,
                    editable: month_editable(month, current_month),
                })
                .collect(),
        ),
    };

    IndicatorDetail {
        indicator_id: indicator.id.clone(),
        mode,
        cells,
        characteristic: indicator.characteristic(),
        check_method: indicator.check_method(),
    }
}
