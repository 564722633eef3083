//! Period-level progress counts for the summary sidebar.
//!
//! Counts are always re-derived from the full per-organization result
//! cache. Incrementally patching counters after a save drifts from the
//! underlying records, so there is deliberately no update path.

use crate::api::ResultRepository;
use crate::cache::{build_monthly_map, ResultCache};
use crate::models::{Indicator, ResultValue};
use crate::reconcile::{aggregate_months, Period, Window};

/// Fulfilled/unfulfilled/not-applicable counts for one period tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodSummary {
    pub fulfilled: usize,
    pub unfulfilled: usize,
    pub not_applicable: usize,
    pub checked: usize,
    pub total: usize,
}

impl PeriodSummary {
    /// Rounded completion percentage, 0 for an empty indicator list
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.checked as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// An indicator's period-level status: the first-quarter tab only looks
/// at months 1-3, every other tab at the whole year.
fn period_status(
    cache_map: &crate::models::MonthlyResults,
    period: Period,
) -> ResultValue {
    match period {
        Period::FirstQuarter => aggregate_months(cache_map, Window::FirstQuarter.months()),
        _ => aggregate_months(cache_map, 1..=12),
    }
}

/// Recompute the summary for the given indicators from the organization's
/// full result list.
pub async fn recompute(
    repo: &dyn ResultRepository,
    cache: &mut ResultCache,
    org_code: &str,
    period: Period,
    indicators: &[Indicator],
) -> PeriodSummary {
    let mut summary = PeriodSummary {
        total: indicators.len(),
        ..Default::default()
    };
    if indicators.is_empty() {
        return summary;
    }

    let records = cache.organization_results(repo, org_code).await;

    for indicator in indicators {
        let map = build_monthly_map(&records, &indicator.id);
        match period_status(&map, period) {
            ResultValue::Fulfilled => {
                summary.fulfilled += 1;
                summary.checked += 1;
            }
            ResultValue::Unfulfilled => {
                summary.unfulfilled += 1;
                summary.checked += 1;
            }
            ResultValue::NotApplicable => {
                summary.not_applicable += 1;
                summary.checked += 1;
            }
            ResultValue::Unchecked => {}
        }
    }

    summary
}
