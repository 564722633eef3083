//! Result submission: validate, write, invalidate, resynchronize.
//!
//! `submit` is the single command handler behind the save button and the
//! window-edit modal. It never retries on its own; a failed save leaves
//! every cache intact and the operation re-triable.

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::ResultRepository;
use crate::board::sidebar_status_after_save;
use crate::cache::ResultCache;
use crate::models::{Indicator, MonitoringResult, MonthlyResults, Organization, RawRecord, ResultValue};
use crate::reconcile::Window;
use crate::summary::PeriodSummary;
use crate::utils::{kst_current_month, kst_now_string, month_label};

/// User-facing save failures. Messages surface directly in the dashboard,
/// which speaks Korean.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("기관을 먼저 선택해주세요.")]
    MissingOrganization,

    #[error("지표가 선택되지 않았습니다.")]
    MissingIndicator,

    #[error("점검 결과를 선택해주세요.")]
    MissingValue,

    #[error("유효하지 않은 평가월입니다: {0}")]
    InvalidMonth(u32),

    #[error("저장 중 오류가 발생했습니다: {0}")]
    SubmitFailed(String),
}

/// What a save applies to: one month cell or one aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Month(u32),
    Window(Window),
}

impl EditTarget {
    /// The months a save fans out to
    pub fn months(&self) -> Vec<u32> {
        match self {
            EditTarget::Month(m) => vec![*m],
            EditTarget::Window(w) => w.months().collect(),
        }
    }

    /// Label used in the success notification
    pub fn label(&self) -> String {
        match self {
            EditTarget::Month(m) => month_label(*m),
            EditTarget::Window(w) => w.label().to_string(),
        }
    }
}

/// A result edit as collected from the input form
#[derive(Debug, Clone)]
pub struct ResultDraft {
    pub value: Option<ResultValue>,
    pub opinion: String,
    /// Blank falls back to the organization's own region
    pub region: String,
    pub target: EditTarget,
}

/// Everything the view needs to repaint after a successful save
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Success notification, naming the saved month or window
    pub message: String,
    /// Fresh monthly map, re-read after invalidation
    pub monthly: MonthlyResults,
    pub sidebar_value: ResultValue,
    pub sidebar_month: Option<u32>,
    /// Filled in by the session wrapper, which knows the indicator list
    pub summary: Option<PeriodSummary>,
}

impl SaveOutcome {
    /// Sidebar badge text, e.g. `충족 (4월)`
    pub fn sidebar_label(&self) -> String {
        match self.sidebar_month {
            Some(month) => format!("{} ({})", self.sidebar_value, month_label(month)),
            None => self.sidebar_value.to_string(),
        }
    }
}

/// Validate and submit one result edit, then bring the caches and derived
/// state back in sync.
///
/// A window edit writes the same value to every month in the window as
/// separate rows sharing one timestamp, and succeeds if any of them saved.
/// The cache invalidation happens before the re-read, strictly after the
/// write response resolves.
pub async fn submit(
    repo: &dyn ResultRepository,
    cache: &mut ResultCache,
    organization: Option<&Organization>,
    indicator: Option<&Indicator>,
    draft: &ResultDraft,
) -> Result<SaveOutcome, WriterError> {
    let org = organization.ok_or(WriterError::MissingOrganization)?;
    let ind = indicator.ok_or(WriterError::MissingIndicator)?;
    let value = draft.value.ok_or(WriterError::MissingValue)?;

    if let EditTarget::Month(month) = draft.target {
        if !(1..=12).contains(&month) {
            return Err(WriterError::InvalidMonth(month));
        }
    }

    let region = if draft.region.trim().is_empty() {
        org.region.clone()
    } else {
        draft.region.trim().to_string()
    };

    // One timestamp for the whole fan-out, so the window's rows stay
    // indistinguishable in age
    let timestamp = kst_now_string();
    let months = draft.target.months();

    let mut saved = 0usize;
    let mut last_error: Option<String> = None;

    for month in &months {
        let record = RawRecord {
            organization_id: Some(org.id.clone()),
            organization_code: Some(org.code.clone()),
            organization_name: Some(org.name.clone()),
            indicator_id: Some(ind.id.clone()),
            value: Some(value.as_label().to_string()),
            opinion: Some(draft.opinion.clone()),
            month: Some(month.to_string()),
            evaluated_at: Some(timestamp.clone()),
            category: Some(ind.category.as_label().to_string()),
            region: Some(region.clone()),
        };

        match repo.save_result(&record).await {
            Ok(message) => {
                saved += 1;
                debug!(month, message = message.as_deref().unwrap_or(""), "Result saved");
                if let Some(canonical) = MonitoringResult::from_raw(record) {
                    cache.remember_record(&canonical);
                }
            }
            Err(e) => {
                warn!(month, error = %e, "Result save failed");
                last_error = Some(e.to_string());
            }
        }
    }

    if saved == 0 {
        return Err(WriterError::SubmitFailed(
            last_error.unwrap_or_else(|| "알 수 없는 오류".to_string()),
        ));
    }

    // Read-after-write: drop stale entries before the fresh read
    cache.invalidate(&org.code, &ind.id);
    let monthly = cache.monthly_results(repo, &org.code, &ind.id).await;

    let saved_month = match draft.target {
        EditTarget::Month(m) => Some(m),
        EditTarget::Window(_) => None,
    };
    let (sidebar_value, sidebar_month) =
        sidebar_status_after_save(&monthly, value, saved_month, kst_current_month());

    Ok(SaveOutcome {
        message: format!("{} 결과가 저장되었습니다.", draft.target.label()),
        monthly,
        sidebar_value,
        sidebar_month,
        summary: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::*;
    use crate::cache::LocalStore;
    use crate::models::{IndicatorCategory, OrgRole};
    use crate::reconcile::{aggregate_window, Window};

    /// Repository that actually stores rows, so read-after-write is real
    #[derive(Default)]
    struct MemoryRepo {
        rows: Mutex<Vec<MonitoringResult>>,
        fail_months: Vec<String>,
        save_calls: AtomicUsize,
    }

    #[async_trait]
    impl ResultRepository for MemoryRepo {
        async fn results_by_organization(&self, _org: &str) -> Result<Vec<MonitoringResult>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn save_result(&self, record: &RawRecord) -> Result<Option<String>> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            let month = record.month.clone().unwrap_or_default();
            if self.fail_months.contains(&month) {
                return Err(anyhow!("save failed for month {}", month));
            }
            if let Some(row) = MonitoringResult::from_raw(record.clone()) {
                self.rows.lock().unwrap().push(row);
            }
            Ok(Some("저장되었습니다.".to_string()))
        }
    }

    fn organization() -> Organization {
        Organization {
            id: "1".to_string(),
            code: "ORG1".to_string(),
            name: "복지관".to_string(),
            region: "서울".to_string(),
            role: OrgRole::Main,
        }
    }

    fn indicator(id: &str, code: &str, category: IndicatorCategory) -> Indicator {
        Indicator {
            id: id.to_string(),
            code: code.to_string(),
            name: id.to_string(),
            category,
            description: String::new(),
            evaluation_linked: false,
            common_required: false,
            common_optional: false,
            evaluation_column: false,
            online_check: String::new(),
            onsite_check: String::new(),
        }
    }

    fn draft(value: Option<ResultValue>, target: EditTarget) -> ResultDraft {
        ResultDraft {
            value,
            opinion: String::new(),
            region: String::new(),
            target,
        }
    }

    fn cache() -> (tempfile::TempDir, ResultCache) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf()).unwrap();
        (dir, ResultCache::new(store))
    }

    #[tokio::test]
    async fn test_missing_selection_never_hits_network() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo::default();
        let org = organization();
        let ind = indicator("IND1", "M001", IndicatorCategory::Monthly);
        let d = draft(Some(ResultValue::Fulfilled), EditTarget::Month(4));

        let err = submit(&repo, &mut cache, None, Some(&ind), &d).await.unwrap_err();
        assert!(matches!(err, WriterError::MissingOrganization));

        let err = submit(&repo, &mut cache, Some(&org), None, &d).await.unwrap_err();
        assert!(matches!(err, WriterError::MissingIndicator));

        let no_value = draft(None, EditTarget::Month(4));
        let err = submit(&repo, &mut cache, Some(&org), Some(&ind), &no_value)
            .await
            .unwrap_err();
        assert!(matches!(err, WriterError::MissingValue));

        let bad_month = draft(Some(ResultValue::Fulfilled), EditTarget::Month(13));
        let err = submit(&repo, &mut cache, Some(&org), Some(&ind), &bad_month)
            .await
            .unwrap_err();
        assert!(matches!(err, WriterError::InvalidMonth(13)));

        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_monthly_save_end_to_end() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo::default();
        let org = organization();
        let ind = indicator("IND1", "M001", IndicatorCategory::Monthly);

        // Fresh organization: everything unchecked
        let before = cache.monthly_results(&repo, "ORG1", "IND1").await;
        assert!(!before.has_any_checked());

        let d = draft(Some(ResultValue::Fulfilled), EditTarget::Month(4));
        let outcome = submit(&repo, &mut cache, Some(&org), Some(&ind), &d)
            .await
            .unwrap();

        assert_eq!(outcome.monthly.get(4), ResultValue::Fulfilled);
        assert_eq!(
            outcome.monthly.iter().filter(|(_, v)| v.is_checked()).count(),
            1
        );
        assert_eq!(outcome.sidebar_label(), "충족 (4월)");
        assert!(outcome.message.contains("4월"));

        // Reopening the indicator shows the saved value
        let reread = cache.monthly_results(&repo, "ORG1", "IND1").await;
        assert_eq!(reread.get(4), ResultValue::Fulfilled);
    }

    #[tokio::test]
    async fn test_window_save_fans_out_with_shared_timestamp() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo::default();
        let org = organization();
        let ind = indicator("IND1", "H001", IndicatorCategory::Semiannual);

        let d = draft(
            Some(ResultValue::NotApplicable),
            EditTarget::Window(Window::SecondHalf),
        );
        let outcome = submit(&repo, &mut cache, Some(&org), Some(&ind), &d)
            .await
            .unwrap();

        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 6);
        for month in 7..=12 {
            assert_eq!(outcome.monthly.get(month), ResultValue::NotApplicable);
        }
        for month in 1..=6 {
            assert_eq!(outcome.monthly.get(month), ResultValue::Unchecked);
        }

        let rows = repo.rows.lock().unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.evaluated_at == rows[0].evaluated_at));
    }

    #[tokio::test]
    async fn test_first_half_unfulfilled_scenario() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo::default();
        let org = organization();
        let ind = indicator("H001", "H001", IndicatorCategory::Semiannual);

        let d = draft(
            Some(ResultValue::Unfulfilled),
            EditTarget::Window(Window::FirstHalf),
        );
        let outcome = submit(&repo, &mut cache, Some(&org), Some(&ind), &d)
            .await
            .unwrap();

        for month in 1..=6 {
            assert_eq!(outcome.monthly.get(month), ResultValue::Unfulfilled);
        }
        for month in 7..=12 {
            assert_eq!(outcome.monthly.get(month), ResultValue::Unchecked);
        }
        assert_eq!(
            aggregate_window(&outcome.monthly, Window::FirstHalf),
            ResultValue::Unfulfilled
        );
        assert!(outcome.message.contains("상반기"));
    }

    #[tokio::test]
    async fn test_region_falls_back_to_organization() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo::default();
        let org = organization();
        let ind = indicator("IND1", "M001", IndicatorCategory::Monthly);

        let d = draft(Some(ResultValue::Fulfilled), EditTarget::Month(3));
        submit(&repo, &mut cache, Some(&org), Some(&ind), &d).await.unwrap();

        let rows = repo.rows.lock().unwrap();
        assert_eq!(rows[0].region, "서울");
    }

    #[tokio::test]
    async fn test_total_failure_surfaces_error() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo {
            fail_months: vec!["4".to_string()],
            ..Default::default()
        };
        let org = organization();
        let ind = indicator("IND1", "M001", IndicatorCategory::Monthly);

        let d = draft(Some(ResultValue::Fulfilled), EditTarget::Month(4));
        let err = submit(&repo, &mut cache, Some(&org), Some(&ind), &d)
            .await
            .unwrap_err();
        assert!(matches!(err, WriterError::SubmitFailed(_)));
    }

    #[tokio::test]
    async fn test_partial_window_failure_still_succeeds() {
        let (_dir, mut cache) = cache();
        let repo = MemoryRepo {
            fail_months: vec!["1".to_string(), "2".to_string()],
            ..Default::default()
        };
        let org = organization();
        let ind = indicator("IND1", "H001", IndicatorCategory::Semiannual);

        let d = draft(
            Some(ResultValue::Fulfilled),
            EditTarget::Window(Window::FirstHalf),
        );
        let outcome = submit(&repo, &mut cache, Some(&org), Some(&ind), &d)
            .await
            .unwrap();

        // Months 3-6 landed; the re-read reflects exactly what saved
        assert_eq!(outcome.monthly.get(1), ResultValue::Unchecked);
        assert_eq!(outcome.monthly.get(3), ResultValue::Fulfilled);
    }
}
