//! Session management for the authenticated committee.
//!
//! `SessionData` holds the bearer token and committee identity returned
//! by login; `Session` persists it across restarts. `MonitoringSession`
//! is the session-scoped context the rest of the crate works through:
//! the selected organization, the current period tab, the loaded
//! indicator list, and the result cache. It replaces what the web
//! dashboard kept in module-level globals.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ResultRepository;
use crate::board::{build_cards, build_detail, IndicatorCard, IndicatorDetail};
use crate::cache::{LocalStore, ResultCache};
use crate::models::{Indicator, Organization};
use crate::reconcile::Period;
use crate::summary::{self, PeriodSummary};
use crate::utils::kst_current_month;
use crate::writer::{self, ResultDraft, SaveOutcome, WriterError};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token expiry in hours; the server signs JWTs with a 24h lifetime
const TOKEN_EXPIRY_HOURS: i64 = 24;

/// The authenticated reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    pub name: String,
    pub id: String,
    pub role: String,
}

impl Committee {
    /// The master account sees every organization
    pub fn is_master(&self) -> bool {
        self.role == "master"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub committee: Committee,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        let expiry = self.created_at + Duration::hours(TOKEN_EXPIRY_HOURS);
        Utc::now() > expiry
    }
}

/// Disk-persisted session, so a restart within the token's lifetime
/// skips the login screen.
pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk; returns true when a live session was found
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if session is valid
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

/// Session-scoped monitoring state: one selected organization, one period
/// tab, the indicators loaded for it, and the result cache.
///
/// Created after login, dropped on logout. Changing organization resets
/// the tab state; the caches are keyed by organization code and stay
/// coherent across the switch.
pub struct MonitoringSession {
    cache: ResultCache,
    pub organization: Option<Organization>,
    pub period: Period,
    indicators: Vec<Indicator>,
}

impl MonitoringSession {
    /// Build the context and fold any persisted results back into the
    /// cache for offline use.
    pub fn new(store: LocalStore) -> Self {
        let mut cache = ResultCache::new(store);
        cache.restore();
        Self {
            cache,
            organization: None,
            period: Period::default(),
            indicators: Vec::new(),
        }
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Select the organization to monitor. Resets the period tab and the
    /// loaded indicator list.
    pub fn select_organization(&mut self, organization: Organization) {
        debug!(code = %organization.code, "Organization selected");
        self.organization = Some(organization);
        self.period = Period::default();
        self.indicators.clear();
    }

    /// Switch the period tab, replacing the indicator list with the one
    /// fetched for it.
    pub fn set_period(&mut self, period: Period, indicators: Vec<Indicator>) {
        debug!(period = period.label(), count = indicators.len(), "Period selected");
        self.period = period;
        self.indicators = indicators;
    }

    fn selected_org_code(&self) -> Option<String> {
        self.organization.as_ref().map(|o| o.code.clone())
    }

    /// Sidebar cards for the loaded indicators
    pub async fn cards(&mut self, repo: &dyn ResultRepository) -> Vec<IndicatorCard> {
        let Some(org_code) = self.selected_org_code() else {
            return Vec::new();
        };
        let results = self.cache.organization_results(repo, &org_code).await;
        build_cards(&self.indicators, &results, self.period, kst_current_month())
    }

    /// Detail pane data for one loaded indicator
    pub async fn detail(
        &mut self,
        repo: &dyn ResultRepository,
        indicator_id: &str,
    ) -> Option<IndicatorDetail> {
        let org_code = self.selected_org_code()?;
        let indicator = self.indicators.iter().find(|i| i.id == indicator_id)?.clone();
        let monthly = self.cache.monthly_results(repo, &org_code, indicator_id).await;
        Some(build_detail(&indicator, &monthly, self.period, kst_current_month()))
    }

    /// Submit a result edit for one loaded indicator, then recompute the
    /// period summary from the refreshed cache.
    pub async fn submit_result(
        &mut self,
        repo: &dyn ResultRepository,
        indicator_id: &str,
        draft: &ResultDraft,
    ) -> Result<SaveOutcome, WriterError> {
        let indicator = self.indicators.iter().find(|i| i.id == indicator_id).cloned();
        let mut outcome = writer::submit(
            repo,
            &mut self.cache,
            self.organization.as_ref(),
            indicator.as_ref(),
            draft,
        )
        .await?;

        outcome.summary = Some(self.period_summary(repo).await);
        Ok(outcome)
    }

    /// Period summary, always re-derived from the full organization cache
    pub async fn period_summary(&mut self, repo: &dyn ResultRepository) -> PeriodSummary {
        let Some(org_code) = self.selected_org_code() else {
            return PeriodSummary::default();
        };
        summary::recompute(repo, &mut self.cache, &org_code, self.period, &self.indicators).await
    }
}
