//! In-memory result cache with durable fallback.
//!
//! Two levels: per-organization result lists and per-indicator monthly
//! maps. Reads prefer memory, then the network, then the durable store;
//! the remote repository stays authoritative and every failure on this
//! path degrades silently.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::api::ResultRepository;
use crate::models::{MonitoringResult, MonthlyResults, RawRecord};

use super::store::{
    monthly_results_key, org_results_key, parse_record_key, record_key, LocalStore,
    MONTHLY_RESULTS_PREFIX, ORG_RESULTS_PREFIX, RECORD_PREFIX,
};

/// Build the twelve-slot monthly map for one indicator from an
/// organization's result list.
///
/// Candidates are matched by normalized indicator id, ordered newest
/// first (missing timestamps last; equal timestamps resolve to the later
/// row), and folded with first-write-per-month-wins so an older row never
/// shadows a newer one.
pub fn build_monthly_map(records: &[MonitoringResult], indicator_id: &str) -> MonthlyResults {
    let mut candidates: Vec<(usize, &MonitoringResult)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.matches_indicator(indicator_id))
        .collect();

    candidates.sort_by(|(ia, a), (ib, b)| {
        b.eval_time().cmp(&a.eval_time()).then_with(|| ib.cmp(ia))
    });

    let mut map = MonthlyResults::default();
    let mut seen = [false; 12];
    for (_, record) in candidates {
        let Some(month) = record.month_number() else {
            continue;
        };
        let slot = (month - 1) as usize;
        if !seen[slot] {
            seen[slot] = true;
            map.set(month, record.value);
        }
    }
    map
}

/// Cached monitoring results for the organizations a committee works on
pub struct ResultCache {
    store: LocalStore,
    org_results: HashMap<String, Vec<MonitoringResult>>,
    monthly: HashMap<String, MonthlyResults>,
}

impl ResultCache {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            org_results: HashMap::new(),
            monthly: HashMap::new(),
        }
    }

    fn monthly_key(org_code: &str, indicator_id: &str) -> String {
        format!("{}_{}", org_code, indicator_id)
    }

    /// Rebuild the in-memory caches from the durable store.
    ///
    /// Single-record entries saved at write time are folded in first;
    /// whole-list and monthly-map snapshots then overwrite them. Malformed
    /// entries are skipped, never fatal.
    pub fn restore(&mut self) {
        let keys = self.store.keys();

        for key in keys.iter().filter(|k| k.starts_with(RECORD_PREFIX)) {
            let Some((org_code, indicator_id, month)) = parse_record_key(key) else {
                warn!(key, "Unrecognized record key, skipping");
                continue;
            };
            let raw: RawRecord = match self.store.load(key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key, error = %e, "Failed to restore saved record, skipping");
                    continue;
                }
            };

            let mut raw = raw;
            // The key is authoritative for entries the web client wrote,
            // which omit these fields in the body
            raw.indicator_id.get_or_insert_with(|| indicator_id.to_string());
            raw.organization_code.get_or_insert_with(|| org_code.to_string());
            raw.month.get_or_insert_with(|| month.to_string());

            let Some(record) = MonitoringResult::from_raw(raw) else {
                continue;
            };

            let list = self.org_results.entry(org_code.to_string()).or_default();
            match list
                .iter_mut()
                .find(|r| r.indicator_id == record.indicator_id && r.month == record.month)
            {
                Some(existing) => *existing = record.clone(),
                None => list.push(record.clone()),
            }

            if let Some(month) = record.month_number() {
                self.monthly
                    .entry(Self::monthly_key(org_code, indicator_id))
                    .or_default()
                    .set(month, record.value);
            }
        }

        for key in keys.iter().filter(|k| k.starts_with(ORG_RESULTS_PREFIX)) {
            let Some(org_code) = key.strip_prefix(ORG_RESULTS_PREFIX) else {
                continue;
            };
            match self.store.load::<Vec<RawRecord>>(key) {
                Ok(Some(raws)) => {
                    let records: Vec<MonitoringResult> =
                        raws.into_iter().filter_map(MonitoringResult::from_raw).collect();
                    self.org_results.insert(org_code.to_string(), records);
                }
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "Failed to restore organization results, skipping"),
            }
        }

        for key in keys.iter().filter(|k| k.starts_with(MONTHLY_RESULTS_PREFIX)) {
            let Some(mem_key) = key.strip_prefix(MONTHLY_RESULTS_PREFIX) else {
                continue;
            };
            match self.store.load::<MonthlyResults>(key) {
                Ok(Some(map)) => {
                    self.monthly.insert(mem_key.to_string(), map);
                }
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "Failed to restore monthly map, skipping"),
            }
        }

        debug!(
            organizations = self.org_results.len(),
            monthly_maps = self.monthly.len(),
            "Result cache restored from disk"
        );
    }

    /// All results for an organization: memory first, then the repository,
    /// then the durable copy. Never fails - a dead network with no local
    /// copy yields an empty list.
    pub async fn organization_results(
        &mut self,
        repo: &dyn ResultRepository,
        org_code: &str,
    ) -> Vec<MonitoringResult> {
        if let Some(list) = self.org_results.get(org_code) {
            if !list.is_empty() {
                return list.clone();
            }
        }

        match repo.results_by_organization(org_code).await {
            Ok(results) => {
                debug!(org_code, count = results.len(), "Results fetched from repository");
                self.org_results.insert(org_code.to_string(), results.clone());

                let raws: Vec<RawRecord> = results.iter().map(|r| r.to_raw()).collect();
                if let Err(e) = self.store.save(&org_results_key(org_code), &raws) {
                    warn!(org_code, error = %e, "Failed to persist organization results");
                }

                results
            }
            Err(e) => {
                warn!(org_code, error = %e, "Repository read failed, using local copy");
                match self.store.load::<Vec<RawRecord>>(&org_results_key(org_code)) {
                    Ok(Some(raws)) => raws
                        .into_iter()
                        .filter_map(MonitoringResult::from_raw)
                        .collect(),
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        warn!(org_code, error = %e, "Local copy unreadable");
                        Vec::new()
                    }
                }
            }
        }
    }

    /// The twelve-slot monthly map for one indicator.
    ///
    /// Served from the monthly cache when present; otherwise rebuilt from
    /// the organization's result list and cached/persisted only when it
    /// holds at least one real result.
    pub async fn monthly_results(
        &mut self,
        repo: &dyn ResultRepository,
        org_code: &str,
        indicator_id: &str,
    ) -> MonthlyResults {
        let mem_key = Self::monthly_key(org_code, indicator_id);
        if let Some(map) = self.monthly.get(&mem_key) {
            return map.clone();
        }

        let records = self.organization_results(repo, org_code).await;
        let map = build_monthly_map(&records, indicator_id);

        if map.has_any_checked() {
            self.monthly.insert(mem_key, map.clone());
            let key = monthly_results_key(org_code, indicator_id);
            if let Err(e) = self.store.save(&key, &map) {
                warn!(org_code, indicator_id, error = %e, "Failed to persist monthly map");
            }
        }

        map
    }

    /// Drop every cache entry touching (organization, indicator), in
    /// memory and on disk. Must run after each successful write so the
    /// next read comes from the repository.
    pub fn invalidate(&mut self, org_code: &str, indicator_id: &str) {
        debug!(org_code, indicator_id, "Invalidating result cache");

        self.monthly.remove(&Self::monthly_key(org_code, indicator_id));
        self.org_results.remove(org_code);

        if let Err(e) = self.store.remove(&monthly_results_key(org_code, indicator_id)) {
            warn!(error = %e, "Failed to remove persisted monthly map");
        }
        if let Err(e) = self.store.remove(&org_results_key(org_code)) {
            warn!(error = %e, "Failed to remove persisted organization results");
        }
    }

    /// Persist one saved row for offline recovery on next startup
    pub fn remember_record(&self, record: &MonitoringResult) {
        let key = record_key(
            &record.organization_code,
            &record.indicator_id,
            &record.month,
        );
        if let Err(e) = self.store.save(&key, &record.to_raw()) {
            warn!(key, error = %e, "Failed to persist saved record");
        }
    }
}
