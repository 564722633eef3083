//! API client module for the spreadsheet-backed monitoring service.
//!
//! This module provides the `ApiClient` for communicating with the
//! dashboard server - committee login, organization and indicator
//! reference data, and monitoring result reads/writes.
//!
//! The API uses JWT bearer token authentication obtained through the
//! login endpoint; every response is wrapped in a
//! `{status, data, message}` envelope.

pub mod client;
pub mod error;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MonitoringResult, RawRecord};

pub use client::ApiClient;
pub use error::ApiError;

/// The remote store of monitoring results.
///
/// `ApiClient` is the production implementation; the cache and writer
/// depend on this trait so tests can substitute an in-memory repository.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// All monitoring results recorded for an organization
    async fn results_by_organization(&self, org_code: &str) -> Result<Vec<MonitoringResult>>;

    /// Persist one result row; returns the server's optional message
    async fn save_result(&self, record: &RawRecord) -> Result<Option<String>>;
}
