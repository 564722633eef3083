//! Watchboard - the client core of a committee monitoring dashboard.
//!
//! Authenticated reviewers ("committees") select an organization they
//! oversee and record periodic compliance checks ("indicators") against a
//! spreadsheet-backed API. This crate owns everything between the wire
//! and the view layer:
//!
//! - [`api`]: the HTTP client and the [`api::ResultRepository`] seam
//! - [`cache`]: in-memory result caching with a durable JSON fallback
//! - [`reconcile`]: cadence classification and window aggregation
//! - [`writer`]: the validate → submit → invalidate → resync command
//! - [`summary`] / [`board`]: derived counts, cards, and detail grids
//! - [`session`]: the session-scoped context tying it all together
//!
//! The remote repository stays authoritative throughout; the local store
//! is a convenience for offline reads and never surfaces its failures.

pub mod api;
pub mod board;
pub mod cache;
pub mod config;
pub mod models;
pub mod reconcile;
pub mod session;
pub mod summary;
pub mod utils;
pub mod writer;

pub use api::{ApiClient, ApiError, ResultRepository};
pub use board::{DetailCells, IndicatorCard, IndicatorDetail, MonthCell, WindowCell};
pub use cache::{LocalStore, ResultCache};
pub use config::Config;
pub use models::{
    Indicator, IndicatorCategory, MonitoringResult, MonthlyResults, OrgRole, Organization,
    RawRecord, ResultValue,
};
pub use reconcile::{DisplayMode, Period, Window};
pub use session::{Committee, MonitoringSession, Session, SessionData};
pub use summary::PeriodSummary;
pub use writer::{EditTarget, ResultDraft, SaveOutcome, WriterError};
