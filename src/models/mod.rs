//! Data models for the monitoring dashboard.
//!
//! This module contains the data structures the dashboard works with:
//!
//! - `Organization`: the entities a committee oversees
//! - `Indicator`: compliance check items with a reporting cadence
//! - `MonitoringResult`, `MonthlyResults`: recorded check results and the
//!   twelve-slot monthly view derived from them
//!
//! Wire shapes (`RawRecord`, `*ApiItem`) mirror the spreadsheet's field
//! names and are adapted into the canonical types at the API boundary.

pub mod indicator;
pub mod organization;
pub mod result;

pub use indicator::{Characteristic, CheckMethod, Indicator, IndicatorApiItem, IndicatorCategory};
pub use organization::{OrgRole, Organization, OrganizationApiItem};
pub use result::{
    normalize_indicator_id, MonitoringResult, MonthlyResults, RawRecord, ResultValue,
};
