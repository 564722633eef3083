//! Local caching module for monitoring results.
//!
//! This module provides the two-level result cache: `ResultCache` keeps
//! per-organization result lists and per-indicator monthly maps in
//! memory, and `LocalStore` persists them as JSON files for offline
//! recovery. The durable key formats mirror the web dashboard's
//! localStorage entries.

pub mod results;
pub mod store;

pub use results::{build_monthly_map, ResultCache};
pub use store::LocalStore;
