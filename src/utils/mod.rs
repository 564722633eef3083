//! Utility functions for timestamp handling and display labels.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{kst_current_month, kst_now_string, month_label, parse_eval_timestamp};
