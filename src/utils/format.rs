use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Evaluation timestamps are recorded in Korea Standard Time (UTC+9),
/// matching the spreadsheet's existing rows.
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Wire format for evaluation timestamps
const EVAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn kst() -> FixedOffset {
    // 9h east is always a valid offset
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("KST offset is valid")
}

/// Current time as a KST evaluation-timestamp string
pub fn kst_now_string() -> String {
    Utc::now()
        .with_timezone(&kst())
        .format(EVAL_TIMESTAMP_FORMAT)
        .to_string()
}

/// Current month number (1-12) in KST
pub fn kst_current_month() -> u32 {
    use chrono::Datelike;
    Utc::now().with_timezone(&kst()).month()
}

/// Parse an evaluation timestamp from the repository.
///
/// Accepts the canonical `YYYY-MM-DD HH:MM:SS` form, RFC 3339, or a bare
/// date. Returns None for anything else; callers sort missing timestamps
/// oldest so they never shadow a dated record.
pub fn parse_eval_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, EVAL_TIMESTAMP_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}

/// Display label for a month number, e.g. `4월`
pub fn month_label(month: u32) -> String {
    format!("{}월", month)
}
