use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::utils::parse_eval_timestamp;

/// Outcome of a single compliance check.
///
/// The wire labels are the spreadsheet's literal cell values; they must not
/// change or existing rows become unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResultValue {
    #[serde(rename = "충족")]
    Fulfilled,
    #[serde(rename = "미충족")]
    Unfulfilled,
    #[serde(rename = "해당없음")]
    NotApplicable,
    #[default]
    #[serde(rename = "미점검")]
    Unchecked,
}

impl ResultValue {
    pub fn as_label(&self) -> &'static str {
        match self {
            ResultValue::Fulfilled => "충족",
            ResultValue::Unfulfilled => "미충족",
            ResultValue::NotApplicable => "해당없음",
            ResultValue::Unchecked => "미점검",
        }
    }

    /// Parse a spreadsheet cell value. Returns None for labels the
    /// dashboard doesn't know, so callers can decide how to degrade.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "충족" => Some(ResultValue::Fulfilled),
            "미충족" => Some(ResultValue::Unfulfilled),
            "해당없음" => Some(ResultValue::NotApplicable),
            "미점검" => Some(ResultValue::Unchecked),
            _ => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        !matches!(self, ResultValue::Unchecked)
    }
}

impl std::fmt::Display for ResultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Strip the `수정_` correction prefix some sheet rows carry and trim
/// surrounding whitespace, so corrected and original rows compare equal.
pub fn normalize_indicator_id(id: &str) -> &str {
    let trimmed = id.trim();
    trimmed.strip_prefix("수정_").unwrap_or(trimmed).trim()
}

/// A monitoring result row as the repository serves and accepts it.
///
/// Field names are the spreadsheet headers; aliases cover the English
/// variants older rows used. This is the only type that touches the wire
/// shape - everything else works with [`MonitoringResult`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "기관ID", default)]
    pub organization_id: Option<String>,
    #[serde(rename = "기관코드", alias = "orgCode", default)]
    pub organization_code: Option<String>,
    #[serde(rename = "기관명", default)]
    pub organization_name: Option<String>,
    #[serde(rename = "지표ID", alias = "indicatorId", default)]
    pub indicator_id: Option<String>,
    #[serde(rename = "결과", alias = "result", default)]
    pub value: Option<String>,
    #[serde(rename = "의견", alias = "opinion", default)]
    pub opinion: Option<String>,
    #[serde(
        rename = "평가월",
        alias = "month",
        default,
        deserialize_with = "de_string_or_number"
    )]
    pub month: Option<String>,
    #[serde(rename = "평가일자", alias = "date", default)]
    pub evaluated_at: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "지역", alias = "region", default)]
    pub region: Option<String>,
}

/// The sheet sometimes hands back evaluation months as numbers
fn de_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        S(String),
        N(i64),
    }

    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
        StringOrNumber::S(s) => s,
        StringOrNumber::N(n) => n.to_string(),
    }))
}

/// Canonical monitoring result, adapted once at the repository boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringResult {
    pub organization_code: String,
    pub indicator_id: String,
    pub value: ResultValue,
    pub opinion: String,
    /// `"1"`..`"12"`, or a synthetic period key for aggregated rows
    pub month: String,
    /// KST wire timestamp; empty when the row never carried one
    pub evaluated_at: String,
    pub category: String,
    pub region: String,
}

impl MonitoringResult {
    /// Adapt a wire row. Rows without an indicator id are unusable and
    /// dropped; unknown result labels degrade to unchecked.
    pub fn from_raw(raw: RawRecord) -> Option<Self> {
        let indicator_id = raw.indicator_id.filter(|id| !id.trim().is_empty())?;

        let value = match raw.value.as_deref() {
            None => ResultValue::Unchecked,
            Some(label) => ResultValue::from_label(label).unwrap_or_else(|| {
                warn!(label, "Unknown result label, treating as unchecked");
                ResultValue::Unchecked
            }),
        };

        Some(Self {
            organization_code: raw.organization_code.unwrap_or_default(),
            indicator_id,
            value,
            opinion: raw.opinion.unwrap_or_default(),
            month: raw.month.unwrap_or_default(),
            evaluated_at: raw.evaluated_at.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            region: raw.region.unwrap_or_default(),
        })
    }

    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            organization_id: None,
            organization_code: Some(self.organization_code.clone()),
            organization_name: None,
            indicator_id: Some(self.indicator_id.clone()),
            value: Some(self.value.as_label().to_string()),
            opinion: Some(self.opinion.clone()),
            month: Some(self.month.clone()),
            evaluated_at: Some(self.evaluated_at.clone()),
            category: Some(self.category.clone()),
            region: Some(self.region.clone()),
        }
    }

    /// Evaluation month as a number, if the row holds a real month
    pub fn month_number(&self) -> Option<u32> {
        let m: u32 = self.month.trim().parse().ok()?;
        (1..=12).contains(&m).then_some(m)
    }

    pub fn eval_time(&self) -> Option<NaiveDateTime> {
        parse_eval_timestamp(&self.evaluated_at)
    }

    /// True when this row belongs to the given indicator, comparing
    /// normalized identifiers on both sides.
    pub fn matches_indicator(&self, indicator_id: &str) -> bool {
        normalize_indicator_id(&self.indicator_id) == normalize_indicator_id(indicator_id)
    }
}

/// Twelve result slots, month 1 through 12, defaulting to unchecked.
///
/// Persisted as a JSON object keyed `"1"`..`"12"` so the files stay
/// readable by the web dashboard's local store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, ResultValue>", from = "BTreeMap<String, ResultValue>")]
pub struct MonthlyResults([ResultValue; 12]);

impl MonthlyResults {
    pub fn get(&self, month: u32) -> ResultValue {
        match month {
            1..=12 => self.0[(month - 1) as usize],
            _ => ResultValue::Unchecked,
        }
    }

    /// Out-of-range months are ignored
    pub fn set(&mut self, month: u32, value: ResultValue) {
        if (1..=12).contains(&month) {
            self.0[(month - 1) as usize] = value;
        }
    }

    /// (month, value) pairs in calendar order; always 12 of them
    pub fn iter(&self) -> impl Iterator<Item = (u32, ResultValue)> + '_ {
        self.0.iter().enumerate().map(|(i, v)| (i as u32 + 1, *v))
    }

    /// True when any month holds a real result
    pub fn has_any_checked(&self) -> bool {
        self.0.iter().any(|v| v.is_checked())
    }
}

impl From<MonthlyResults> for BTreeMap<String, ResultValue> {
    fn from(map: MonthlyResults) -> Self {
        map.iter().map(|(m, v)| (m.to_string(), v)).collect()
    }
}

impl From<BTreeMap<String, ResultValue>> for MonthlyResults {
    fn from(entries: BTreeMap<String, ResultValue>) -> Self {
        let mut map = MonthlyResults::default();
        for (key, value) in entries {
            if let Ok(month) = key.trim().parse::<u32>() {
                map.set(month, value);
            }
        }
        map
    }
}
