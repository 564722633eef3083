use serde::{Deserialize, Serialize};

/// Reporting cadence recorded in the indicator sheet's category column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorCategory {
    #[default]
    Monthly,
    Semiannual,
    Yearly,
    FirstQuarter,
}

impl IndicatorCategory {
    /// Parse the sheet's category label. Anything unrecognized is treated
    /// as monthly, the sheet's implicit default.
    pub fn from_label(s: &str) -> Self {
        match s.trim() {
            "반기" => IndicatorCategory::Semiannual,
            "연중" => IndicatorCategory::Yearly,
            "1~3월" => IndicatorCategory::FirstQuarter,
            _ => IndicatorCategory::Monthly,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            IndicatorCategory::Monthly => "매월",
            IndicatorCategory::Semiannual => "반기",
            IndicatorCategory::Yearly => "연중",
            IndicatorCategory::FirstQuarter => "1~3월",
        }
    }
}

/// How an indicator is classified in the characteristic columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characteristic {
    CommonRequired,
    CommonOptional,
    EvaluationLinked,
}

impl Characteristic {
    pub fn as_label(&self) -> &'static str {
        match self {
            Characteristic::CommonRequired => "공통필수",
            Characteristic::CommonOptional => "공통선택",
            Characteristic::EvaluationLinked => "평가연계",
        }
    }
}

/// How the check is carried out, derived from the method columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMethod {
    Online,
    Onsite,
    Document,
}

impl CheckMethod {
    pub fn as_label(&self) -> &'static str {
        match self {
            CheckMethod::Online => "온라인점검",
            CheckMethod::Onsite => "현장점검",
            CheckMethod::Document => "서류검토",
        }
    }
}

/// A compliance check item. Read-only reference data from the indicator
/// sheet; never mutated by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: IndicatorCategory,
    pub description: String,
    /// 평가연계 column, `O` when the indicator feeds the evaluation score
    pub evaluation_linked: bool,
    /// Raw characteristic columns (field5-field7 in the sheet)
    pub common_required: bool,
    pub common_optional: bool,
    pub evaluation_column: bool,
    /// Raw check-method columns (field8/field9): `필수`, `선택`, or blank
    pub online_check: String,
    pub onsite_check: String,
}

impl Indicator {
    pub fn is_yearly(&self) -> bool {
        self.category == IndicatorCategory::Yearly
    }

    /// Specialized indicators are tagged in the display name
    pub fn is_special(&self) -> bool {
        self.name.contains("(특화)")
    }

    /// Semiannual codes look like `H001` - an `H` followed by three
    /// digits anywhere in the code.
    pub fn has_semiannual_code(&self) -> bool {
        let bytes = self.code.as_bytes();
        bytes.windows(4).any(|w| {
            w[0] == b'H' && w[1..].iter().all(|b| b.is_ascii_digit())
        })
    }

    /// Period-independent semiannual classification: the category says so,
    /// the name says so, or the code carries a semiannual code.
    pub fn is_semiannual(&self) -> bool {
        self.category == IndicatorCategory::Semiannual
            || self.name.contains("반기")
            || self.has_semiannual_code()
    }

    pub fn characteristic(&self) -> Option<Characteristic> {
        if self.common_required {
            Some(Characteristic::CommonRequired)
        } else if self.common_optional {
            Some(Characteristic::CommonOptional)
        } else if self.evaluation_column {
            Some(Characteristic::EvaluationLinked)
        } else {
            None
        }
    }

    pub fn check_method(&self) -> CheckMethod {
        let marked = |col: &str| matches!(col.trim(), "필수" | "선택");
        if marked(&self.online_check) {
            CheckMethod::Online
        } else if marked(&self.onsite_check) {
            CheckMethod::Onsite
        } else {
            CheckMethod::Document
        }
    }
}

/// Indicator row as the API serves it (Google Sheet column names)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndicatorApiItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "dataSource")]
    pub description: Option<String>,
    #[serde(rename = "평가연계", default)]
    pub evaluation_linked: Option<String>,
    #[serde(default)]
    pub field5: Option<String>,
    #[serde(default)]
    pub field6: Option<String>,
    #[serde(default)]
    pub field7: Option<String>,
    #[serde(default)]
    pub field8: Option<String>,
    #[serde(default)]
    pub field9: Option<String>,
}

impl IndicatorApiItem {
    pub fn to_indicator(&self) -> Indicator {
        let flag = |col: &Option<String>| col.as_deref().map(str::trim) == Some("O");
        Indicator {
            id: self.id.clone().unwrap_or_default(),
            code: self.code.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            category: IndicatorCategory::from_label(self.category.as_deref().unwrap_or("")),
            description: self.description.clone().unwrap_or_default(),
            evaluation_linked: flag(&self.evaluation_linked),
            common_required: flag(&self.field5),
            common_optional: flag(&self.field6),
            evaluation_column: flag(&self.field7),
            online_check: self.field8.clone().unwrap_or_default(),
            onsite_check: self.field9.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(code: &str, name: &str, category: IndicatorCategory) -> Indicator {
        Indicator {
            id: "IND1".to_string(),
            code: code.to_string(),
            name: name.to_string(),
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

    #[test]
    fn test_category_labels() {
        assert_eq!(IndicatorCategory::from_label("반기"), IndicatorCategory::Semiannual);
        assert_eq!(IndicatorCategory::from_label("연중"), IndicatorCategory::Yearly);
        assert_eq!(IndicatorCategory::from_label("매월"), IndicatorCategory::Monthly);
        assert_eq!(IndicatorCategory::from_label("기타"), IndicatorCategory::Monthly);
    }

    #[test]
    fn test_semiannual_code_detection() {
        assert!(indicator("H001", "x", IndicatorCategory::Monthly).has_semiannual_code());
        assert!(indicator("A-H123", "x", IndicatorCategory::Monthly).has_semiannual_code());
        assert!(!indicator("H01", "x", IndicatorCategory::Monthly).has_semiannual_code());
        assert!(!indicator("HX01", "x", IndicatorCategory::Monthly).has_semiannual_code());
        assert!(!indicator("M001", "x", IndicatorCategory::Monthly).has_semiannual_code());
    }

    #[test]
    fn test_is_semiannual_via_name_or_category() {
        assert!(indicator("M001", "반기 점검 지표", IndicatorCategory::Monthly).is_semiannual());
        assert!(indicator("M001", "x", IndicatorCategory::Semiannual).is_semiannual());
        assert!(!indicator("M001", "x", IndicatorCategory::Monthly).is_semiannual());
    }

    #[test]
    fn test_special_flag_from_name() {
        assert!(indicator("M001", "아동 안전 (특화)", IndicatorCategory::Monthly).is_special());
        assert!(!indicator("M001", "아동 안전", IndicatorCategory::Monthly).is_special());
    }

    #[test]
    fn test_characteristic_priority() {
        let mut ind = indicator("M001", "x", IndicatorCategory::Monthly);
        assert_eq!(ind.characteristic(), None);

        ind.evaluation_column = true;
        assert_eq!(ind.characteristic(), Some(Characteristic::EvaluationLinked));

        ind.common_optional = true;
        assert_eq!(ind.characteristic(), Some(Characteristic::CommonOptional));

        ind.common_required = true;
        assert_eq!(ind.characteristic(), Some(Characteristic::CommonRequired));
    }

    #[test]
    fn test_check_method_derivation() {
        let mut ind = indicator("M001", "x", IndicatorCategory::Monthly);
        assert_eq!(ind.check_method(), CheckMethod::Document);

        ind.onsite_check = "선택".to_string();
        assert_eq!(ind.check_method(), CheckMethod::Onsite);

        ind.online_check = "필수".to_string();
        assert_eq!(ind.check_method(), CheckMethod::Online);
    }

    #[test]
    fn test_api_item_adaptation() {
        let json = r#"{
            "id": "IND1",
            "code": "H001",
            "name": "운영 규정 점검",
            "category": "반기",
            "dataSource": "운영 규정집",
            "평가연계": "O",
            "field5": "O",
            "field8": "필수"
        }"#;
        let item: IndicatorApiItem = serde_json::from_str(json).unwrap();
        let ind = item.to_indicator();
        assert_eq!(ind.category, IndicatorCategory::Semiannual);
        assert_eq!(ind.description, "운영 규정집");
        assert!(ind.evaluation_linked);
        assert_eq!(ind.characteristic(), Some(Characteristic::CommonRequired));
        assert_eq!(ind.check_method(), CheckMethod::Online);
    }
}
