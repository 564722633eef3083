use serde::{Deserialize, Serialize};

/// Whether the committee carries primary or secondary responsibility
/// for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    Main,
    Sub,
}

impl OrgRole {
    pub fn as_label(&self) -> &'static str {
        match self {
            OrgRole::Main => "주담당",
            OrgRole::Sub => "부담당",
        }
    }
}

/// An organization under the committee's oversight. Immutable once
/// fetched; lifecycle bound to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub code: String,
    pub name: String,
    pub region: String,
    pub role: OrgRole,
}

/// Organization row as the API serves it. Older sheets used the Korean
/// headers, newer ones the English ones; accept both.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrganizationApiItem {
    #[serde(default, alias = "기관ID")]
    pub id: Option<String>,
    #[serde(default, alias = "기관코드")]
    pub code: Option<String>,
    #[serde(default, alias = "기관명")]
    pub name: Option<String>,
    #[serde(default, alias = "지역")]
    pub region: Option<String>,
}

impl OrganizationApiItem {
    pub fn to_organization(&self, role: OrgRole) -> Organization {
        Organization {
            id: self.id.clone().unwrap_or_default(),
            code: self.code.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            region: self.region.clone().unwrap_or_default(),
            role,
        }
    }
}
