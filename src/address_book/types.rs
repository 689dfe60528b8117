//! Address book schema types
//!
//! Field names follow the WeCom wire format. Optional fields are omitted
//! from request bodies when unset.

use serde::{Deserialize, Serialize};

/// A directory member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Unique member id within the enterprise
    pub userid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Department ids the member belongs to
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub department: Vec<i64>,
    /// Sort order within each department, parallel to `department`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// "1" male, "2" female
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 1 where the member leads the department at the same index
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub is_leader_in_dept: Vec<i64>,
    /// 1 enabled, 0 disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_mediaid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_department: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extattr: Option<ExtAttr>,
    /// Send an invitation on creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_invite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_profile: Option<ExternalProfile>,
}

impl User {
    /// Create a member with just an id and display name
    pub fn new(userid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            userid: userid.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Custom attributes shown on the member profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtAttr {
    #[serde(default)]
    pub attrs: Vec<Attr>,
}

/// One custom attribute: text (`type` 0) or web link (`type` 1)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    #[serde(rename = "type", default)]
    pub attr_type: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebLink {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniProgram {
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub pagepath: String,
    #[serde(default)]
    pub title: String,
}

/// Profile fields visible to external contacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    #[serde(default)]
    pub external_corp_name: String,
    #[serde(default)]
    pub external_attr: Vec<ExternalAttr>,
}

/// External attribute: text, web link, or mini program (`type` 0, 1, 2)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAttr {
    #[serde(rename = "type", default)]
    pub attr_type: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miniprogram: Option<MiniProgram>,
}

/// A department in the organization tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parentid: i64,
    #[serde(default)]
    pub order: i64,
}

/// `department/list` response
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DepartmentList {
    #[serde(default)]
    pub department: Vec<Department>,
}

/// `batch/invite` request body
#[derive(Debug, Serialize)]
pub(crate) struct InviteRequest<'a> {
    pub user: &'a [String],
}

/// Members, departments and tags the invitation could not reach
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteResult {
    pub invaliduser: Vec<String>,
    pub invalidparty: Vec<i64>,
    pub invalidtag: Vec<i64>,
}
