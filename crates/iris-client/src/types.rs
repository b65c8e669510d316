//! Request and response bodies of the Iris backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Auth ---

/// Tokens issued by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthTokens {
    pub fn bearer(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expires_in: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

// --- Lists ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Page selection for list endpoints. The backend caps `page_size` at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, 100),
        }
    }

    pub(crate) fn query(&self) -> String {
        format!("page={}&page_size={}", self.page, self.page_size)
    }
}

// --- Entities ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: String,
    pub entity_type: String,
    pub current_version: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntityCreate {
    pub entity_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: Map<String, Value>,
}

// --- Models ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub id: String,
    pub model_type: String,
    pub current_version: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Diagram document; parse with `ModelVersionData::from_value`.
    #[serde(default)]
    pub data: Value,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelCreate {
    pub model_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelUpdate {
    pub name: String,
    pub description: Option<String>,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelVersion {
    pub model_id: String,
    pub version: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: Value,
    pub change_type: String,
    #[serde(default)]
    pub change_summary: Option<String>,
    #[serde(default)]
    pub rollback_to: Option<u64>,
    pub created_at: String,
    pub created_by: String,
}

// --- Relationships ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub relationship_type: String,
    pub current_version: u64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelationshipCreate {
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub relationship_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: Map<String, Value>,
}
