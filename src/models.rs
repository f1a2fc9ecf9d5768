use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::GuardError;

// --- Identity & Session ---

/// Role
///
/// The three marketplace audiences. Each one owns a scoped dashboard root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Student,
    Vendor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Vendor, Role::Admin];

    /// Canonical spelling of a raw role string: trimmed and lowercased.
    pub fn canonical(raw: &str) -> String {
        raw.trim().to_ascii_lowercase()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GuardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match Role::canonical(raw).as_str() {
            "student" => Ok(Role::Student),
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            other => Err(GuardError::UnknownRole(other.to_string())),
        }
    }
}

/// Identity
///
/// The Identity Claim Set: the decoded fields of a signed credential, or the
/// profile returned by the backend. The role is kept as its canonical string
/// so that a credential carrying a role this tier does not know about still
/// yields an identity; `role()` is where such a role surfaces as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    #[serde(deserialize_with = "canonical_role")]
    pub role: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(
        subject_id: impl Into<String>,
        email: impl Into<String>,
        role: &str,
        display_name: Option<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            role: Role::canonical(role),
            display_name,
        }
    }

    /// Resolves the role against the known route tables.
    pub fn role(&self) -> Result<Role, GuardError> {
        self.role.parse()
    }
}

fn canonical_role<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Role::canonical(&raw))
}

/// Session
///
/// The client's resolved current user for the page lifetime. This is the
/// exact shape written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Session {
    pub identity: Identity,
    #[ts(type = "string")]
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            established_at: Utc::now(),
        }
    }
}

// --- Catalog records (owned by the backend) ---

/// Service
///
/// A purchasable service listing as returned by the backend. Mongo-style
/// `_id` keys are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Service {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// --- Page responses ---

/// PageView
///
/// What a page handler hands back once the guard let the request through:
/// the page name, the requested path, and who is looking at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageView {
    pub page: String,
    pub path: String,
    pub viewer: Option<Identity>,
}
