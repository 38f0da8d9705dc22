use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub user_metadata: Option<serde_json::Value>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Display name from `user_metadata.full_name`, falling back to `name`.
    pub fn display_name(&self) -> Option<String> {
        let metadata = self.metadata.as_ref()?;
        ["full_name", "name"]
            .iter()
            .find_map(|key| metadata.get(*key).and_then(|v| v.as_str()))
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
    }
}

/// The authenticated patient a booking is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, display_name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            uid: user.id.clone(),
            display_name: user.display_name(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub identity: Identity,
    pub role: Option<String>,
}
