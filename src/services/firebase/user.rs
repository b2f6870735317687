use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of a Firebase account, as returned by `accounts:lookup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub disabled: bool,
    pub provider_user_info: Vec<ProviderUserInfo>,
    pub custom_claims: HashMap<String, serde_json::Value>,
    pub tenant_id: Option<String>,
    pub tokens_valid_after: Option<DateTime<Utc>>,
    pub metadata: UserMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUserInfo {
    pub provider_id: String,
    #[serde(default, rename(deserialize = "rawId"))]
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserMetadata {
    pub created_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

// Wire format of the Identity Toolkit lookup response.
#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    provider_user_info: Vec<ProviderUserInfo>,
    // JSON object encoded as a string
    #[serde(default)]
    custom_attributes: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    // Seconds, encoded as a string
    #[serde(default)]
    valid_since: Option<String>,
    // Milliseconds, encoded as strings
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_login_at: Option<String>,
    // RFC 3339
    #[serde(default)]
    last_refresh_at: Option<String>,
}

fn from_millis(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw?.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

fn from_secs(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw?.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
}

impl From<LookupUser> for UserRecord {
    fn from(u: LookupUser) -> Self {
        let custom_claims = u
            .custom_attributes
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        let metadata = UserMetadata {
            created_at: from_millis(u.created_at.as_deref()),
            last_login_at: from_millis(u.last_login_at.as_deref()),
            last_refresh_at: u
                .last_refresh_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        };

        Self {
            uid: u.local_id,
            email: u.email,
            email_verified: u.email_verified,
            display_name: u.display_name,
            photo_url: u.photo_url,
            phone_number: u.phone_number,
            disabled: u.disabled,
            provider_user_info: u.provider_user_info,
            custom_claims,
            tenant_id: u.tenant_id,
            tokens_valid_after: from_secs(u.valid_since.as_deref()),
            metadata,
        }
    }
}
