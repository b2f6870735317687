use serde::Deserialize;

use super::FirebaseError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service-account key (the JSON file downloaded from the console).
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default, rename = "type")]
    pub key_type: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &[u8]) -> Result<Self, FirebaseError> {
        let key: Self = serde_json::from_slice(raw)
            .map_err(|e| FirebaseError::Credentials(e.to_string()))?;

        if let Some(kind) = key.key_type.as_deref()
            && kind != "service_account"
        {
            return Err(FirebaseError::Credentials(format!(
                "unsupported credential type '{kind}'"
            )));
        }
        if key.project_id.trim().is_empty() {
            return Err(FirebaseError::Credentials("empty 'project_id'".into()));
        }
        if key.client_email.trim().is_empty() {
            return Err(FirebaseError::Credentials("empty 'client_email'".into()));
        }
        if key.private_key.trim().is_empty() {
            return Err(FirebaseError::Credentials("empty 'private_key'".into()));
        }

        Ok(key)
    }
}
