//! Public auth model types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Cached keys older than this are treated as expired.
pub const CREDENTIAL_MAX_AGE_DAYS: i64 = 28;

/// OAuth tokens kept alongside the API key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenData {
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// On-disk shape of `auth.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    #[serde(rename = "OPENAI_API_KEY", default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub tokens: Option<TokenData>,
    #[serde(default)]
    pub last_refresh: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// The cached key, when present and refreshed less than 28 days ago.
    pub fn fresh_api_key(&self, now: DateTime<Utc>) -> Option<&str> {
        let key = self
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())?;
        let last_refresh = self.last_refresh?;
        (now.signed_duration_since(last_refresh) < Duration::days(CREDENTIAL_MAX_AGE_DAYS))
            .then_some(key)
    }
}

/// Device-code login session details presented to the user.
#[derive(Debug, Clone)]
pub struct OpenAiDeviceLogin {
    pub verification_url: String,
    pub user_code: String,
    pub(crate) device_auth_id: String,
    pub(crate) interval_secs: u64,
}
