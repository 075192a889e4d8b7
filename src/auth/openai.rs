//! OpenAI device login, API-key exchange, and credit redemption.

use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use super::error::AuthError;
use super::types::{OpenAiDeviceLogin, TokenData};

/// OpenAI Accounts API base used by the device login flow.
const OPENAI_ACCOUNTS_API_BASE: &str = "https://auth.openai.com/api/accounts";
/// OAuth token endpoint used for code and token exchange.
const OPENAI_OAUTH_TOKEN_URL: &str = "https://auth.openai.com/oauth/token";
/// User-facing verification page for device login.
const OPENAI_DEVICE_LOGIN_URL: &str = "https://auth.openai.com/codex/device";
/// Redirect URI registered for the CLI device flow.
const OPENAI_DEVICE_REDIRECT_URI: &str = "https://auth.openai.com/deviceauth/callback";
/// OpenAI public client id used by this login flow.
const OPENAI_CLIENT_ID: &str = "app_EMoamEEZ73f0CkXaXp7hrann";
/// Billing endpoint for complimentary subscriber credits.
const REDEEM_CREDITS_URL: &str = "https://api.openai.com/v1/billing/redeem_credits";
/// Claim namespace carrying ChatGPT account details in the id token.
const AUTH_CLAIMS_KEY: &str = "https://api.openai.com/auth";
/// Maximum allowed wait while polling for device authorization.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(15 * 60);
/// Shared HTTP timeout for auth requests.
const AUTH_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Subscriptions younger than this cannot redeem credits.
const CREDIT_MIN_SUBSCRIPTION_DAYS: i64 = 7;

/// Response payload returned when creating a device login session.
#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    /// Opaque device session id used for polling.
    device_auth_id: String,
    /// Short code shown to the user.
    #[serde(alias = "usercode")]
    user_code: String,
    /// Polling interval hint returned by the provider.
    #[serde(deserialize_with = "deserialize_interval", default)]
    interval: u64,
}

/// Payload returned once device login is approved.
#[derive(Debug, Deserialize)]
struct DeviceTokenResponse {
    authorization_code: String,
    code_verifier: String,
}

/// OAuth token endpoint response shape.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// ChatGPT account claims read from the id token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatGptClaims {
    #[serde(default)]
    pub chatgpt_plan_type: Option<String>,
    #[serde(default)]
    pub completed_platform_onboarding: bool,
    #[serde(default)]
    pub is_org_owner: bool,
    #[serde(default)]
    pub chatgpt_subscription_active_start: Option<DateTime<Utc>>,
}

/// Begin the OpenAI device-code login flow.
pub async fn start_openai_device_login() -> Result<OpenAiDeviceLogin, AuthError> {
    let client = shared_auth_http_client();
    let response = client
        .post(format!("{OPENAI_ACCOUNTS_API_BASE}/deviceauth/usercode"))
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "client_id": OPENAI_CLIENT_ID }))
        .send()
        .await?;

    if !response.status().is_success() {
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Status(code, body));
    }

    let payload: DeviceCodeResponse = response.json().await?;
    Ok(OpenAiDeviceLogin {
        verification_url: OPENAI_DEVICE_LOGIN_URL.to_string(),
        user_code: payload.user_code,
        device_auth_id: payload.device_auth_id,
        interval_secs: payload.interval.max(1),
    })
}

/// Poll until the user approves the device login, then exchange the code.
pub async fn complete_openai_device_login(
    login: &OpenAiDeviceLogin,
) -> Result<TokenData, AuthError> {
    let client = shared_auth_http_client();
    let code = poll_openai_device_code(client, login).await?;
    exchange_openai_code(client, &code.authorization_code, &code.code_verifier).await
}

/// Trade an id token for a long-lived API key.
pub async fn obtain_api_key(id_token: &str) -> Result<String, AuthError> {
    let name = api_key_name(Utc::now());
    let form = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:token-exchange"),
        ("client_id", OPENAI_CLIENT_ID),
        ("requested_token", "openai-api-key"),
        ("subject_token", id_token),
        ("subject_token_type", "urn:ietf:params:oauth:token-type:id_token"),
        ("name", name.as_str()),
    ];
    let response = shared_auth_http_client()
        .post(OPENAI_OAUTH_TOKEN_URL)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .form(&form)
        .send()
        .await?;

    if !response.status().is_success() {
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Status(code, body));
    }

    let payload: OAuthTokenResponse = response.json().await?;
    let key = payload.access_token.unwrap_or_default().trim().to_string();
    if key.is_empty() {
        return Err(AuthError::Invalid(
            "token exchange response did not include an API key".to_string(),
        ));
    }
    Ok(key)
}

/// Ask the billing API to grant subscriber credits.
///
/// Returns a message for the user. Ineligible accounts get an explanation
/// instead of an error.
pub async fn redeem_free_credits(id_token: &str) -> Result<String, AuthError> {
    let claims = parse_chatgpt_claims(id_token)?;
    if let Err(reason) = check_credit_eligibility(&claims, Utc::now()) {
        return Ok(reason);
    }

    let response = shared_auth_http_client()
        .post(REDEEM_CREDITS_URL)
        .json(&serde_json::json!({ "id_token": id_token }))
        .send()
        .await?;
    if !response.status().is_success() {
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Status(code, body));
    }

    let body: serde_json::Value = response.json().await?;
    let granted = body
        .get("granted_chatgpt_subscriber_api_credits")
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(0.0);
    if granted > 0.0 {
        let (plan, amount) = match claims.chatgpt_plan_type.as_deref() {
            Some("pro") => ("Pro", "$50"),
            _ => ("Plus", "$5"),
        };
        Ok(format!(
            "Thanks for being a ChatGPT {plan} subscriber! If you haven't already redeemed, you should receive {amount} in API credits."
        ))
    } else {
        Ok(format!(
            "It looks like no credits were granted:\n{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        ))
    }
}

/// Decode the ChatGPT claims from an unverified JWT payload.
pub fn parse_chatgpt_claims(id_token: &str) -> Result<ChatGptClaims, AuthError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::Invalid("id token is not a JWT".to_string()))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| AuthError::Invalid(format!("invalid id token payload: {err}")))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)?;
    match claims.get(AUTH_CLAIMS_KEY) {
        Some(auth) => Ok(serde_json::from_value(auth.clone())?),
        None => Ok(ChatGptClaims::default()),
    }
}

/// `Ok` when the account may redeem credits, else the reason it may not.
pub fn check_credit_eligibility(claims: &ChatGptClaims, now: DateTime<Utc>) -> Result<(), String> {
    if let Some(start) = claims.chatgpt_subscription_active_start {
        if now.signed_duration_since(start) < ChronoDuration::days(CREDIT_MIN_SUBSCRIPTION_DAYS) {
            return Err(
                "Sorry, your subscription must be active for more than 7 days to redeem credits."
                    .to_string(),
            );
        }
    }
    let needs_setup = !claims.completed_platform_onboarding && claims.is_org_owner;
    let eligible_plan = matches!(claims.chatgpt_plan_type.as_deref(), Some("plus" | "pro"));
    if needs_setup || !eligible_plan {
        return Err(
            "Only users with Plus or Pro subscriptions can redeem free API credits.".to_string(),
        );
    }
    Ok(())
}

fn api_key_name(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!(
        "Codex CLI [auto-generated] ({}) [{suffix:06x}]",
        now.format("%Y-%m-%d")
    )
}

/// Poll OpenAI device login endpoint until authorization code is issued.
async fn poll_openai_device_code(
    client: &reqwest::Client,
    login: &OpenAiDeviceLogin,
) -> Result<DeviceTokenResponse, AuthError> {
    let started = std::time::Instant::now();
    let poll_interval = Duration::from_secs(login.interval_secs.max(1));

    loop {
        let response = client
            .post(format!("{OPENAI_ACCOUNTS_API_BASE}/deviceauth/token"))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "device_auth_id": login.device_auth_id,
                "user_code": login.user_code,
            }))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        let status = response.status().as_u16();
        if status == 403 || status == 404 {
            // Authorization still pending.
            if started.elapsed() >= LOGIN_TIMEOUT {
                return Err(AuthError::Invalid(
                    "device login timed out after 15 minutes".to_string(),
                ));
            }
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Status(status, body));
    }
}

/// Exchange an authorization code for id/access/refresh tokens.
async fn exchange_openai_code(
    client: &reqwest::Client,
    authorization_code: &str,
    code_verifier: &str,
) -> Result<TokenData, AuthError> {
    let form = [
        ("grant_type", "authorization_code"),
        ("code", authorization_code),
        ("redirect_uri", OPENAI_DEVICE_REDIRECT_URI),
        ("client_id", OPENAI_CLIENT_ID),
        ("code_verifier", code_verifier),
        ("scope", "openid profile email offline_access"),
    ];

    let response = client
        .post(OPENAI_OAUTH_TOKEN_URL)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .form(&form)
        .send()
        .await?;

    if !response.status().is_success() {
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Status(code, body));
    }

    let payload: OAuthTokenResponse = response.json().await?;
    let required = |value: Option<String>, field: &str| {
        let value = value.unwrap_or_default().trim().to_string();
        if value.is_empty() {
            Err(AuthError::Invalid(format!(
                "token exchange response did not include {field}"
            )))
        } else {
            Ok(value)
        }
    };
    Ok(TokenData {
        id_token: required(payload.id_token, "id_token")?,
        access_token: required(payload.access_token, "access_token")?,
        refresh_token: payload.refresh_token.unwrap_or_default(),
    })
}

/// Lazily initialized shared HTTP client for auth requests.
fn shared_auth_http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(AUTH_HTTP_TIMEOUT)
            .user_agent(concat!("codex/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Deserialize polling interval values provided as string/number/null.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(num) => num
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("interval number must be positive")),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|err| serde::de::Error::custom(format!("invalid interval: {err}"))),
        serde_json::Value::Null => Ok(5),
        _ => Err(serde::de::Error::custom(
            "interval must be string or number",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(claims: serde_json::Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"none"}"#),
            engine.encode(claims.to_string())
        )
    }

    #[test]
    fn claims_are_read_from_auth_namespace() {
        let token = jwt(serde_json::json!({
            "email": "a@b.c",
            "https://api.openai.com/auth": {
                "chatgpt_plan_type": "pro",
                "completed_platform_onboarding": true,
                "is_org_owner": false,
                "chatgpt_subscription_active_start": "2024-01-01T00:00:00Z"
            }
        }));
        let claims = parse_chatgpt_claims(&token).expect("claims");
        assert_eq!(claims.chatgpt_plan_type.as_deref(), Some("pro"));
        assert!(claims.completed_platform_onboarding);
        assert!(claims.chatgpt_subscription_active_start.is_some());
    }

    #[test]
    fn non_jwt_is_rejected() {
        assert!(parse_chatgpt_claims("opaque").is_err());
    }

    #[test]
    fn eligibility_requires_paid_plan_and_aged_subscription() {
        let now = Utc::now();
        let mut claims = ChatGptClaims {
            chatgpt_plan_type: Some("plus".into()),
            completed_platform_onboarding: true,
            is_org_owner: true,
            chatgpt_subscription_active_start: Some(now - ChronoDuration::days(30)),
        };
        assert_eq!(check_credit_eligibility(&claims, now), Ok(()));

        claims.chatgpt_subscription_active_start = Some(now - ChronoDuration::days(2));
        assert!(check_credit_eligibility(&claims, now)
            .unwrap_err()
            .contains("more than 7 days"));

        claims.chatgpt_subscription_active_start = None;
        claims.chatgpt_plan_type = Some("free".into());
        assert!(check_credit_eligibility(&claims, now)
            .unwrap_err()
            .contains("Plus or Pro"));

        claims.chatgpt_plan_type = Some("pro".into());
        claims.completed_platform_onboarding = false;
        assert!(check_credit_eligibility(&claims, now).is_err());
    }

    #[test]
    fn key_name_has_date_and_hex_suffix() {
        let now = DateTime::parse_from_rfc3339("2025-05-01T12:00:00Z")
            .expect("date")
            .with_timezone(&Utc);
        let name = api_key_name(now);
        assert!(name.starts_with("Codex CLI [auto-generated] (2025-05-01) ["));
        let suffix = name.rsplit('[').next().unwrap_or_default().trim_end_matches(']');
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
