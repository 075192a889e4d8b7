//! Credential resolution for the active provider.
//!
//! Order for OpenAI: `--login` forces a fresh device login; otherwise
//! `OPENAI_API_KEY`, then a fresh cached `auth.json`, then device login when
//! the session is interactive. Other providers read their own env var, and
//! providers on the no-key allow-list may go without.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{api_key_env_var, is_openai_provider, provider_requires_key, ProviderInfo};
use crate::config::OPENAI_API_KEY_ENV;

use super::browser::try_open_browser;
use super::error::AuthError;
use super::openai::{
    complete_openai_device_login, obtain_api_key, redeem_free_credits, start_openai_device_login,
};
use super::store::{load_credentials, save_credentials};
use super::types::CredentialRecord;

/// Inputs that decide how a credential is found.
#[derive(Debug, Clone)]
pub struct AuthRequest<'a> {
    pub provider: &'a str,
    pub providers: &'a BTreeMap<String, ProviderInfo>,
    /// `--login`: skip cached credentials.
    pub force_login: bool,
    /// `--free`: redeem subscriber credits after login.
    pub redeem_credits: bool,
    /// A user is present to complete a browser login.
    pub interactive: bool,
}

/// Where the resolved key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSource {
    /// A provider env var, by name.
    Environment(String),
    /// The cached credential file.
    Cache,
    /// A device login performed during this run.
    Login,
    /// The provider needs no key.
    NotRequired,
}

/// Outcome of credential resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAuth {
    pub api_key: Option<String>,
    pub source: AuthSource,
}

/// Interactive login that yields a persisted credential record.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self, redeem_credits: bool) -> Result<CredentialRecord, AuthError>;
}

/// Device-code login against auth.openai.com, persisting to `auth_path`.
pub struct DeviceLoginFlow {
    pub auth_path: PathBuf,
}

#[async_trait]
impl LoginFlow for DeviceLoginFlow {
    async fn login(&self, redeem_credits: bool) -> Result<CredentialRecord, AuthError> {
        let device = start_openai_device_login().await?;
        eprintln!(
            "To sign in, open {} and enter the code {}",
            device.verification_url, device.user_code
        );
        if !try_open_browser(&device.verification_url) {
            eprintln!("(could not open a browser automatically)");
        }

        let tokens = complete_openai_device_login(&device).await?;
        let api_key = obtain_api_key(&tokens.id_token).await?;
        let record = CredentialRecord {
            openai_api_key: Some(api_key),
            tokens: Some(tokens),
            last_refresh: Some(Utc::now()),
        };
        save_credentials(&self.auth_path, &record)?;
        tracing::info!(path = %self.auth_path.display(), "device login complete");

        if redeem_credits {
            let id_token = record
                .tokens
                .as_ref()
                .map(|tokens| tokens.id_token.as_str())
                .unwrap_or_default();
            match redeem_free_credits(id_token).await {
                Ok(message) => eprintln!("{message}"),
                Err(err) => eprintln!("Unable to redeem ChatGPT subscriber API credits: {err}"),
            }
        }
        Ok(record)
    }
}

/// Resolve credentials from the real environment and `$CODEX_HOME/auth.json`.
pub async fn resolve_api_key(request: &AuthRequest<'_>) -> Result<ResolvedAuth, AuthError> {
    let auth_path = super::store::default_auth_path().ok_or_else(|| {
        AuthError::Invalid("unable to resolve home directory for auth.json".to_string())
    })?;
    let flow = DeviceLoginFlow {
        auth_path: auth_path.clone(),
    };
    resolve_api_key_with(
        request,
        |name| std::env::var(name).ok(),
        || load_credentials(&auth_path),
        &flow,
        Utc::now(),
    )
    .await
}

pub(crate) async fn resolve_api_key_with<FEnv, FCache>(
    request: &AuthRequest<'_>,
    env_lookup: FEnv,
    load_cached: FCache,
    login: &dyn LoginFlow,
    now: DateTime<Utc>,
) -> Result<ResolvedAuth, AuthError>
where
    FEnv: Fn(&str) -> Option<String>,
    FCache: FnOnce() -> Result<Option<CredentialRecord>, AuthError>,
{
    let non_empty = |name: &str| {
        env_lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if !is_openai_provider(request.provider) {
        let env_var = api_key_env_var(request.provider, request.providers);
        if let Some(key) = non_empty(&env_var) {
            return Ok(ResolvedAuth {
                api_key: Some(key),
                source: AuthSource::Environment(env_var),
            });
        }
        if !provider_requires_key(request.provider) {
            return Ok(ResolvedAuth {
                api_key: None,
                source: AuthSource::NotRequired,
            });
        }
        return Err(AuthError::MissingKey { env_var });
    }

    if !request.force_login {
        if let Some(key) = non_empty(OPENAI_API_KEY_ENV) {
            return Ok(ResolvedAuth {
                api_key: Some(key),
                source: AuthSource::Environment(OPENAI_API_KEY_ENV.to_string()),
            });
        }
        match load_cached() {
            Ok(Some(record)) => {
                if let Some(key) = record.fresh_api_key(now) {
                    return Ok(ResolvedAuth {
                        api_key: Some(key.to_string()),
                        source: AuthSource::Cache,
                    });
                }
                tracing::info!("cached credentials expired");
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "ignoring unreadable credential file"),
        }
    }

    if !request.interactive {
        return Err(if request.force_login {
            AuthError::NotInteractive
        } else {
            AuthError::MissingKey {
                env_var: OPENAI_API_KEY_ENV.to_string(),
            }
        });
    }

    let record = login.login(request.redeem_credits).await?;
    let key = record
        .openai_api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(AuthError::MissingKey {
            env_var: OPENAI_API_KEY_ENV.to_string(),
        })?;
    Ok(ResolvedAuth {
        api_key: Some(key),
        source: AuthSource::Login,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_providers;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLogin {
        calls: AtomicUsize,
    }

    impl FakeLogin {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LoginFlow for FakeLogin {
        async fn login(&self, _redeem_credits: bool) -> Result<CredentialRecord, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CredentialRecord {
                openai_api_key: Some("sk-from-login".into()),
                tokens: None,
                last_refresh: Some(Utc::now()),
            })
        }
    }

    fn request<'a>(
        provider: &'a str,
        providers: &'a BTreeMap<String, ProviderInfo>,
    ) -> AuthRequest<'a> {
        AuthRequest {
            provider,
            providers,
            force_login: false,
            redeem_credits: false,
            interactive: true,
        }
    }

    fn cached(age_days: i64, now: DateTime<Utc>) -> Option<CredentialRecord> {
        Some(CredentialRecord {
            openai_api_key: Some("sk-cached".into()),
            tokens: None,
            last_refresh: Some(now - Duration::days(age_days)),
        })
    }

    #[tokio::test]
    async fn named_provider_reads_its_env_var() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let resolved = resolve_api_key_with(
            &request("groq", &providers),
            |name| (name == "GROQ_API_KEY").then(|| "gsk".to_string()),
            || Ok(None),
            &login,
            Utc::now(),
        )
        .await
        .expect("resolved");
        assert_eq!(resolved.api_key.as_deref(), Some("gsk"));
        assert_eq!(resolved.source, AuthSource::Environment("GROQ_API_KEY".into()));
    }

    #[tokio::test]
    async fn missing_provider_key_names_the_variable() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let err = resolve_api_key_with(
            &request("mistral", &providers),
            |_| Some("   ".to_string()),
            || Ok(None),
            &login,
            Utc::now(),
        )
        .await
        .expect_err("missing key");
        assert!(err.to_string().contains("MISTRAL_API_KEY"), "got: {err}");
        assert_eq!(login.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn allow_listed_provider_needs_no_key() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let resolved = resolve_api_key_with(
            &request("ollama", &providers),
            |_| None,
            || Ok(None),
            &login,
            Utc::now(),
        )
        .await
        .expect("resolved");
        assert_eq!(resolved.source, AuthSource::NotRequired);
        assert_eq!(resolved.api_key, None);
    }

    #[tokio::test]
    async fn fresh_cache_is_used_for_openai() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let now = Utc::now();
        let resolved = resolve_api_key_with(
            &request("openai", &providers),
            |_| None,
            || Ok(cached(3, now)),
            &login,
            now,
        )
        .await
        .expect("resolved");
        assert_eq!(resolved.api_key.as_deref(), Some("sk-cached"));
        assert_eq!(resolved.source, AuthSource::Cache);
    }

    #[tokio::test]
    async fn expired_cache_triggers_login() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let now = Utc::now();
        let resolved = resolve_api_key_with(
            &request("openai", &providers),
            |_| None,
            || Ok(cached(29, now)),
            &login,
            now,
        )
        .await
        .expect("resolved");
        assert_eq!(resolved.api_key.as_deref(), Some("sk-from-login"));
        assert_eq!(login.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cache_without_terminal_fails_with_env_hint() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let now = Utc::now();
        let mut req = request("openai", &providers);
        req.interactive = false;
        let err = resolve_api_key_with(&req, |_| None, || Ok(cached(60, now)), &login, now)
            .await
            .expect_err("expired");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert_eq!(login.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn env_key_beats_cache_unless_login_forced() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let now = Utc::now();
        let env = |name: &str| (name == "OPENAI_API_KEY").then(|| "sk-env".to_string());

        let resolved = resolve_api_key_with(
            &request("openai", &providers),
            env,
            || Ok(cached(1, now)),
            &login,
            now,
        )
        .await
        .expect("resolved");
        assert_eq!(resolved.api_key.as_deref(), Some("sk-env"));

        let mut forced = request("openai", &providers);
        forced.force_login = true;
        let resolved = resolve_api_key_with(&forced, env, || Ok(cached(1, now)), &login, now)
            .await
            .expect("resolved");
        assert_eq!(resolved.source, AuthSource::Login);
    }

    #[tokio::test]
    async fn unreadable_cache_falls_through_to_login() {
        let providers = builtin_providers();
        let login = FakeLogin::new();
        let resolved = resolve_api_key_with(
            &request("openai", &providers),
            |_| None,
            || Err(AuthError::Invalid("corrupt".into())),
            &login,
            Utc::now(),
        )
        .await
        .expect("resolved");
        assert_eq!(resolved.source, AuthSource::Login);
    }
}
