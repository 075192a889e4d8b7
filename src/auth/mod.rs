//! Credential resolution, device login, and the `auth.json` cache.

mod browser;
mod error;
mod openai;
mod resolver;
mod store;
mod types;

pub use browser::try_open_browser;
pub use error::AuthError;
pub use openai::{
    check_credit_eligibility, complete_openai_device_login, obtain_api_key, parse_chatgpt_claims,
    redeem_free_credits, start_openai_device_login, ChatGptClaims,
};
pub use resolver::{
    resolve_api_key, AuthRequest, AuthSource, DeviceLoginFlow, LoginFlow, ResolvedAuth,
};
pub use store::{default_auth_path, load_credentials, save_credentials};
pub use types::{CredentialRecord, OpenAiDeviceLogin, TokenData, CREDENTIAL_MAX_AGE_DAYS};
