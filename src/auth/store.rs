//! Persistent credential file helpers.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::codex_home;

use super::error::AuthError;
use super::types::CredentialRecord;

/// Returns the default credential path (`$CODEX_HOME/auth.json`) when available.
pub fn default_auth_path() -> Option<PathBuf> {
    codex_home().map(|dir| dir.join("auth.json"))
}

/// Load the credential record at `path`; a missing file yields `None`.
pub fn load_credentials(path: &Path) -> Result<Option<CredentialRecord>, AuthError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let record = serde_json::from_str(&text).map_err(|err| {
                AuthError::Invalid(format!(
                    "failed to parse credential file `{}`: {err}",
                    path.display()
                ))
            })?;
            Ok(Some(record))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(AuthError::Io(err)),
    }
}

/// Persist the credential record to disk with restrictive permissions.
pub fn save_credentials(path: &Path, record: &CredentialRecord) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
        }
    }

    let text = serde_json::to_string_pretty(record)?;
    let mut options = std::fs::OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    #[cfg(unix)]
    {
        // An existing file keeps its old mode through `open`.
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    tracing::debug!(path = %path.display(), "saved credentials");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenData;
    use chrono::Utc;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            load_credentials(&dir.path().join("auth.json")).expect("load"),
            None
        );
    }

    #[test]
    fn save_then_load_round_trips_with_private_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("home").join("auth.json");
        let record = CredentialRecord {
            openai_api_key: Some("sk-test".into()),
            tokens: Some(TokenData {
                id_token: "id".into(),
                access_token: "access".into(),
                refresh_token: "refresh".into(),
            }),
            last_refresh: Some(Utc::now()),
        };
        save_credentials(&path, &record).expect("save");
        assert_eq!(load_credentials(&path).expect("load"), Some(record));

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"OPENAI_API_KEY\""), "raw: {raw}");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).expect("meta").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "{").expect("write");
        let err = load_credentials(&path).expect_err("malformed");
        assert!(err.to_string().contains("failed to parse credential file"));
    }
}
