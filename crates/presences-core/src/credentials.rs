//! Credential and API configuration loading.
//!
//! The credentials file is TOML:
//!
//! ```toml
//! [default]
//! username = "someone"
//! password = "secret"   # optional, falls back to the OS keyring
//!
//! [api]
//! base_url = "https://api.amunt.castellersdemontreal.info/api/v1/"   # optional
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::secret_store;

pub const DEFAULT_BASE_URL: &str = "https://api.amunt.castellersdemontreal.info/api/v1/";
const CONFIG_DIR_NAME: &str = "presences";
const LOCAL_CREDENTIALS_FILE: &str = "creds";
const CREDENTIALS_FILE_NAME: &str = "creds.toml";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    default: Option<DefaultSection>,
    #[serde(default)]
    api: ApiSection,
}

#[derive(Debug, Deserialize)]
struct DefaultSection {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
}

/// Directory holding the per-user credentials file and logs.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Pick the credentials file: explicit path, then `./creds`, then the config directory.
pub fn resolve_credentials_path(explicit: Option<&str>) -> PathBuf {
    if let Some(raw) = explicit {
        return PathBuf::from(shellexpand::tilde(raw).into_owned());
    }

    let local = PathBuf::from(LOCAL_CREDENTIALS_FILE);
    if local.exists() {
        return local;
    }

    config_directory().join(CREDENTIALS_FILE_NAME)
}

/// Read credentials from `path`, consulting the keyring when no password is stored in the file.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    load_credentials_with(path, secret_store::load_password)
}

pub(crate) fn load_credentials_with<F>(path: &Path, keyring_lookup: F) -> Result<Credentials>
where
    F: FnOnce(&str) -> Result<Option<String>>,
{
    let raw = fs::read_to_string(path).map_err(|err| {
        Error::config(format!(
            "failed to read credentials file {}: {}",
            path.display(),
            err
        ))
    })?;
    let parsed = parse_credentials(&raw)
        .map_err(|err| Error::config(format!("{}: {}", path.display(), err)))?;

    let password = match parsed.password {
        Some(password) => password,
        None => {
            debug!(username = %parsed.username, "No password in credentials file, trying keyring");
            keyring_lookup(&parsed.username)?.ok_or_else(|| {
                Error::config(format!(
                    "no password for '{}' in {} or the keyring",
                    parsed.username,
                    path.display()
                ))
            })?
        }
    };

    Ok(Credentials {
        username: parsed.username,
        password,
        base_url: parsed.base_url,
    })
}

struct ParsedCredentials {
    username: String,
    password: Option<String>,
    base_url: String,
}

fn parse_credentials(raw: &str) -> std::result::Result<ParsedCredentials, String> {
    let file: CredentialsFile = toml::from_str(raw).map_err(|err| err.to_string())?;
    let section = file
        .default
        .ok_or_else(|| "missing [default] section".to_string())?;

    let username = section
        .username
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| "missing username in [default] section".to_string())?;
    let password = section.password.filter(|value| !value.is_empty());

    let base_url = file
        .api
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(normalize_base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Ok(ParsedCredentials {
        username,
        password,
        base_url,
    })
}

/// Endpoints are joined by plain concatenation, so the base must end with `/`.
fn normalize_base_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
