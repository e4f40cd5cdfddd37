//! API password storage.
//!
//! Passwords go to the OS keyring when one is available and are always mirrored into a
//! file encrypted with a per-user master key, so a keyring that drops or refuses entries
//! does not lose them.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use keyring::Entry;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credentials::config_directory;
use crate::error::{Error, Result};

const SERVICE_NAME: &str = "info.castellersdemontreal.presences";
const SECRETS_DIR: &str = "secrets";
const MASTER_KEY_FILE: &str = "secret.key";
const FALLBACK_EXTENSION: &str = ".json";

#[derive(Debug, Serialize, Deserialize)]
struct FallbackSecret {
    nonce: String,
    ciphertext: String,
}

fn crypto_error(err: impl std::fmt::Display) -> Error {
    Error::Secret(err.to_string())
}

/// Keyring-backed password store with an encrypted on-disk mirror in `dir`.
#[derive(Debug, Clone)]
pub struct SecretStore {
    dir: PathBuf,
    service: String,
}

impl SecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Store under the per-user configuration directory.
    pub fn user_default() -> Self {
        Self::new(config_directory().join(SECRETS_DIR))
    }

    fn entry(&self, username: &str) -> std::result::Result<Entry, keyring::Error> {
        Entry::new(&self.service, username)
    }

    fn fallback_path(&self, username: &str) -> PathBuf {
        self.dir
            .join(format!("{}{FALLBACK_EXTENSION}", urlencoding::encode(username)))
    }

    fn master_key_path(&self) -> PathBuf {
        self.dir.join(MASTER_KEY_FILE)
    }

    /// Persist the password for `username`, then read it back to prove it was kept.
    pub fn store(&self, username: &str, password: &str) -> Result<()> {
        let trimmed = password.trim();
        if trimmed.is_empty() {
            return Err(Error::Secret("cannot store empty password".to_string()));
        }
        if username.trim().is_empty() {
            return Err(Error::Secret("username must not be empty".to_string()));
        }

        match self.entry(username).and_then(|entry| entry.set_password(trimmed)) {
            Ok(()) => debug!(username, "Stored password in keyring"),
            Err(err) => warn!(username, error = %err, "Keyring unavailable, using encrypted file only"),
        }
        self.store_fallback(username, trimmed)?;

        match self.load(username)? {
            Some(stored) if stored == trimmed => Ok(()),
            _ => Err(Error::Secret(format!(
                "password for '{username}' could not be read back after saving"
            ))),
        }
    }

    /// Look up the password for `username`; `Ok(None)` when neither backend has it.
    pub fn load(&self, username: &str) -> Result<Option<String>> {
        match self.entry(username).and_then(|entry| entry.get_password()) {
            Ok(value) if !value.trim().is_empty() => return Ok(Some(value)),
            Ok(_) | Err(keyring::Error::NoEntry) => {}
            Err(err) => warn!(username, error = %err, "Keyring lookup failed, trying encrypted file"),
        }
        self.load_fallback(username)
    }

    pub fn delete(&self, username: &str) -> Result<()> {
        match self.entry(username).and_then(|entry| entry.delete_credential()) {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(err) => warn!(username, error = %err, "Keyring delete failed"),
        }
        match fs::remove_file(self.fallback_path(username)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn store_fallback(&self, username: &str, secret: &str) -> Result<()> {
        let (nonce, ciphertext) = self.encrypt(secret.as_bytes())?;
        let payload = FallbackSecret {
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        };
        let encoded = serde_json::to_string(&payload).map_err(crypto_error)?;

        fs::create_dir_all(&self.dir)?;
        fs::write(self.fallback_path(username), encoded)?;
        Ok(())
    }

    fn load_fallback(&self, username: &str) -> Result<Option<String>> {
        let raw = match fs::read_to_string(self.fallback_path(username)) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::Io(err)),
        };

        let payload: FallbackSecret = serde_json::from_str(&raw).map_err(crypto_error)?;
        let nonce = STANDARD.decode(payload.nonce).map_err(crypto_error)?;
        let ciphertext = STANDARD.decode(payload.ciphertext).map_err(crypto_error)?;
        let plaintext = self.decrypt(&nonce, &ciphertext)?;
        Ok(Some(String::from_utf8_lossy(&plaintext).into_owned()))
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<([u8; 12], Vec<u8>)> {
        let key = self.master_key()?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key).map_err(crypto_error)?;

        let mut nonce = [0u8; 12];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(crypto_error)?;
        Ok((nonce, ciphertext))
    }

    fn decrypt(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if nonce.len() != 12 {
            return Err(Error::Secret(
                "invalid nonce length for chacha20poly1305".to_string(),
            ));
        }
        let key = self.master_key()?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key).map_err(crypto_error)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(crypto_error)
    }

    fn master_key(&self) -> Result<[u8; 32]> {
        let path = self.master_key_path();
        if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                return Ok(key);
            }
            warn!(
                path = %path.display(),
                len = bytes.len(),
                "Master key has unexpected length; regenerating"
            );
        }

        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        fs::create_dir_all(&self.dir)?;
        write_key_file(&path, &key)?;
        Ok(key)
    }
}

fn write_key_file(path: &Path, key: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(key)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn store_password(username: &str, password: &str) -> Result<()> {
    SecretStore::user_default().store(username, password)
}

pub fn load_password(username: &str) -> Result<Option<String>> {
    SecretStore::user_default().load(username)
}

pub fn delete_password(username: &str) -> Result<()> {
    SecretStore::user_default().delete(username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn unique_user(label: &str) -> String {
        format!("presences-test-{}-{label}", std::process::id())
    }

    #[test]
    fn test_store_rejects_blank_values() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        assert!(matches!(store.store("someone", "   "), Err(Error::Secret(_))));
        assert!(matches!(store.store("", "secret"), Err(Error::Secret(_))));
    }

    #[test]
    fn test_stored_password_can_be_loaded_back() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        let user = unique_user("roundtrip");

        store.store(&user, " s3cret ").unwrap();
        assert_eq!(store.load(&user).unwrap().as_deref(), Some("s3cret"));

        // A fresh store over the same directory sees the password too.
        let reopened = SecretStore::new(dir.path());
        assert_eq!(reopened.load(&user).unwrap().as_deref(), Some("s3cret"));

        store.delete(&user).unwrap();
        assert_eq!(store.load(&user).unwrap(), None);
    }

    #[test]
    fn test_fallback_file_is_encrypted() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        let user = unique_user("a/b@c");

        store.store(&user, "plaintext-password").unwrap();
        let path = store.fallback_path(&user);
        assert_eq!(path.parent(), Some(dir.path()));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("plaintext-password"));

        store.delete(&user).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_unknown_user_is_ok() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        store.delete(&unique_user("never-stored")).unwrap();
    }
}
