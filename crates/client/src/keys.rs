//! Per-login private key files.
//!
//! Layout: `{key_dir}/{login}-cert.pem`, one PKCS#1 PEM per login. The file is
//! written once at registration and read back at every login.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::PrivateKeyPem;

/// Errors from the key file store.
#[derive(Debug, Error)]
pub enum KeyFileError {
    /// The login cannot be used as a file name.
    #[error("login {0:?} cannot be used as a key file name")]
    InvalidLogin(String),

    /// No key file exists for this login in the key directory.
    #[error("no key file at {}", .0.display())]
    Missing(PathBuf),

    #[error("key file I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory holding one private key file per login.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the key file for `login`.
    ///
    /// # Errors
    ///
    /// [`KeyFileError::InvalidLogin`] if `login` is empty, contains a path
    /// separator, or is a relative path component.
    pub fn path_for(&self, login: &str) -> Result<PathBuf, KeyFileError> {
        let bad = login.is_empty()
            || login == "."
            || login == ".."
            || login.contains(['/', '\\', '\0']);
        if bad {
            return Err(KeyFileError::InvalidLogin(login.to_owned()));
        }
        Ok(self.dir.join(format!("{login}-cert.pem")))
    }

    /// Write `pem` as the key for `login`, replacing any previous file.
    ///
    /// Creates the key directory if needed. On unix the file is `0600`.
    pub async fn save(&self, login: &str, pem: &str) -> Result<PathBuf, KeyFileError> {
        let path = self.path_for(login)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| KeyFileError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let io_err = |source| KeyFileError::Io {
            path: path.clone(),
            source,
        };
        let mut file = options.open(&path).await.map_err(io_err)?;
        file.write_all(pem.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        debug!(path = %path.display(), "key file written");
        Ok(path)
    }

    /// Read the key for `login`.
    pub async fn load(&self, login: &str) -> Result<PrivateKeyPem, KeyFileError> {
        let path = self.path_for(login)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(pem) => Ok(Zeroizing::new(pem)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(KeyFileError::Missing(path)),
            Err(source) => Err(KeyFileError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_login_and_suffix() {
        let store = KeyStore::new("/var/keys");
        assert_eq!(
            store.path_for("alice").unwrap(),
            PathBuf::from("/var/keys/alice-cert.pem")
        );
    }

    #[test]
    fn path_traversal_logins_are_rejected() {
        let store = KeyStore::new("keys");
        for login in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(
                matches!(store.path_for(login), Err(KeyFileError::InvalidLogin(_))),
                "{login:?}"
            );
        }
    }

    #[tokio::test]
    async fn save_creates_directory_and_load_reads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let store = KeyStore::new(tmp.path().join("nested").join("keys"));

        let path = store.save("alice", "PEM DATA").await.unwrap();
        assert!(path.ends_with("alice-cert.pem"));
        assert_eq!(store.load("alice").await.unwrap().as_str(), "PEM DATA");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let store = KeyStore::new(tmp.path());
        let path = store.save("alice", "PEM").await.unwrap();
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn missing_key_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let store = KeyStore::new(tmp.path());
        assert!(matches!(store.load("bob").await, Err(KeyFileError::Missing(_))));
    }

    #[tokio::test]
    async fn save_overwrites_previous_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = KeyStore::new(tmp.path());
        store.save("alice", "first-and-longer").await.unwrap();
        store.save("alice", "second").await.unwrap();
        assert_eq!(store.load("alice").await.unwrap().as_str(), "second");
    }
}
