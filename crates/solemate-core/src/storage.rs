//! Persistent storage for profiles and settings.
//!
//! Uses one pretty-printed JSON file per document:
//!
//! ```text
//! <data_dir>/
//! ├── settings.json
//! └── users/
//!     └── <uid>.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::profile::{ProfileDocument, ProfileError, ProfileResult, ProfileStore};

/// Returns the default data directory.
///
/// On Linux: `/var/lib/solemate/`
/// Elsewhere: the platform data directory, e.g. `~/Library/Application Support/solemate`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/lib/solemate")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "solemate")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./data"))
    }
}

/// File-backed storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Creates storage rooted at `data_dir`. Nothing is created until the
    /// first write.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the settings document.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    /// Path of the profile document for `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidId`] if `uid` could escape the users directory.
    pub fn profile_path(&self, uid: &str) -> ProfileResult<PathBuf> {
        let valid = !uid.is_empty()
            && uid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ProfileError::InvalidId(uid.to_string()));
        }
        Ok(self.data_dir.join("users").join(format!("{uid}.json")))
    }
}

#[async_trait]
impl ProfileStore for Storage {
    async fn read(&self, uid: &str) -> ProfileResult<Option<ProfileDocument>> {
        let path = self.profile_path(uid)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ProfileError::ReadError { path, source }),
        };
        let profile = serde_json::from_str(&content)
            .map_err(|source| ProfileError::ParseError { path, source })?;
        Ok(Some(profile))
    }

    async fn write(&self, uid: &str, profile: &ProfileDocument) -> ProfileResult<()> {
        let path = self.profile_path(uid)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ProfileError::WriteError {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = serde_json::to_string_pretty(profile)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| ProfileError::WriteError {
                path: path.clone(),
                source,
            })?;
        debug!(uid, path = %path.display(), "Profile written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::identity::{Principal, SignInMethod};

    fn profile() -> ProfileDocument {
        let principal = Principal {
            uid: "u1".into(),
            email: Some("a@b.com".into()),
            display_name: Some("Ada".into()),
            photo_url: None,
            email_verified: false,
            sign_in_method: SignInMethod::Password,
        };
        ProfileDocument::for_new_principal(&principal, Utc::now())
    }

    #[test]
    fn test_default_data_dir_is_valid_path() {
        assert!(!default_data_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_profile_path_rejects_traversal() {
        let storage = Storage::new("/tmp/solemate");
        assert!(storage.profile_path("../etc/passwd").is_err());
        assert!(storage.profile_path("").is_err());
        assert!(storage
            .profile_path("4f0c1a7e-0c55-4c7b-9d0e-3b8f5e0d9a11")
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_profile_reads_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        assert!(storage.read("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        let profile = profile();

        storage.write("u1", &profile).await.unwrap();
        assert!(dir.path().join("users").join("u1.json").exists());
        assert_eq!(storage.read("u1").await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_corrupt_profile_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        std::fs::create_dir_all(dir.path().join("users")).unwrap();
        std::fs::write(dir.path().join("users").join("u1.json"), "{not json").unwrap();

        assert!(matches!(
            storage.read("u1").await,
            Err(ProfileError::ParseError { .. })
        ));
    }
}
