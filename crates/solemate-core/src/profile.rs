//! Profile documents keyed by principal id.
//!
//! The store is a document-style collaborator; the account flows only ever
//! call [`ProfileStore::read`] (read-if-exists) and [`ProfileStore::write`].

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::identity::Principal;

/// Errors from profile persistence.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The document could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document exists but is not valid JSON.
    #[error("Failed to parse {}: {source}", path.display())]
    ParseError {
        /// Document path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The document could not be serialized.
    #[error("Failed to serialize profile: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// The principal id cannot be used as a document key.
    #[error("Invalid profile id: '{0}'")]
    InvalidId(String),
}

/// Result type for profile operations.
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

/// Per-user navigation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Preferences {
    /// Spoken turn-by-turn guidance.
    pub voice_guidance: bool,
    /// Vibration cues from the shoe.
    pub haptic_feedback: bool,
    /// Phone numbers to alert in an emergency.
    pub emergency_contacts: Vec<String>,
    /// UI and voice language.
    #[schema(example = "en")]
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            voice_guidance: true,
            haptic_feedback: true,
            emergency_contacts: Vec::new(),
            language: "en".to_string(),
        }
    }
}

/// The stored profile for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfileDocument {
    /// Email at the time the profile was written.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub photo_url: Option<String>,
    /// How the account was created (`email` or `google`).
    #[schema(example = "email")]
    pub provider: String,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// Most recent successful sign-in.
    pub last_login_at: DateTime<Utc>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether onboarding details have been filled in.
    pub profile_complete: bool,
    /// Navigation preferences.
    pub preferences: Preferences,
}

impl ProfileDocument {
    /// A fresh profile for a principal that just signed in for the first time.
    #[must_use]
    pub fn for_new_principal(principal: &Principal, now: DateTime<Utc>) -> Self {
        Self {
            email: principal.email.clone(),
            display_name: principal.display_name.clone(),
            photo_url: principal.photo_url.clone(),
            provider: principal.sign_in_method.provider_label().to_string(),
            created_at: now,
            last_login_at: now,
            is_active: true,
            profile_complete: false,
            preferences: Preferences::default(),
        }
    }
}

/// Document store for profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Reads the profile for `uid`, if one exists.
    async fn read(&self, uid: &str) -> ProfileResult<Option<ProfileDocument>>;

    /// Writes (creates or replaces) the profile for `uid`.
    async fn write(&self, uid: &str, profile: &ProfileDocument) -> ProfileResult<()>;
}

/// Profile store backed by a map; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    documents: RwLock<HashMap<String, ProfileDocument>>,
}

impl MemoryProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn read(&self, uid: &str) -> ProfileResult<Option<ProfileDocument>> {
        Ok(self.documents.read().await.get(uid).cloned())
    }

    async fn write(&self, uid: &str, profile: &ProfileDocument) -> ProfileResult<()> {
        self.documents
            .write()
            .await
            .insert(uid.to_string(), profile.clone());
        Ok(())
    }
}
