use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

use shared_models::auth::Role;

use crate::error::ClientError;

/// Where a login's bearer token lives after it is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialPersistence {
    /// Written to a file and survives restarts.
    Durable,
    /// Shared by every client in this process until it exits.
    #[default]
    Session,
    /// Held only by the client that logged in.
    Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub role: Role,
    pub user_id: i64,
}

#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    async fn load(&self) -> Result<Option<Credential>, ClientError>;
    async fn save(&self, credential: &Credential) -> Result<(), ClientError>;
    async fn clear(&self) -> Result<(), ClientError>;
    fn persistence(&self) -> CredentialPersistence;
}

// ==============================================================================
// DURABLE
// ==============================================================================

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(credential)?;

        // Owner read/write only; the file holds a bearer token.
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
        }
        file.write_all(&bytes).await?;
        file.flush().await?;
        debug!("Credential written to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn persistence(&self) -> CredentialPersistence {
        CredentialPersistence::Durable
    }
}

// ==============================================================================
// SESSION
// ==============================================================================

static PROCESS_SESSION: LazyLock<Arc<RwLock<Option<Credential>>>> =
    LazyLock::new(|| Arc::new(RwLock::new(None)));

/// In-memory slot; clones share it.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentialStore {
    slot: Arc<RwLock<Option<Credential>>>,
}

impl SessionCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the one slot shared by the whole process.
    pub fn process() -> Self {
        Self {
            slot: Arc::clone(&PROCESS_SESSION),
        }
    }
}

#[async_trait]
impl CredentialStore for SessionCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, ClientError> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        *self.slot.write().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.slot.write().await = None;
        Ok(())
    }

    fn persistence(&self) -> CredentialPersistence {
        CredentialPersistence::Session
    }
}

// ==============================================================================
// EPHEMERAL
// ==============================================================================

#[derive(Debug, Default)]
pub struct EphemeralCredentialStore {
    slot: RwLock<Option<Credential>>,
}

impl EphemeralCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for EphemeralCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, ClientError> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        *self.slot.write().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.slot.write().await = None;
        Ok(())
    }

    fn persistence(&self) -> CredentialPersistence {
        CredentialPersistence::Ephemeral
    }
}

/// Builds the store for a policy. `Durable` needs a file path.
pub fn credential_store(
    policy: CredentialPersistence,
    path: Option<&Path>,
) -> Result<Arc<dyn CredentialStore>, ClientError> {
    match policy {
        CredentialPersistence::Durable => {
            let path = path.ok_or_else(|| {
                ClientError::Config("durable credentials need a file path".to_string())
            })?;
            Ok(Arc::new(FileCredentialStore::new(path)))
        }
        CredentialPersistence::Session => Ok(Arc::new(SessionCredentialStore::process())),
        CredentialPersistence::Ephemeral => Ok(Arc::new(EphemeralCredentialStore::new())),
    }
}
