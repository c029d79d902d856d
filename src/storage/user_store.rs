use std::{io::ErrorKind, path::PathBuf};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use thiserror::Error;
use tokio::{fs::File, io::AsyncWriteExt, sync::RwLock};
use tracing::info;
use uuid::Uuid;

use super::entities::UserRecord;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Registry of accounts and their API keys. The whole registry lives in a single JSON
/// file, loaded once and rewritten on every mutation. Account counts are expected to
/// stay small compared to activity volume.
pub struct FileUserStore {
    path: PathBuf,
    users: RwLock<Vec<UserRecord>>,
}

/// Opaque bearer credential, 64 hex characters.
pub fn generate_api_key() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

impl FileUserStore {
    pub async fn open(path: PathBuf) -> Result<Self> {
        let users = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => vec![],
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    pub async fn register(&self, name: String, email: String) -> Result<UserRecord, RegisterError> {
        let mut users = self.users.write().await;
        if users.iter().any(|user| user.email == email) {
            return Err(RegisterError::DuplicateEmail(email));
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            name,
            email,
            api_key: generate_api_key(),
        };

        let mut next = users.clone();
        next.push(user.clone());
        self.persist(&next).await?;
        *users = next;

        info!("Registered account {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn find_by_api_key(&self, api_key: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .iter()
            .find(|user| user.api_key == api_key)
            .cloned()
    }

    /// Replaces the key of an account. Returns the new key, or None for an unknown
    /// account.
    pub async fn regenerate_api_key(&self, user: Uuid) -> Result<Option<String>> {
        let mut users = self.users.write().await;
        let Some(at) = users.iter().position(|candidate| candidate.id == user) else {
            return Ok(None);
        };

        let mut next = users.clone();
        next[at].api_key = generate_api_key();
        self.persist(&next).await?;

        let key = next[at].api_key.clone();
        *users = next;
        Ok(Some(key))
    }

    async fn persist(&self, users: &[UserRecord]) -> Result<()> {
        let body = serde_json::to_vec_pretty(users)?;

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .await?;

        file.lock_exclusive()?;
        let result = async {
            file.write_all(&body).await?;
            file.flush().await?;
            anyhow::Ok(())
        }
        .await;
        file.unlock_async().await?;
        result
    }
}
