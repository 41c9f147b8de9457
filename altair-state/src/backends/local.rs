//! Local file backend for snapshot storage
//!
//! Stores the snapshot in a local JSON file (default:
//! altair.state.json) with a `.lock` sibling for locking.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

/// Local file backend for development and single-operator use
pub struct LocalBackend {
    /// Path to the snapshot file
    state_path: PathBuf,
    /// Path to the lock file
    lock_path: PathBuf,
}

impl LocalBackend {
    /// Create a LocalBackend with the default path in the current directory
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(BackendConfig::DEFAULT_STATE_FILE))
    }

    /// Create a LocalBackend with a specific snapshot file path
    pub fn with_path(state_path: PathBuf) -> Self {
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    pub fn state_path(&self) -> &PathBuf {
        &self.state_path
    }

    fn read_lock_file(&self) -> BackendResult<Option<LockInfo>> {
        if !self.lock_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.lock_path)
            .map_err(|e| BackendError::Io(format!("Failed to read lock file: {}", e)))?;
        match serde_json::from_str::<LockInfo>(&content) {
            Ok(lock) => Ok(Some(lock)),
            // An unreadable lock file is treated as stale
            Err(_) => Ok(None),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        if !self.state_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.state_path)
            .map_err(|e| BackendError::Io(format!("Failed to read snapshot file: {}", e)))?;

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse snapshot file: {}", e))
        })?;

        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(existing) = self.read_state().await?
            && existing.lineage != state.lineage
        {
            return Err(BackendError::LineageMismatch {
                expected: existing.lineage,
                actual: state.lineage.clone(),
            });
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize snapshot: {}", e))
        })?;

        // Write via a temp sibling so a crash never truncates the snapshot
        let tmp_path = self.state_path.with_extension("tmp");
        std::fs::write(&tmp_path, content)
            .map_err(|e| BackendError::Io(format!("Failed to write snapshot file: {}", e)))?;
        std::fs::rename(&tmp_path, &self.state_path)
            .map_err(|e| BackendError::Io(format!("Failed to replace snapshot file: {}", e)))?;

        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        if let Some(existing_lock) = self.read_lock_file()?
            && !existing_lock.is_expired()
        {
            return Err(BackendError::locked(&existing_lock));
        }

        let lock = LockInfo::new(operation);
        let content = serde_json::to_string_pretty(&lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        std::fs::write(&self.lock_path, content)
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;

        Ok(lock)
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing_lock = self
            .read_lock_file()?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing_lock.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing_lock.id,
            });
        }

        std::fs::remove_file(&self.lock_path)
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))?;

        Ok(())
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        let existing_lock = self
            .read_lock_file()?
            .ok_or_else(|| BackendError::LockNotFound(lock_id.to_string()))?;

        if existing_lock.id != lock_id {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing_lock.id,
            });
        }

        std::fs::remove_file(&self.lock_path)
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))?;

        Ok(())
    }

    async fn init(&self) -> BackendResult<()> {
        // The local filesystem needs no initialization
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn read_write_round_trip() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join("test.state.json");
        let backend = LocalBackend::with_path(state_path.clone());

        // Initially no snapshot
        assert!(backend.read_state().await.unwrap().is_none());

        let mut state_file = StateFile::new();
        state_file.increment_serial();
        backend.write_state(&state_file).await.unwrap();

        let read_state = backend.read_state().await.unwrap().unwrap();
        assert_eq!(read_state.serial, 1);
        assert_eq!(read_state.lineage, state_file.lineage);
    }

    #[tokio::test]
    async fn lineage_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        backend.write_state(&StateFile::new()).await.unwrap();

        // A different lineage must not overwrite the existing snapshot
        let other = StateFile::new();
        let result = backend.write_state(&other).await;
        assert!(matches!(result, Err(BackendError::LineageMismatch { .. })));
    }

    #[tokio::test]
    async fn locking_cycle() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        let lock = backend.acquire_lock("snapshot").await.unwrap();
        assert_eq!(lock.operation, "snapshot");

        // A second acquire fails while the lock is held
        assert!(backend.acquire_lock("plan").await.is_err());

        backend.release_lock(&lock).await.unwrap();

        // Released, so the next acquire succeeds
        let lock2 = backend.acquire_lock("plan").await.unwrap();
        backend.release_lock(&lock2).await.unwrap();
    }

    #[tokio::test]
    async fn release_with_wrong_id_fails() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        let lock = backend.acquire_lock("snapshot").await.unwrap();
        let mut other = lock.clone();
        other.id = "not-the-lock".to_string();

        let result = backend.release_lock(&other).await;
        assert!(matches!(result, Err(BackendError::LockMismatch { .. })));

        backend.release_lock(&lock).await.unwrap();
    }

    #[tokio::test]
    async fn force_unlock_removes_lock() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        let lock = backend.acquire_lock("snapshot").await.unwrap();
        backend.force_unlock(&lock.id).await.unwrap();

        // Lock gone, acquiring again works
        let lock2 = backend.acquire_lock("snapshot").await.unwrap();
        backend.release_lock(&lock2).await.unwrap();
    }

    #[tokio::test]
    async fn expired_lock_is_taken_over() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        let expired = LockInfo::with_timeout("snapshot", -1);
        std::fs::write(
            backend.state_path().with_extension("lock"),
            serde_json::to_string(&expired).unwrap(),
        )
        .unwrap();

        let lock = backend.acquire_lock("plan").await.unwrap();
        assert_ne!(lock.id, expired.id);
        backend.release_lock(&lock).await.unwrap();
    }
}
