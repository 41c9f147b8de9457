//! Snapshot backend trait, configuration and error types

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

/// Errors that can occur when interacting with a snapshot backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The snapshot is locked by another process
    #[error("Snapshot is locked by {who} (lock ID: {lock_id}, operation: {operation})")]
    Locked {
        lock_id: String,
        who: String,
        operation: String,
    },

    /// The lock was not found (for release/force-unlock operations)
    #[error("Lock not found: {0}")]
    LockNotFound(String),

    /// Lock ID mismatch when trying to release
    #[error("Lock ID mismatch: expected {expected}, got {actual}")]
    LockMismatch { expected: String, actual: String },

    /// Snapshot lineage mismatch (prevents overwriting an unrelated stack)
    #[error("Snapshot lineage mismatch: expected {expected}, got {actual}")]
    LineageMismatch { expected: String, actual: String },

    /// Configuration error
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// The bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Snapshot file is corrupted or invalid
    #[error("Invalid snapshot file: {0}")]
    InvalidState(String),

    /// Network or I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    /// Create a Locked error from a LockInfo
    pub fn locked(lock: &LockInfo) -> Self {
        Self::Locked {
            lock_id: lock.id.clone(),
            who: lock.who.clone(),
            operation: lock.operation.clone(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Where snapshots are stored
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    /// JSON file on the local filesystem
    Local { path: PathBuf },
    /// Object in a versioned S3 bucket
    S3 {
        bucket: String,
        key: String,
        region: String,
    },
}

impl BackendConfig {
    /// Default snapshot file name for the local backend
    pub const DEFAULT_STATE_FILE: &'static str = "altair.state.json";

    /// Parse a backend location.
    ///
    /// `s3://bucket/path/to/state.json` selects the S3 backend (region
    /// from `region`); anything else is a local file path.
    pub fn parse(location: &str, region: &str) -> BackendResult<Self> {
        if let Some(rest) = location.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').ok_or_else(|| {
                BackendError::configuration(format!(
                    "Invalid S3 location '{}': expected s3://bucket/key",
                    location
                ))
            })?;
            if bucket.is_empty() || key.is_empty() {
                return Err(BackendError::configuration(format!(
                    "Invalid S3 location '{}': bucket and key must be non-empty",
                    location
                )));
            }
            Ok(Self::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
                region: region.to_string(),
            })
        } else {
            Ok(Self::Local {
                path: PathBuf::from(location),
            })
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local {
            path: PathBuf::from(Self::DEFAULT_STATE_FILE),
        }
    }
}

/// Trait for snapshot storage backends
///
/// Defines the interface for storing and retrieving snapshot files, and
/// for the locks guarding concurrent access.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the current snapshot from the backend
    ///
    /// Returns `None` if no snapshot exists (first-time use)
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Write the snapshot to the backend
    ///
    /// The snapshot's serial number should be incremented before calling
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Acquire a lock for the given operation
    ///
    /// Fails if a non-expired lock is already held by another process
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    /// Release a previously acquired lock
    ///
    /// Verifies the held lock matches the provided lock info
    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Force release a lock by its ID
    ///
    /// Administrative operation, to be used with caution
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;

    /// Initialize the backend (create bucket if needed, etc.)
    async fn init(&self) -> BackendResult<()>;
}
