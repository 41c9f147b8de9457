//! Backend implementations for snapshot storage

mod local;
mod s3;

pub use local::LocalBackend;
pub use s3::S3Backend;

use crate::backend::{BackendConfig, BackendResult, StateBackend};

/// Create a backend from configuration
pub async fn create_backend(config: &BackendConfig) -> BackendResult<Box<dyn StateBackend>> {
    match config {
        BackendConfig::Local { path } => Ok(Box::new(LocalBackend::with_path(path.clone()))),
        BackendConfig::S3 {
            bucket,
            key,
            region,
        } => {
            let backend = S3Backend::connect(bucket, key, region).await;
            Ok(Box::new(backend))
        }
    }
}
