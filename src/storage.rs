use crate::{config::storage::StorageConfig, error::RosterResult};
use async_trait::async_trait;
use axum::body::Bytes;
use std::{fmt::Debug, sync::Arc};

pub mod bucket;
pub mod local;

pub use bucket::S3ImageStore;
pub use local::LocalImageStore;

///the blob store that student images are written to
///
///paths handed out by `store` are relative, and are what gets kept in `students.image`
#[async_trait]
pub trait ImageStore: Debug + Send + Sync {
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> RosterResult<String>;
    ///removing something that isn't there is not an error
    async fn delete(&self, path: &str) -> RosterResult<()>;
    async fn exists(&self, path: &str) -> RosterResult<bool>;
}

pub async fn open_image_store(config: &StorageConfig) -> RosterResult<Arc<dyn ImageStore>> {
    let store: Arc<dyn ImageStore> = match config {
        StorageConfig::Local { base_path } => {
            info!(?base_path, "Storing images locally");
            Arc::new(LocalImageStore::new(base_path.clone()).await?)
        }
        StorageConfig::S3 {
            bucket_name,
            region,
            endpoint,
            access_key,
            secret_key,
        } => {
            info!(?bucket_name, ?endpoint, "Storing images in S3");
            Arc::new(S3ImageStore::new(
                bucket_name,
                region,
                endpoint,
                access_key,
                secret_key,
            )?)
        }
    };
    Ok(store)
}
