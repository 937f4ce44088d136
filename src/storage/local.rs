use crate::{
    error::{IoSnafu, RosterResult},
    storage::ImageStore,
};
use async_trait::async_trait;
use axum::body::Bytes;
use snafu::ResultExt;
use std::{io::ErrorKind, path::PathBuf};
use tokio::fs;

///keeps images in a directory on disk, which is also served at `/storage`
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    base_path: PathBuf,
}

impl LocalImageStore {
    pub async fn new(base_path: PathBuf) -> RosterResult<Self> {
        fs::create_dir_all(&base_path).await.context(IoSnafu {
            path: base_path.display().to_string(),
        })?;
        Ok(Self { base_path })
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, key: &str, bytes: Bytes, _content_type: &str) -> RosterResult<String> {
        let full_path = self.full_path(key);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context(IoSnafu { path: key })?;
        }

        fs::write(&full_path, &bytes)
            .await
            .context(IoSnafu { path: key })?;
        debug!(?full_path, size = bytes.len(), "Saved image");

        Ok(key.to_string())
    }

    async fn delete(&self, path: &str) -> RosterResult<()> {
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => {
                debug!(?path, "Deleted image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(?path, "Tried to delete image that wasn't there");
                Ok(())
            }
            Err(source) => Err(source).context(IoSnafu { path }),
        }
    }

    async fn exists(&self, path: &str) -> RosterResult<bool> {
        fs::try_exists(self.full_path(path))
            .await
            .context(IoSnafu { path })
    }
}
