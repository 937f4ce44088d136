use crate::{
    error::{RosterError, RosterResult, S3CredsSnafu, S3Snafu},
    storage::ImageStore,
};
use async_trait::async_trait;
use axum::body::Bytes;
use s3::{Bucket, Region, creds::Credentials, error::S3Error};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;

#[derive(Debug)]
pub struct S3ImageStore {
    bucket: Box<Bucket>,
}

impl S3ImageStore {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &SecretString,
    ) -> RosterResult<Self> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };
        let credentials = Credentials::new(
            Some(access_key),
            Some(secret_key.expose_secret()),
            None,
            None,
            None,
        )
        .context(S3CredsSnafu)?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .context(S3Snafu)?
            .with_path_style();

        Ok(Self { bucket })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> RosterResult<String> {
        self.bucket
            .put_object_with_content_type(format!("/{key}"), &bytes, content_type)
            .await
            .context(S3Snafu)?;
        debug!(?key, size = bytes.len(), "Uploaded image");
        Ok(key.to_string())
    }

    async fn delete(&self, path: &str) -> RosterResult<()> {
        match self.bucket.delete_object(format!("/{path}")).await {
            Ok(_) | Err(S3Error::HttpFailWithBody(404, _)) => Ok(()),
            Err(source) => Err(RosterError::S3 { source }),
        }
    }

    async fn exists(&self, path: &str) -> RosterResult<bool> {
        match self.bucket.head_object(format!("/{path}")).await {
            Ok(_) => Ok(true),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(source) => Err(RosterError::S3 { source }),
        }
    }
}
