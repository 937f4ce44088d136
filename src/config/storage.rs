use crate::error::{BadEnvVarSnafu, InvalidStorageKindSnafu, RosterResult};
use dotenvy::var;
use secrecy::SecretString;
use snafu::ResultExt;
use std::path::PathBuf;

pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "storage/public";

///where uploaded student images live
#[derive(Debug)]
pub enum StorageConfig {
    Local {
        base_path: PathBuf,
    },
    S3 {
        bucket_name: String,
        region: String,
        endpoint: String,
        access_key: String,
        secret_key: SecretString,
    },
}

impl StorageConfig {
    pub fn new() -> RosterResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        let kind = var("IMAGE_STORE").unwrap_or_else(|_| "local".to_string());
        match kind.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local {
                base_path: var("IMAGE_STORAGE_PATH")
                    .unwrap_or_else(|_| DEFAULT_LOCAL_STORAGE_PATH.to_string())
                    .into(),
            }),
            "s3" => Ok(Self::S3 {
                bucket_name: get_env_var("S3_BUCKET_NAME")?,
                region: get_env_var("S3_REGION")?,
                endpoint: get_env_var("S3_ENDPOINT")?,
                access_key: get_env_var("S3_ACCESS_KEY")?,
                secret_key: SecretString::from(get_env_var("S3_SECRET_KEY")?),
            }),
            _ => InvalidStorageKindSnafu { kind }.fail(),
        }
    }

    ///the directory to serve publicly, if images are kept on this machine
    pub fn public_dir(&self) -> Option<&PathBuf> {
        match self {
            Self::Local { base_path } => Some(base_path),
            Self::S3 { .. } => None,
        }
    }
}
