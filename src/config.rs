use crate::error::{BadEnvVarSnafu, ParsePortSnafu, RosterResult};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::sync::Arc;

pub mod storage;

use storage::StorageConfig;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    storage_config: Arc<StorageConfig>,
    server_ip: String,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            storage_config: Arc::new(StorageConfig::new()?),
            server_ip: var("ROSTER_SERVER_IP").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn storage_config(&self) -> Arc<StorageConfig> {
        self.storage_config.clone()
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> RosterResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
