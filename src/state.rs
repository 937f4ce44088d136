use crate::{
    config::RuntimeConfiguration,
    data::student::PgStudentStore,
    error::{MigrateSnafu, OpenDatabaseSnafu, RosterResult},
    service::StudentService,
    storage::open_image_store,
};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct RosterState {
    pool: Pool<Postgres>,
    config: RuntimeConfiguration,
    students: StudentService,
}

impl RosterState {
    pub async fn new(options: PgPoolOptions, config: RuntimeConfiguration) -> RosterResult<Self> {
        let pool = options
            .connect(&config.db_config().get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        let images = open_image_store(&config.storage_config()).await?;
        let students = StudentService::new(Arc::new(PgStudentStore::new(pool.clone())), images);

        Ok(Self {
            pool,
            config,
            students,
        })
    }

    pub fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub fn students(&self) -> StudentService {
        self.students.clone()
    }

    pub async fn sensible_shutdown(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}
