use crate::{
    data::StudentStore,
    error::{GetDatabaseConnectionSnafu, MakeQuerySnafu, RosterResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Postgres, pool::PoolConnection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub course: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub course: String,
    pub email: String,
    pub phone: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PgStudentStore {
    pool: Pool<Postgres>,
}

impl PgStudentStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn get_connection(&self) -> RosterResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn find_by_id(&self, id: i64) -> RosterResult<Option<Student>> {
        let mut conn = self.get_connection().await?;
        sqlx::query_as::<_, Student>("SELECT * FROM public.students WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn all_newest_first(&self) -> RosterResult<Vec<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM public.students ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn insert(&self, to_be_added: NewStudent) -> RosterResult<Student> {
        let NewStudent {
            name,
            course,
            email,
            phone,
            image,
        } = to_be_added;

        let mut conn = self.get_connection().await?;
        sqlx::query_as::<_, Student>("INSERT INTO public.students (name, course, email, phone, image) VALUES ($1, $2, $3, $4, $5) RETURNING *")
            .bind(name)
            .bind(course)
            .bind(email)
            .bind(phone)
            .bind(image)
            .fetch_one(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn save(&self, student: &Student) -> RosterResult<()> {
        let mut conn = self.get_connection().await?;
        sqlx::query("UPDATE public.students SET name = $2, course = $3, email = $4, phone = $5, image = $6, updated_at = now() WHERE id = $1")
            .bind(student.id)
            .bind(&student.name)
            .bind(&student.course)
            .bind(&student.email)
            .bind(&student.phone)
            .bind(&student.image)
            .execute(&mut *conn)
            .await
            .context(MakeQuerySnafu)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RosterResult<()> {
        let mut conn = self.get_connection().await?;
        sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context(MakeQuerySnafu)?;
        Ok(())
    }
}
