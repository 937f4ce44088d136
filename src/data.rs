use crate::error::RosterResult;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod student;

#[cfg(test)]
pub mod memory;

use student::{NewStudent, Student};

///the record store for students
///
///implementations own their own concurrency safety - callers never lock, and concurrent saves to
///the same row are last-write-wins
#[async_trait]
pub trait StudentStore: Debug + Send + Sync {
    async fn find_by_id(&self, id: i64) -> RosterResult<Option<Student>>;
    async fn all_newest_first(&self) -> RosterResult<Vec<Student>>;
    async fn insert(&self, to_be_added: NewStudent) -> RosterResult<Student>;
    ///writes every mutable column of `student` back to the row with the same id
    async fn save(&self, student: &Student) -> RosterResult<()>;
    async fn delete(&self, id: i64) -> RosterResult<()>;
}
