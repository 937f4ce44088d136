use crate::{
    data::{
        StudentStore,
        student::{NewStudent, Student},
    },
    error::RosterResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

///`StudentStore` backed by a map, for driving the service without postgres
#[derive(Debug, Default)]
pub struct MemoryStudentStore {
    rows: Mutex<(i64, BTreeMap<i64, Student>)>,
    fail_inserts: AtomicBool,
}

impl MemoryStudentStore {
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn find_by_id(&self, id: i64) -> RosterResult<Option<Student>> {
        Ok(self.rows.lock().unwrap().1.get(&id).cloned())
    }

    async fn all_newest_first(&self) -> RosterResult<Vec<Student>> {
        Ok(self.rows.lock().unwrap().1.values().rev().cloned().collect())
    }

    async fn insert(&self, to_be_added: NewStudent) -> RosterResult<Student> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(crate::error::RosterError::MakeQuery {
                source: sqlx::Error::PoolClosed,
            });
        }

        let mut guard = self.rows.lock().unwrap();
        let (last_id, rows) = &mut *guard;
        *last_id += 1;

        let now = Utc::now();
        let student = Student {
            id: *last_id,
            name: to_be_added.name,
            course: Some(to_be_added.course),
            email: Some(to_be_added.email),
            phone: Some(to_be_added.phone),
            image: to_be_added.image,
            created_at: now,
            updated_at: now,
        };
        rows.insert(student.id, student.clone());
        Ok(student)
    }

    async fn save(&self, student: &Student) -> RosterResult<()> {
        if let Some(existing) = self.rows.lock().unwrap().1.get_mut(&student.id) {
            *existing = Student {
                updated_at: Utc::now(),
                ..student.clone()
            };
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> RosterResult<()> {
        self.rows.lock().unwrap().1.remove(&id);
        Ok(())
    }
}
