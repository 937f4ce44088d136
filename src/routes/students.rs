use crate::{
    error::RosterResult,
    service::{Envelope, StudentId, StudentService},
    upload::StudentInput,
};
use axum::extract::{Path, State};

pub async fn get_students(State(students): State<StudentService>) -> RosterResult<Envelope> {
    students.list().await
}

#[axum::debug_handler]
pub async fn create_student(
    State(students): State<StudentService>,
    input: StudentInput,
) -> RosterResult<Envelope> {
    students.create(input).await
}

pub async fn get_student(
    State(students): State<StudentService>,
    Path(id): Path<String>,
) -> RosterResult<Envelope> {
    students.get(StudentId::from(id.as_str())).await
}

pub async fn edit_student(
    State(students): State<StudentService>,
    Path(id): Path<String>,
) -> RosterResult<Envelope> {
    students.edit(StudentId::from(id.as_str())).await
}

pub async fn update_student(
    State(students): State<StudentService>,
    Path(id): Path<String>,
    input: StudentInput,
) -> RosterResult<Envelope> {
    students.update(StudentId::from(id.as_str()), input).await
}

pub async fn update_student_image(
    State(students): State<StudentService>,
    Path(id): Path<String>,
    input: StudentInput,
) -> RosterResult<Envelope> {
    students.update_image(StudentId::from(id.as_str()), input).await
}

pub async fn delete_student(
    State(students): State<StudentService>,
    Path(id): Path<String>,
) -> RosterResult<Envelope> {
    students.delete(StudentId::from(id.as_str())).await
}
