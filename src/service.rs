use crate::{
    data::{
        StudentStore,
        student::{NewStudent, Student},
    },
    error::RosterResult,
    storage::ImageStore,
    upload::{ImageUpload, StudentInput},
    validation::{
        ValidationErrors, image_required, validate_create, validate_image_replacement,
        validate_update,
    },
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{Value, json};
use std::{borrow::Cow, sync::Arc};
use uuid::Uuid;

///images all live under here in the image store
pub const IMAGE_NAMESPACE: &str = "students";

///what every student operation answers with - `status` always matches the HTTP status
#[derive(Debug)]
pub enum Envelope {
    Students(Vec<Student>),
    NoRecords,
    Student(Student),
    Message {
        status: StatusCode,
        message: Cow<'static, str>,
    },
    Invalid(ValidationErrors),
}

impl Envelope {
    pub const fn message(status: StatusCode, message: &'static str) -> Self {
        Self::Message {
            status,
            message: Cow::Borrowed(message),
        }
    }

    pub fn message_owned(status: StatusCode, message: String) -> Self {
        Self::Message {
            status,
            message: Cow::Owned(message),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Students(_) | Self::Student(_) => StatusCode::OK,
            Self::NoRecords => StatusCode::NOT_FOUND,
            Self::Message { status, .. } => *status,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn to_json(&self) -> Value {
        let status = self.status().as_u16();
        match self {
            Self::Students(students) => json!({"status": status, "students": students}),
            Self::NoRecords => json!({"status": status, "students": "No records found"}),
            Self::Student(student) => json!({"status": status, "student": student}),
            Self::Message { message, .. } => json!({"status": status, "message": message}),
            Self::Invalid(errors) => json!({"status": status, "errors": errors}),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_json())).into_response()
    }
}

///a student id from a request path - anything that isn't a number just never matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentId(Option<i64>);

impl From<&str> for StudentId {
    fn from(raw: &str) -> Self {
        Self(raw.trim().parse().ok())
    }
}

impl From<i64> for StudentId {
    fn from(id: i64) -> Self {
        Self(Some(id))
    }
}

#[derive(Clone, Debug)]
pub struct StudentService {
    students: Arc<dyn StudentStore>,
    images: Arc<dyn ImageStore>,
}

impl StudentService {
    pub fn new(students: Arc<dyn StudentStore>, images: Arc<dyn ImageStore>) -> Self {
        Self { students, images }
    }

    async fn find(&self, StudentId(id): StudentId) -> RosterResult<Option<Student>> {
        match id {
            Some(id) => self.students.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn store_image(&self, image: ImageUpload) -> RosterResult<String> {
        let file_name = format!(
            "{}_{}.{}",
            Utc::now().timestamp(),
            Uuid::new_v4().simple(),
            image.storage_extension()
        );
        let content_type = image.content_type();

        self.images
            .store(
                &format!("{IMAGE_NAMESPACE}/{file_name}"),
                image.bytes,
                &content_type,
            )
            .await
    }

    ///swaps the student's image out for `image`, getting rid of the old one first
    async fn replace_image(&self, student: &mut Student, image: ImageUpload) -> RosterResult<()> {
        if let Some(old_image) = student.image.take() {
            self.images.delete(&old_image).await?;
        }
        student.image = Some(self.store_image(image).await?);
        Ok(())
    }

    pub async fn list(&self) -> RosterResult<Envelope> {
        let students = self.students.all_newest_first().await?;

        Ok(if students.is_empty() {
            Envelope::NoRecords
        } else {
            Envelope::Students(students)
        })
    }

    pub async fn create(&self, mut input: StudentInput) -> RosterResult<Envelope> {
        if let Err(errors) = validate_create(&input) {
            return Ok(Envelope::Invalid(errors));
        }

        let image = match input.take_image() {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };

        let to_be_added = NewStudent {
            name: input.text("name").unwrap_or_default(),
            course: input.text("course").unwrap_or_default(),
            email: input.text("email").unwrap_or_default(),
            phone: input.text("phone").unwrap_or_default(),
            image,
        };

        match self.students.insert(to_be_added).await {
            Ok(student) => {
                info!(id = student.id, "Student created");
                Ok(Envelope::message(
                    StatusCode::OK,
                    "Student created successfully",
                ))
            }
            Err(e) => {
                error!(?e, "Unable to insert student");
                Ok(Envelope::message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                ))
            }
        }
    }

    pub async fn get(&self, id: StudentId) -> RosterResult<Envelope> {
        Ok(match self.find(id).await? {
            Some(student) => Envelope::Student(student),
            None => Envelope::message(StatusCode::NOT_FOUND, "No such student found"),
        })
    }

    ///kept alongside `get` for clients of the old edit-form endpoint
    pub async fn edit(&self, id: StudentId) -> RosterResult<Envelope> {
        self.get(id).await
    }

    ///NB: `course`, `email` and `phone` are always overwritten, so leaving one out clears it
    pub async fn update(&self, id: StudentId, mut input: StudentInput) -> RosterResult<Envelope> {
        if let Err(errors) = validate_update(&input) {
            return Ok(Envelope::Invalid(errors));
        }

        let Some(mut student) = self.find(id).await? else {
            return Ok(Envelope::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "No such student found",
            ));
        };

        student.name = input.text("name").unwrap_or_default();
        student.course = input.text("course");
        student.email = input.text("email");
        student.phone = input.text("phone");

        if let Some(image) = input.take_image() {
            self.replace_image(&mut student, image).await?;
        }

        self.students.save(&student).await?;
        info!(id = student.id, "Student updated");

        Ok(Envelope::message(
            StatusCode::OK,
            "Student updated successfully",
        ))
    }

    pub async fn update_image(
        &self,
        id: StudentId,
        mut input: StudentInput,
    ) -> RosterResult<Envelope> {
        if let Err(errors) = validate_image_replacement(&input) {
            return Ok(Envelope::Invalid(errors));
        }

        let Some(mut student) = self.find(id).await? else {
            return Ok(Envelope::message(
                StatusCode::NOT_FOUND,
                "No such student found",
            ));
        };

        //the rules let a missing image through, but there's nothing to do without one
        let Some(image) = input.take_image() else {
            return Ok(Envelope::Invalid(image_required()));
        };

        self.replace_image(&mut student, image).await?;
        self.students.save(&student).await?;
        info!(id = student.id, image = ?student.image, "Student image updated");

        Ok(Envelope::message(
            StatusCode::OK,
            "Student image updated successfully",
        ))
    }

    ///the student's image is left in the image store
    pub async fn delete(&self, id: StudentId) -> RosterResult<Envelope> {
        let Some(student) = self.find(id).await? else {
            return Ok(Envelope::message(
                StatusCode::NOT_FOUND,
                "No such student found!",
            ));
        };

        self.students.delete(student.id).await?;
        info!(id = student.id, "Student deleted");

        Ok(Envelope::message(
            StatusCode::OK,
            "Student deleted successfully",
        ))
    }
}
