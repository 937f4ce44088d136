use crate::{
    routes::students::{
        create_student, delete_student, edit_student, get_student, get_students, update_student,
        update_student_image,
    },
    service::{Envelope, StudentService},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{delete, get, put},
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod students;

///comfortably above the largest image any rule set allows
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

async fn not_found() -> Envelope {
    Envelope::message(StatusCode::NOT_FOUND, "Not Found")
}

///`public_dir` is where locally-stored images live, served under `/storage`
pub fn build_router(students: StudentService, public_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/students", get(get_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student)
                .put(update_student)
                .patch(update_student)
                .delete(delete_student),
        )
        .route("/students/{id}/edit", get(edit_student))
        .route("/students/{id}/update", put(update_student))
        .route("/students/{id}/update-image", put(update_student_image))
        .route("/students/{id}/delete", delete(delete_student))
        .fallback(not_found)
        .with_state(students);

    if let Some(public_dir) = public_dir {
        app = app.nest_service("/storage", ServeDir::new(public_dir));
    }

    //enforced by the extractors, so an oversized body still gets a JSON rejection
    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
