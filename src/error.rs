use crate::service::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use snafu::Snafu;
use std::num::ParseIntError;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    Migrate { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unknown image store kind {:?}, expected `local` or `s3`", kind))]
    InvalidStorageKind { kind: String },
    #[snafu(display("Error reading multipart form"))]
    MultipartRejection {
        source: axum::extract::multipart::MultipartRejection,
    },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("Error reading JSON body"))]
    Json {
        source: axum::extract::rejection::JsonRejection,
    },
    #[snafu(display("Error reading form body"))]
    Form {
        source: axum::extract::rejection::FormRejection,
    },
    #[snafu(display("Unsupported content type {:?}", content_type))]
    UnsupportedContentType { content_type: String },
    #[snafu(display("Error accessing image file {:?}", path))]
    Io {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error with S3 Credentials"))]
    S3Creds {
        source: s3::creds::error::CredentialsError,
    },
    #[snafu(display("Error with S3"))]
    S3 { source: s3::error::S3Error },
}

impl RosterError {
    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error

        match self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MakeQuery { .. } | Self::Migrate { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParsePort { .. } | Self::InvalidStorageKind { .. } => {
                ISE
            }
            Self::MultipartRejection { source } => source.status(),
            Self::Multipart { source } => source.status(),
            Self::Json { source } => source.status(),
            Self::Form { source } => source.status(),
            Self::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Io { .. } => ISE,
            Self::S3Creds { .. } | Self::S3 { .. } => ISE,
        }
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(?self, %status, "Error!");

        //only the caller's own input problems get described back to them
        let envelope = if status.is_client_error() {
            Envelope::message_owned(status, self.to_string())
        } else {
            Envelope::message(status, "Something went wrong")
        };
        envelope.into_response()
    }
}
