use crate::error::{
    FormSnafu, JsonSnafu, MultipartRejectionSnafu, MultipartSnafu, RosterError,
    UnsupportedContentTypeSnafu,
};
use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};
use snafu::ResultExt;

pub const IMAGE_FIELD: &str = "image";

///an uploaded file, as the client sent it
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub declared_content_type: Option<String>,
    pub bytes: Bytes,
}

///what turned up in the `image` slot of a request
#[derive(Debug, Clone, Default)]
pub enum ImageInput {
    #[default]
    Absent,
    File(ImageUpload),
    ///something was sent, but it wasn't a file
    NotAFile,
}

///what a file's contents say it is, regardless of what the client claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedType {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl ImageUpload {
    pub fn size_in_kilobytes(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let len = self.bytes.len() as f64;
        len / 1024.0
    }

    pub fn detected_type(&self) -> Option<DetectedType> {
        //svgs would otherwise be sniffed as plain xml
        if looks_like_svg(&self.bytes) {
            return Some(DetectedType {
                mime_type: "image/svg+xml",
                extension: "svg",
            });
        }

        infer::get(&self.bytes).map(|kind| DetectedType {
            mime_type: kind.mime_type(),
            extension: match kind.extension() {
                "jpg" => "jpeg",
                other => other,
            },
        })
    }

    ///the extension to save this file under
    pub fn storage_extension(&self) -> String {
        if let Some(DetectedType { extension, .. }) = self.detected_type() {
            return extension.to_string();
        }

        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "bin".to_string())
    }

    pub fn content_type(&self) -> String {
        self.detected_type()
            .map(|detected| detected.mime_type.to_string())
            .or_else(|| self.declared_content_type.clone())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();

    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

///the fields of a student request, from whichever body encoding the client used
///
///strings are trimmed, and empty strings count as missing
#[derive(Debug, Clone, Default)]
pub struct StudentInput {
    fields: Map<String, Value>,
    pub image: ImageInput,
}

impl StudentInput {
    pub fn from_fields(fields: Map<String, Value>, image: ImageInput) -> Self {
        let fields = fields
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::Null => None,
                Value::String(s) => {
                    let trimmed = s.trim();
                    (!trimmed.is_empty()).then(|| (name, Value::String(trimmed.to_string())))
                }
                other => Some((name, other)),
            })
            .collect();

        Self { fields, image }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    ///strings as-is, and numbers as they were written
    pub fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn take_image(&mut self) -> Option<ImageUpload> {
        match std::mem::take(&mut self.image) {
            ImageInput::File(upload) => Some(upload),
            ImageInput::Absent | ImageInput::NotAFile => None,
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, RosterError> {
        let mut fields = Map::new();
        let mut image = ImageInput::Absent;

        loop {
            let Some(field) = multipart.next_field().await.context(MultipartSnafu)? else {
                break;
            };
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let declared_content_type = field.content_type().map(ToString::to_string);
                let bytes = field.bytes().await.context(MultipartSnafu)?;

                //browsers send an empty part for a file input that was left alone
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                if name == IMAGE_FIELD {
                    image = ImageInput::File(ImageUpload {
                        file_name,
                        declared_content_type,
                        bytes,
                    });
                } else {
                    debug!(?name, "Ignoring unexpected file upload");
                }
            } else {
                let text = field.text().await.context(MultipartSnafu)?;
                if name == IMAGE_FIELD {
                    if !text.trim().is_empty() {
                        image = ImageInput::NotAFile;
                    }
                } else {
                    fields.insert(name, Value::String(text));
                }
            }
        }

        Ok(Self::from_fields(fields, image))
    }

    fn from_value_map(mut fields: Map<String, Value>) -> Self {
        let image = match fields.remove(IMAGE_FIELD) {
            None | Some(Value::Null) => ImageInput::Absent,
            Some(Value::String(s)) if s.trim().is_empty() => ImageInput::Absent,
            Some(_) => ImageInput::NotAFile,
        };
        Self::from_fields(fields, image)
    }
}

impl<S: Send + Sync> FromRequest<S> for StudentInput {
    type Rejection = RosterError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase());

        match content_type.as_deref() {
            None => Ok(Self::default()),
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .context(MultipartRejectionSnafu)?;
                Self::from_multipart(multipart).await
            }
            Some(ct) if ct.starts_with("application/json") => {
                let Json(fields) = Json::<Map<String, Value>>::from_request(req, state)
                    .await
                    .context(JsonSnafu)?;
                Ok(Self::from_value_map(fields))
            }
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .context(FormSnafu)?;
                let fields = pairs
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect();
                Ok(Self::from_value_map(fields))
            }
            Some(ct) => UnsupportedContentTypeSnafu { content_type: ct }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG_BYTES: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
    ];

    fn upload(file_name: &str, bytes: &'static [u8]) -> ImageUpload {
        ImageUpload {
            file_name: file_name.to_string(),
            declared_content_type: None,
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn empty_and_whitespace_strings_count_as_missing() {
        let Value::Object(fields) = json!({"name": "  Jane  ", "course": "", "email": "   ", "phone": null})
        else {
            unreachable!()
        };
        let input = StudentInput::from_fields(fields, ImageInput::Absent);

        assert_eq!(input.text("name").as_deref(), Some("Jane"));
        assert!(input.field("course").is_none());
        assert!(input.field("email").is_none());
        assert!(input.field("phone").is_none());
    }

    #[test]
    fn json_image_values_are_not_files() {
        let Value::Object(fields) = json!({"name": "Jane", "image": "students/old.png"}) else {
            unreachable!()
        };
        let input = StudentInput::from_value_map(fields);
        assert!(matches!(input.image, ImageInput::NotAFile));
        assert!(input.field(IMAGE_FIELD).is_none());

        let Value::Object(fields) = json!({"name": "Jane", "image": null}) else {
            unreachable!()
        };
        assert!(matches!(
            StudentInput::from_value_map(fields).image,
            ImageInput::Absent
        ));
    }

    #[test]
    fn content_sniffing_beats_the_file_name() {
        let png = upload("holiday.jpg", PNG_BYTES);
        assert_eq!(
            png.detected_type(),
            Some(DetectedType {
                mime_type: "image/png",
                extension: "png"
            })
        );
        assert_eq!(png.storage_extension(), "png");
        assert_eq!(png.content_type(), "image/png");
    }

    #[test]
    fn svgs_are_recognised_from_their_markup() {
        let svg = upload(
            "logo.svg",
            b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>",
        );
        assert_eq!(svg.detected_type().map(|t| t.extension), Some("svg"));

        let text = upload("notes.txt", b"just some words");
        assert_eq!(text.detected_type(), None);
        assert_eq!(text.storage_extension(), "txt");
    }
}
