//! Per-operation input rules for student requests.
//!
//! Each field's rules run in the order they're declared. A missing value only ever trips
//! `required`, and a value that fails `string` isn't checked any further.

use crate::upload::{IMAGE_FIELD, ImageInput, StudentInput};
use email_address::{EmailAddress, Options};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

pub const MAX_TEXT_LEN: usize = 191;
pub const PHONE_DIGITS: usize = 12;

///everything the `image` rule counts as an image
const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "png", "gif", "bmp", "svg", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    String,
    Email,
    MaxChars(usize),
    Digits(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub required: bool,
    pub rules: &'static [Rule],
}

#[derive(Debug, Clone, Copy)]
pub struct ImageRules {
    pub must_be_image: bool,
    pub mimes: &'static [&'static str],
    pub max_kilobytes: u32,
}

impl ImageRules {
    fn accepts(&self, extension: &str) -> bool {
        self.mimes
            .iter()
            .any(|&allowed| allowed == extension || (allowed == "jpg" && extension == "jpeg"))
    }
}

pub const CREATE_FIELD_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        required: true,
        rules: &[Rule::String, Rule::MaxChars(MAX_TEXT_LEN)],
    },
    FieldRules {
        field: "course",
        required: true,
        rules: &[Rule::String, Rule::MaxChars(MAX_TEXT_LEN)],
    },
    FieldRules {
        field: "email",
        required: true,
        rules: &[Rule::Email, Rule::MaxChars(MAX_TEXT_LEN)],
    },
    FieldRules {
        field: "phone",
        required: true,
        rules: &[Rule::Digits(PHONE_DIGITS)],
    },
];

pub const UPDATE_FIELD_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        required: true,
        rules: &[Rule::String, Rule::MaxChars(MAX_TEXT_LEN)],
    },
    FieldRules {
        field: "course",
        required: false,
        rules: &[Rule::String, Rule::MaxChars(MAX_TEXT_LEN)],
    },
    FieldRules {
        field: "email",
        required: false,
        rules: &[Rule::Email, Rule::MaxChars(MAX_TEXT_LEN)],
    },
    FieldRules {
        field: "phone",
        required: false,
        rules: &[Rule::Digits(PHONE_DIGITS)],
    },
];

pub const CREATE_IMAGE_RULES: ImageRules = ImageRules {
    must_be_image: false,
    mimes: &["jpg", "png", "jpeg", "svg"],
    max_kilobytes: 5000,
};

//NB: not the same set or limit as creation
pub const UPDATE_IMAGE_RULES: ImageRules = ImageRules {
    must_be_image: false,
    mimes: &["jpeg", "png", "jpg", "gif"],
    max_kilobytes: 3000,
};

pub const REPLACE_IMAGE_RULES: ImageRules = ImageRules {
    must_be_image: true,
    ..UPDATE_IMAGE_RULES
};

///field name to messages, kept in the order the fields were checked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<(String, Vec<String>)>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.0.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.0.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, messages) in &self.0 {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

pub fn validate_create(input: &StudentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_fields(input, CREATE_FIELD_RULES, &mut errors);
    check_image(&input.image, CREATE_IMAGE_RULES, &mut errors);
    errors.into_result()
}

pub fn validate_update(input: &StudentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_fields(input, UPDATE_FIELD_RULES, &mut errors);
    check_image(&input.image, UPDATE_IMAGE_RULES, &mut errors);
    errors.into_result()
}

pub fn validate_image_replacement(input: &StudentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_image(&input.image, REPLACE_IMAGE_RULES, &mut errors);
    errors.into_result()
}

pub fn image_required() -> ValidationErrors {
    ValidationErrors::single(IMAGE_FIELD, required_message(IMAGE_FIELD))
}

fn required_message(field: &str) -> String {
    format!("The {field} field is required.")
}

fn check_fields(input: &StudentInput, all_rules: &[FieldRules], errors: &mut ValidationErrors) {
    for FieldRules {
        field,
        required,
        rules,
    } in all_rules
    {
        let Some(value) = input.field(field) else {
            if *required {
                errors.push(field, required_message(field));
            }
            continue;
        };

        for rule in *rules {
            let message = match rule {
                Rule::String => {
                    if value.is_string() {
                        continue;
                    }
                    errors.push(field, format!("The {field} field must be a string."));
                    break;
                }
                Rule::Email => {
                    //a bare `user@domain`, never `Name <user@domain>`
                    let is_valid = value.as_str().is_some_and(|email| {
                        EmailAddress::parse_with_options(
                            email,
                            Options::default().without_display_text(),
                        )
                        .is_ok()
                    });
                    (!is_valid).then(|| format!("The {field} field must be a valid email address."))
                }
                Rule::MaxChars(max) => (as_text(value).chars().count() > *max).then(|| {
                    format!("The {field} field must not be greater than {max} characters.")
                }),
                Rule::Digits(digits) => {
                    let text = as_text(value);
                    let is_valid = !value.is_boolean()
                        && text.len() == *digits
                        && text.chars().all(|c| c.is_ascii_digit());
                    (!is_valid).then(|| format!("The {field} field must be {digits} digits."))
                }
            };

            if let Some(message) = message {
                errors.push(field, message);
            }
        }
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_image(image: &ImageInput, rules: ImageRules, errors: &mut ValidationErrors) {
    let field = IMAGE_FIELD;
    let mimes_message = || {
        format!(
            "The {field} field must be a file of type: {}.",
            rules.mimes.join(", ")
        )
    };
    let image_message = || format!("The {field} field must be an image.");

    match image {
        ImageInput::Absent => {}
        ImageInput::NotAFile => {
            if rules.must_be_image {
                errors.push(field, image_message());
            }
            errors.push(field, mimes_message());
        }
        ImageInput::File(upload) => {
            let extension = upload.detected_type().map(|detected| detected.extension);

            if rules.must_be_image && !extension.is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
            {
                errors.push(field, image_message());
            }
            if !extension.is_some_and(|ext| rules.accepts(ext)) {
                errors.push(field, mimes_message());
            }
            if upload.size_in_kilobytes() > f64::from(rules.max_kilobytes) {
                errors.push(
                    field,
                    format!(
                        "The {field} field must not be greater than {} kilobytes.",
                        rules.max_kilobytes
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::ImageUpload;
    use axum::body::Bytes;
    use serde_json::{Map, json};

    const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
    const SVG_BYTES: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";

    fn input(fields: Value, image: ImageInput) -> StudentInput {
        let Value::Object(fields) = fields else {
            unreachable!("test input must be an object")
        };
        StudentInput::from_fields(fields, image)
    }

    fn file(bytes: Vec<u8>) -> ImageInput {
        ImageInput::File(ImageUpload {
            file_name: "upload".to_string(),
            declared_content_type: None,
            bytes: Bytes::from(bytes),
        })
    }

    fn valid_create_fields() -> Value {
        json!({"name": "Jane Doe", "course": "CS", "email": "jane@x.com", "phone": "123456789012"})
    }

    #[test]
    fn valid_creation_passes() {
        assert_eq!(
            validate_create(&input(valid_create_fields(), ImageInput::Absent)),
            Ok(())
        );
    }

    #[test]
    fn creation_requires_every_text_field() {
        let errors = validate_create(&StudentInput::from_fields(Map::new(), ImageInput::Absent))
            .unwrap_err();

        for field in ["name", "course", "email", "phone"] {
            assert_eq!(
                errors.get(field),
                Some([format!("The {field} field is required.")].as_slice())
            );
        }
        assert_eq!(errors.get("image"), None);
    }

    #[test]
    fn bad_emails_are_rejected() {
        for email in [
            "jane",
            "jane@",
            "@x.com",
            "jane at x.com",
            "Jane <jane@x.com>",
            "<jane@x.com>",
        ] {
            let mut fields = valid_create_fields();
            fields["email"] = json!(email);
            let errors = validate_create(&input(fields, ImageInput::Absent)).unwrap_err();
            assert_eq!(
                errors.get("email"),
                Some(["The email field must be a valid email address.".to_string()].as_slice()),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn phones_must_be_exactly_twelve_digits() {
        for phone in ["12345", "1234567890123", "12345678901a", "+23456789012"] {
            let mut fields = valid_create_fields();
            fields["phone"] = json!(phone);
            let errors = validate_create(&input(fields, ImageInput::Absent)).unwrap_err();
            assert_eq!(
                errors.get("phone"),
                Some(["The phone field must be 12 digits.".to_string()].as_slice())
            );
        }

        let mut fields = valid_create_fields();
        fields["phone"] = json!(123_456_789_012_u64);
        assert_eq!(validate_create(&input(fields, ImageInput::Absent)), Ok(()));
    }

    #[test]
    fn long_and_non_string_text_is_rejected() {
        let mut fields = valid_create_fields();
        fields["name"] = json!(42);
        fields["course"] = json!("c".repeat(192));
        let errors = validate_create(&input(fields, ImageInput::Absent)).unwrap_err();

        assert_eq!(
            errors.get("name"),
            Some(["The name field must be a string.".to_string()].as_slice())
        );
        assert_eq!(
            errors.get("course"),
            Some(["The course field must not be greater than 191 characters.".to_string()].as_slice())
        );

        let mut fields = valid_create_fields();
        fields["course"] = json!("c".repeat(191));
        assert_eq!(validate_create(&input(fields, ImageInput::Absent)), Ok(()));
    }

    #[test]
    fn update_only_needs_a_name() {
        assert_eq!(
            validate_update(&input(json!({"name": "Jane"}), ImageInput::Absent)),
            Ok(())
        );

        let errors = validate_update(&input(json!({"phone": "12"}), ImageInput::Absent))
            .unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("course").is_none());
    }

    #[test]
    fn create_and_update_disagree_on_image_types() {
        let svg = || file(SVG_BYTES.to_vec());
        let gif = || file(GIF_BYTES.to_vec());

        assert_eq!(validate_create(&input(valid_create_fields(), svg())), Ok(()));
        let errors = validate_create(&input(valid_create_fields(), gif())).unwrap_err();
        assert_eq!(
            errors.get("image"),
            Some(["The image field must be a file of type: jpg, png, jpeg, svg.".to_string()].as_slice())
        );

        assert_eq!(validate_update(&input(json!({"name": "Jane"}), gif())), Ok(()));
        let errors = validate_update(&input(json!({"name": "Jane"}), svg())).unwrap_err();
        assert_eq!(
            errors.get("image"),
            Some(["The image field must be a file of type: jpeg, png, jpg, gif.".to_string()].as_slice())
        );
    }

    #[test]
    fn create_and_update_disagree_on_image_size() {
        let mut big_gif = GIF_BYTES.to_vec();
        big_gif.resize(4000 * 1024, 0);

        let errors = validate_update(&input(json!({"name": "Jane"}), file(big_gif)))
            .unwrap_err();
        assert_eq!(
            errors.get("image"),
            Some(["The image field must not be greater than 3000 kilobytes.".to_string()].as_slice())
        );

        let mut big_svg = SVG_BYTES.to_vec();
        big_svg.resize(4000 * 1024, b' ');
        assert_eq!(
            validate_create(&input(valid_create_fields(), file(big_svg.clone()))),
            Ok(())
        );
        big_svg.resize(5001 * 1024, b' ');
        assert!(validate_create(&input(valid_create_fields(), file(big_svg))).is_err());
    }

    #[test]
    fn replacing_an_image_needs_an_actual_image() {
        assert_eq!(
            validate_image_replacement(&input(json!({}), ImageInput::Absent)),
            Ok(())
        );

        let errors = validate_image_replacement(&input(json!({}), file(b"hello there".to_vec())))
            .unwrap_err();
        assert_eq!(
            errors.get("image"),
            Some(
                [
                    "The image field must be an image.".to_string(),
                    "The image field must be a file of type: jpeg, png, jpg, gif.".to_string()
                ]
                .as_slice()
            )
        );

        let errors =
            validate_image_replacement(&input(json!({}), ImageInput::NotAFile)).unwrap_err();
        assert_eq!(errors.get("image").map(<[String]>::len), Some(2));
    }

    #[test]
    fn errors_serialise_as_an_ordered_map() {
        let mut errors = ValidationErrors::default();
        errors.push("phone", "first");
        errors.push("email", "second");
        errors.push("phone", "third");

        assert_eq!(
            serde_json::to_string(&errors).unwrap(),
            r#"{"phone":["first","third"],"email":["second"]}"#
        );
        assert_eq!(
            serde_json::to_value(image_required()).unwrap(),
            json!({"image": ["The image field is required."]})
        );
    }
}
