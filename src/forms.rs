//! Form parsing and validation.
//!
//! Invalid input never reaches the database: handlers re-render the form
//! with the collected [`FormErrors`] instead.

use std::collections::BTreeMap;

use axum::extract::Multipart;
use serde::Serialize;

use crate::{
    data_formats::{CommentForm, SignupForm},
    errors::RequestError,
    models::Group,
};

pub const NON_FIELD_ERRORS: &str = "__all__";
const REQUIRED: &str = "This field is required.";
const USERNAME_MAX_CHARS: usize = 150;
const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// A file from a multipart field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// The post form as submitted, before validation.
#[derive(Debug, Default, Clone)]
pub struct PostForm {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, RequestError> {
        let mut form = PostForm::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::warn!("Malformed multipart body: {}", e);
            RequestError::RunTimeError("Malformed form data")
        })? {
            let name = field.name().unwrap_or_default().to_owned();
            let file_name = field.file_name().map(str::to_owned);
            let data = field.bytes().await.map_err(|e| {
                tracing::warn!("Failed to read form field {}: {}", name, e);
                RequestError::RunTimeError("Malformed form data")
            })?;
            match name.as_str() {
                "text" => form.text = String::from_utf8_lossy(&data).into_owned(),
                "group" => form.group = Some(String::from_utf8_lossy(&data).into_owned()),
                // Browsers send an empty part when no file was picked.
                "image" => {
                    form.image = match file_name {
                        Some(file_name) if !file_name.is_empty() || !data.is_empty() => {
                            Some(UploadedFile {
                                file_name,
                                data: data.to_vec(),
                            })
                        }
                        _ => None,
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// Checks the fields and resolves the chosen group against `groups`.
    pub fn validate(&self, groups: &[Group]) -> Result<Option<i64>, FormErrors> {
        let mut errors = FormErrors::default();
        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => match value.parse::<i64>() {
                Ok(id) if groups.iter().any(|group| group.id == id) => Some(id),
                _ => {
                    errors.add(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            },
        };

        if let Some(image) = &self.image {
            if image.data.is_empty() {
                errors.add("image", "The submitted file is empty.");
            } else if sniff_image_format(&image.data).is_none() {
                errors.add(
                    "image",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            }
        }

        if errors.is_empty() {
            Ok(group_id)
        } else {
            Err(errors)
        }
    }

    pub fn group_id(&self) -> Option<i64> {
        self.group.as_deref().and_then(|value| value.trim().parse().ok())
    }
}

/// Recognises the image formats accepted for post illustrations.
pub fn sniff_image_format(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else if data.starts_with(b"BM") && data.len() > 14 {
        Some("bmp")
    } else {
        None
    }
}

pub fn validate_comment(form: &CommentForm) -> Result<String, FormErrors> {
    let text = form.text.trim();
    if text.is_empty() {
        let mut errors = FormErrors::default();
        errors.add("text", REQUIRED);
        return Err(errors);
    }
    Ok(text.to_owned())
}

pub fn validate_signup(form: &SignupForm) -> FormErrors {
    let mut errors = FormErrors::default();

    let username = form.username.trim();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > USERNAME_MAX_CHARS
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        errors.add("email", "Enter a valid email address.");
    }

    if form.password1.is_empty() {
        errors.add("password1", REQUIRED);
    } else if form.password1.chars().count() < PASSWORD_MIN_CHARS {
        errors.add(
            "password1",
            "This password is too short. It must contain at least 8 characters.",
        );
    }
    if form.password1 != form.password2 {
        errors.add("password2", "The two password fields didn't match.");
    }

    errors
}
