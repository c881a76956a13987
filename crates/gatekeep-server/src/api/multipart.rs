//! Registration form parsing
//!
//! Text fields are read into memory. The `avatar` and `coverImage` files are
//! spooled to temporary files whose paths are handed to the upload service;
//! they are deleted when the form is dropped.

use std::path::Path;

use axum::extract::Multipart;
use gatekeep_core::RegisterRequest;
use tempfile::NamedTempFile;

use super::response::ApiError;

const AVATAR_FIELD: &str = "avatar";
const COVER_IMAGE_FIELD: &str = "coverImage";

#[derive(Debug, Default)]
pub struct RegisterForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<NamedTempFile>,
    pub cover_image: Option<NamedTempFile>,
}

impl RegisterForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = RegisterForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                AVATAR_FIELD | COVER_IMAGE_FIELD => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(e.body_text()))?;

                    // Browsers send an empty part when no file was chosen
                    if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                        continue;
                    }

                    let slot = if name == AVATAR_FIELD {
                        &mut form.avatar
                    } else {
                        &mut form.cover_image
                    };
                    if slot.is_some() {
                        return Err(ApiError::bad_request(format!(
                            "Only one {} file is allowed",
                            name
                        )));
                    }
                    *slot = Some(spool(file_name.as_deref(), &bytes).await?);
                }
                "fullName" | "email" | "userName" | "password" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.body_text()))?;
                    match name.as_str() {
                        "fullName" => form.full_name = Some(value),
                        "email" => form.email = Some(value),
                        "userName" => form.user_name = Some(value),
                        _ => form.password = Some(value),
                    }
                }
                other => log::debug!("[api] Ignoring unexpected form field {}", other),
            }
        }

        Ok(form)
    }

    /// Borrow the form as a registration request. The form must outlive the
    /// request so the spooled files still exist during upload.
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            user_name: self.user_name.clone(),
            password: self.password.clone(),
            avatar: self.avatar.as_ref().map(|file| file.path().to_path_buf()),
            cover_image: self.cover_image.as_ref().map(|file| file.path().to_path_buf()),
        }
    }
}

async fn spool(file_name: Option<&str>, bytes: &[u8]) -> Result<NamedTempFile, ApiError> {
    // Keep the extension so stored copies remain recognisable
    let suffix = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix("gatekeep-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| ApiError::from(gatekeep_core::Error::from(e)))?;

    tokio::fs::write(file.path(), bytes)
        .await
        .map_err(|e| ApiError::from(gatekeep_core::Error::from(e)))?;

    Ok(file)
}
