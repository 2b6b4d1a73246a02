//! Candidate intake: JSON bodies and multipart CV uploads.

use axum::extract::Multipart;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::candidate::Candidate;

const MAX_CV_CHARS: usize = 100_000;

#[derive(Debug, Default, Deserialize)]
pub struct CandidateIntake {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub cv_text: String,
    #[serde(default)]
    pub role_applying: String,
}

impl CandidateIntake {
    /// Checks required fields and builds the candidate record.
    pub fn into_candidate(self) -> Result<Candidate, AppError> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("cv_text", &self.cv_text),
            ("role_applying", &self.role_applying),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let email = self.email.trim();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(AppError::Validation(format!("Invalid email address: {email}")));
        }
        if self.cv_text.chars().count() > MAX_CV_CHARS {
            return Err(AppError::Validation(format!(
                "CV text exceeds {MAX_CV_CHARS} characters"
            )));
        }

        Ok(Candidate::new(
            self.name.trim().to_string(),
            email.to_string(),
            self.cv_text.trim().to_string(),
            self.role_applying.trim().to_string(),
        ))
    }
}

/// Reads a multipart intake form. The CV comes either as a `cv` file (PDF or
/// plain text) or as a `cv_text` field; a file wins when both are present.
pub async fn read_multipart(mut multipart: Multipart) -> Result<CandidateIntake, AppError> {
    let mut intake = CandidateIntake::default();
    let mut cv_file: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read CV upload: {e}")))?;
                debug!("Received CV upload ({} bytes)", bytes.len());
                cv_file = Some(
                    extract_cv_text(bytes.to_vec(), content_type.as_deref(), file_name.as_deref())
                        .await?,
                );
            }
            "name" | "email" | "cv_text" | "role_applying" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid `{name}` field: {e}")))?;
                match name.as_str() {
                    "name" => intake.name = value,
                    "email" => intake.email = value,
                    "cv_text" => intake.cv_text = value,
                    _ => intake.role_applying = value,
                }
            }
            other => warn!("Ignoring unexpected multipart field `{other}`"),
        }
    }

    if let Some(text) = cv_file {
        intake.cv_text = text;
    }
    Ok(intake)
}

fn is_pdf(bytes: &[u8], content_type: Option<&str>, file_name: Option<&str>) -> bool {
    bytes.starts_with(b"%PDF")
        || content_type == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
}

/// PDF text extraction runs on the blocking pool; anything else must be UTF-8.
pub async fn extract_cv_text(
    bytes: Vec<u8>,
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<String, AppError> {
    if !is_pdf(&bytes, content_type, file_name) {
        return String::from_utf8(bytes)
            .map_err(|_| AppError::UnprocessableEntity("CV file is neither PDF nor UTF-8 text".to_string()));
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("PDF extraction task")))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}
