use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::tickets::dtos::{
    content_type_from_filename, AttachmentInput, EncodedAttachmentDto, MAX_ATTACHMENT_SIZE,
};
use crate::features::tickets::models::UploadedFile;

/// Longest filename or content type the attachment table can hold
const MAX_FIELD_LENGTH: usize = 255;

/// Decode every attachment payload into an `UploadedFile`.
///
/// Consumes the inputs, so each payload is normalized exactly once.
pub fn normalize_attachments(inputs: Vec<AttachmentInput>) -> Result<Vec<UploadedFile>> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            normalize(input).map_err(|e| match e {
                AppError::Validation(msg) => {
                    AppError::Validation(format!("attachments[{}]: {}", index, msg))
                }
                other => other,
            })
        })
        .collect()
}

fn normalize(input: AttachmentInput) -> Result<UploadedFile> {
    let file = match input {
        AttachmentInput::Uploaded(file) => {
            let filename = sanitize_filename(&file.filename)?;
            let content_type = match file.content_type.trim() {
                "" => content_type_from_filename(&filename).to_string(),
                given => checked_content_type(&filename, given)?,
            };
            UploadedFile {
                content: file.content,
                filename,
                content_type,
            }
        }
        AttachmentInput::Encoded(dto) => decode(dto)?,
    };

    if file.content.is_empty() {
        return Err(AppError::Validation(format!(
            "attachment '{}' is empty",
            file.filename
        )));
    }
    if file.content.len() > MAX_ATTACHMENT_SIZE {
        return Err(too_large(&file.filename));
    }

    debug!(
        "Normalized attachment '{}' ({}, {} bytes)",
        file.filename,
        file.content_type,
        file.content.len()
    );

    Ok(file)
}

fn decode(dto: EncodedAttachmentDto) -> Result<UploadedFile> {
    let filename = sanitize_filename(&dto.filename)?;

    let (data_url_type, payload) = split_data_url(dto.content.trim())?;

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    // Reject oversized payloads before allocating the decoded buffer
    if cleaned.len() > MAX_ATTACHMENT_SIZE / 3 * 4 + 8 {
        return Err(too_large(&filename));
    }
    let content = STANDARD.decode(cleaned.as_bytes()).map_err(|e| {
        AppError::Validation(format!(
            "attachment '{}' is not valid base64: {}",
            filename, e
        ))
    })?;

    let content_type = match dto
        .content_type
        .map(|ct| ct.trim().to_string())
        .filter(|ct| !ct.is_empty())
        .or(data_url_type)
    {
        Some(given) => checked_content_type(&filename, &given)?,
        None => content_type_from_filename(&filename).to_string(),
    };

    Ok(UploadedFile {
        content,
        filename,
        content_type,
    })
}

/// Split an optional `data:<mime>;base64,` prefix off the payload
fn split_data_url(content: &str) -> Result<(Option<String>, &str)> {
    let Some(rest) = content.strip_prefix("data:") else {
        return Ok((None, content));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Validation("malformed data URL".to_string()))?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| {
        AppError::Validation("only base64 data URLs are supported".to_string())
    })?;

    let mime = Some(mime.trim().to_string()).filter(|m| !m.is_empty());
    Ok((mime, payload))
}

/// Keep only the final path segment of a client-supplied filename
fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::Validation(format!(
            "invalid attachment filename '{}'",
            filename
        )));
    }
    if name.chars().count() > MAX_FIELD_LENGTH {
        return Err(AppError::Validation(format!(
            "attachment filename exceeds {} characters",
            MAX_FIELD_LENGTH
        )));
    }

    Ok(name.to_string())
}

/// A client-supplied content type must be a `type/subtype` MIME that is also a valid header value
fn checked_content_type(filename: &str, content_type: &str) -> Result<String> {
    let invalid = || {
        AppError::Validation(format!(
            "attachment '{}' has an invalid content type",
            filename
        ))
    };

    if content_type.len() > MAX_FIELD_LENGTH || HeaderValue::from_str(content_type).is_err() {
        return Err(invalid());
    }

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let is_token = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
    };
    match essence.split_once('/') {
        Some((kind, subtype)) if is_token(kind) && is_token(subtype) => {
            Ok(content_type.to_string())
        }
        _ => Err(invalid()),
    }
}

fn too_large(filename: &str) -> AppError {
    AppError::Validation(format!(
        "attachment '{}' exceeds the maximum size of {} MB",
        filename,
        MAX_ATTACHMENT_SIZE / 1024 / 1024
    ))
}
