use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::tickets::models::{Attachment, UploadedFile};

/// Maximum decoded attachment size in bytes (20MB)
pub const MAX_ATTACHMENT_SIZE: usize = 20 * 1024 * 1024;

/// Fallback content type when neither the payload nor the filename tells us
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Guess a content type from a filename extension
pub fn content_type_from_filename(filename: &str) -> &'static str {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "mp4" => "video/mp4",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Attachment embedded in a JSON request as base64 content
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EncodedAttachmentDto {
    /// Original filename
    #[schema(example = "screenshot.png")]
    pub filename: String,
    /// Base64 file content; a `data:<mime>;base64,` prefix is accepted
    pub content: String,
    /// MIME type; inferred from the data URL or the filename when absent
    #[serde(default)]
    pub content_type: Option<String>,
}

/// An attachment payload as it reached the service.
///
/// JSON bodies always deserialize to `Encoded`; multipart uploads produce `Uploaded`.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "EncodedAttachmentDto")]
pub enum AttachmentInput {
    Encoded(EncodedAttachmentDto),
    Uploaded(UploadedFile),
}

impl From<EncodedAttachmentDto> for AttachmentInput {
    fn from(dto: EncodedAttachmentDto) -> Self {
        AttachmentInput::Encoded(dto)
    }
}

/// Command: add one or more attachments to a ticket
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddTicketAttachmentCommand {
    /// Filled from the path
    #[serde(skip)]
    pub ticket_id: i64,
    #[serde(default)]
    #[schema(value_type = Vec<EncodedAttachmentDto>)]
    pub attachments: Vec<AttachmentInput>,
}

/// Command: fetch one attachment of a ticket
#[derive(Debug, Clone, Copy)]
pub struct RetrieveTicketAttachmentCommand {
    pub ticket_id: i64,
    pub attachment_id: i64,
}

/// Command: remove one attachment from a ticket
#[derive(Debug, Clone, Copy)]
pub struct RemoveTicketAttachmentCommand {
    pub ticket_id: i64,
    pub attachment_id: i64,
}

/// Response DTO for ticket attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: i64,
    pub ticket_id: i64,
    pub filename: String,
    pub content_type: String,
    /// Size of the decoded content in bytes
    pub file_size: i64,
    /// Hex-encoded SHA-256 of the content
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponseDto {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            ticket_id: a.ticket_id,
            filename: a.filename,
            content_type: a.content_type,
            file_size: a.file_size,
            hash: a.hash,
            created_at: a.created_at,
        }
    }
}

/// Response DTO for attachment removal
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveAttachmentResponseDto {
    /// Key of the ticket the attachment was removed from
    pub ticket_key: String,
}
