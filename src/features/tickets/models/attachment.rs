use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::FromRow;

/// Database model for a ticket attachment (metadata only, content is loaded separately)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub ticket_id: i64,
    pub filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical in-memory file every attachment payload is normalized into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub content: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl UploadedFile {
    pub fn size(&self) -> i64 {
        self.content.len() as i64
    }

    /// Hex-encoded SHA-256 of the content
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(&self.content))
    }
}
