use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::tickets::dtos::{AttachmentInput, AttachmentResponseDto, EncodedAttachmentDto};
use crate::features::tickets::models::{
    Attachment, Ticket, TicketPriority, TicketSource, TicketStatus,
};
use crate::shared::types::{default_page, default_page_size};

/// Response DTO for ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TicketResponseDto {
    pub id: i64,
    /// Human-readable key, e.g. `DESK-12`
    pub key: String,
    /// Sequence number within the branch
    pub number: i64,
    pub branch_id: i64,
    pub subject: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub source: TicketSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Attachments ordered by id
    pub attachments: Vec<AttachmentResponseDto>,
}

impl TicketResponseDto {
    pub fn from_parts(t: Ticket, attachments: Vec<Attachment>) -> Self {
        Self {
            id: t.id,
            key: t.key,
            number: t.number,
            branch_id: t.branch_id,
            subject: t.subject,
            description: t.description,
            reporter: t.reporter,
            assignee: t.assignee,
            status: t.status,
            priority: t.priority,
            source: t.source,
            created_at: t.created_at,
            updated_at: t.updated_at,
            attachments: attachments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Command: open a new ticket
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTicketCommand {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "subject is required (max 255 characters)"))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    /// Branch id
    #[validate(
        required(message = "branch is required"),
        range(min = 1, message = "branch must be a positive id")
    )]
    pub branch: Option<i64>,
    /// Defaults to the authenticated caller
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "reporter must be 1-255 characters"))]
    pub reporter: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "assignee must be at most 255 characters"))]
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub source: Option<TicketSource>,
    #[serde(default)]
    #[schema(value_type = Vec<EncodedAttachmentDto>)]
    pub attachments: Vec<AttachmentInput>,
}

/// Command: change some properties of a ticket.
///
/// The body is a flat JSON object of property name to value, e.g.
/// `{"status": "open", "assignee": "agent-7"}`. Accepted names are
/// `subject`, `description`, `status`, `priority`, `source` and `assignee`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePropertiesCommand {
    /// Filled from the path
    #[serde(skip)]
    pub id: i64,
    #[serde(flatten)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Update request body, for Swagger UI documentation only.
/// The handler accepts any JSON object and validates names and values in the service.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdatePropertiesDto {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub source: Option<TicketSource>,
    /// `null` or an empty string unassigns the ticket
    pub assignee: Option<String>,
}

/// Command: list tickets matching optional criteria.
///
/// Time bounds accept RFC 3339 timestamps with any offset, or a bare `YYYY-MM-DD`
/// (midnight UTC). They are converted to UTC before filtering and are inclusive.
/// A `+HH:MM` offset left unencoded in the query string arrives as a space and is
/// still read as a positive offset.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterTicketsCommand {
    /// Created at or after this instant
    pub created_after: Option<String>,
    /// Created at or before this instant
    pub created_before: Option<String>,
    /// Updated at or after this instant
    pub updated_after: Option<String>,
    /// Updated at or before this instant
    pub updated_before: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub source: Option<TicketSource>,
    /// Branch id
    pub branch: Option<i64>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    /// Case-insensitive substring of the subject
    pub subject: Option<String>,
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// One of id, key, subject, status, priority, created_at, updated_at (default created_at)
    pub sort: Option<String>,
    /// asc or desc (default desc)
    pub order: Option<String>,
}

impl Default for FilterTicketsCommand {
    fn default() -> Self {
        Self {
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            status: None,
            priority: None,
            source: None,
            branch: None,
            reporter: None,
            assignee: None,
            subject: None,
            page: default_page(),
            page_size: default_page_size(),
            sort: None,
            order: None,
        }
    }
}
