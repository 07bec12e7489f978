use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequireAgent, RequireDeskUser};
use crate::features::tickets::dtos::{
    AddTicketAttachmentCommand, AttachmentInput, AttachmentResponseDto,
    RemoveAttachmentResponseDto, RemoveTicketAttachmentCommand, RetrieveTicketAttachmentCommand,
};
use crate::features::tickets::handlers::params::numeric_id;
use crate::features::tickets::models::UploadedFile;
use crate::features::tickets::services::TicketService;
use crate::shared::types::ApiResponse;

fn attachment_ids(ticket: &str, attachment: &str) -> Result<(i64, i64)> {
    Ok((
        numeric_id("Ticket", ticket)?,
        numeric_id("Attachment", attachment)?,
    ))
}

/// List attachments of a ticket
#[utoipa::path(
    get,
    path = "/api/tickets/{ticket}/attachments",
    params(
        ("ticket" = i64, Path, description = "Ticket id")
    ),
    responses(
        (status = 200, description = "Attachments ordered by id", body = ApiResponse<Vec<AttachmentResponseDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Desk role required"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn list_attachments(
    RequireDeskUser(_user): RequireDeskUser,
    State(service): State<Arc<TicketService>>,
    Path(ticket): Path<String>,
) -> Result<Json<ApiResponse<Vec<AttachmentResponseDto>>>> {
    let ticket_id = numeric_id("Ticket", &ticket)?;
    let attachments = service.list_ticket_attachments(ticket_id).await?;
    Ok(Json(ApiResponse::success(Some(attachments), None, None)))
}

/// Get attachment metadata
#[utoipa::path(
    get,
    path = "/api/tickets/{ticket}/attachments/{attachment}",
    params(
        ("ticket" = i64, Path, description = "Ticket id"),
        ("attachment" = i64, Path, description = "Attachment id")
    ),
    responses(
        (status = 200, description = "Attachment found", body = ApiResponse<AttachmentResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Desk role required"),
        (status = 404, description = "Ticket or attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_attachment(
    RequireDeskUser(_user): RequireDeskUser,
    State(service): State<Arc<TicketService>>,
    Path((ticket, attachment)): Path<(String, String)>,
) -> Result<Json<ApiResponse<AttachmentResponseDto>>> {
    let (ticket_id, attachment_id) = attachment_ids(&ticket, &attachment)?;
    let attachment = service
        .get_ticket_attachment(RetrieveTicketAttachmentCommand {
            ticket_id,
            attachment_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(Some(attachment), None, None)))
}

/// Download attachment content
#[utoipa::path(
    get,
    path = "/api/tickets/{ticket}/attachments/{attachment}/content",
    params(
        ("ticket" = i64, Path, description = "Ticket id"),
        ("attachment" = i64, Path, description = "Attachment id")
    ),
    responses(
        (status = 200, description = "Raw attachment bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Desk role required"),
        (status = 404, description = "Ticket or attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn download_attachment(
    RequireDeskUser(_user): RequireDeskUser,
    State(service): State<Arc<TicketService>>,
    Path((ticket, attachment)): Path<(String, String)>,
) -> Result<Response> {
    let (ticket_id, attachment_id) = attachment_ids(&ticket, &attachment)?;
    let (attachment, content) = service
        .get_ticket_attachment_content(RetrieveTicketAttachmentCommand {
            ticket_id,
            attachment_id,
        })
        .await?;

    // Header values must stay visible ASCII
    let filename: String = attachment
        .filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"')
        .collect();

    Ok((
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response())
}

async fn read_multipart(mut multipart: Multipart) -> Result<Vec<AttachmentInput>> {
    let mut attachments = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        // Only parts carrying a filename are files
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            debug!("Ignoring multipart field: {}", field.name().unwrap_or(""));
            continue;
        };
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_default();

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        attachments.push(AttachmentInput::Uploaded(UploadedFile {
            content: data.to_vec(),
            filename,
            content_type,
        }));
    }

    Ok(attachments)
}

/// Add attachments to a ticket
///
/// Accepts either a JSON body with base64 attachments, or `multipart/form-data` where
/// every part carrying a filename becomes an attachment.
#[utoipa::path(
    post,
    path = "/api/tickets/{ticket}/attachments",
    params(
        ("ticket" = i64, Path, description = "Ticket id")
    ),
    request_body(
        content = AddTicketAttachmentCommand,
        description = "JSON with base64 attachments; multipart/form-data file parts are accepted too"
    ),
    responses(
        (status = 201, description = "Attachments added", body = ApiResponse<Vec<AttachmentResponseDto>>),
        (status = 400, description = "Malformed or empty payload"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Desk role required"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn add_attachments(
    RequireDeskUser(_user): RequireDeskUser,
    State(service): State<Arc<TicketService>>,
    Path(ticket): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AttachmentResponseDto>>>)> {
    let ticket_id = numeric_id("Ticket", &ticket)?;

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let mut command = if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?;
        AddTicketAttachmentCommand {
            ticket_id,
            attachments: read_multipart(multipart).await?,
        }
    } else {
        let AppJson(command) =
            AppJson::<AddTicketAttachmentCommand>::from_request(request, &()).await?;
        command
    };
    command.ticket_id = ticket_id;

    let attachments = service.add_attachments_for_ticket(command).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(attachments),
            Some("Attachments added".to_string()),
            None,
        )),
    ))
}

/// Remove an attachment from a ticket
#[utoipa::path(
    delete,
    path = "/api/tickets/{ticket}/attachments/{attachment}",
    params(
        ("ticket" = i64, Path, description = "Ticket id"),
        ("attachment" = i64, Path, description = "Attachment id")
    ),
    responses(
        (status = 200, description = "Attachment removed", body = ApiResponse<RemoveAttachmentResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Agent access required"),
        (status = 404, description = "Ticket or attachment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn remove_attachment(
    RequireAgent(_user): RequireAgent,
    State(service): State<Arc<TicketService>>,
    Path((ticket, attachment)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RemoveAttachmentResponseDto>>> {
    let (ticket_id, attachment_id) = attachment_ids(&ticket, &attachment)?;
    let ticket_key = service
        .remove_attachment_from_ticket(RemoveTicketAttachmentCommand {
            ticket_id,
            attachment_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        Some(RemoveAttachmentResponseDto { ticket_key }),
        Some("Attachment removed".to_string()),
        None,
    )))
}
