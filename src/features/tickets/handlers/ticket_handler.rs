use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireAgent, RequireDeskUser};
use crate::features::tickets::dtos::{
    CreateTicketCommand, FilterTicketsCommand, TicketResponseDto, UpdatePropertiesCommand,
    UpdatePropertiesDto,
};
use crate::features::tickets::handlers::params::{numeric_id, TicketRef};
use crate::features::tickets::services::TicketService;
use crate::shared::types::{ApiResponse, Meta};

/// List tickets
///
/// Filters combine with AND. Results are paginated; `meta.total` holds the number of
/// matching tickets.
#[utoipa::path(
    get,
    path = "/api/tickets",
    params(FilterTicketsCommand),
    responses(
        (status = 200, description = "Matching tickets", body = ApiResponse<Vec<TicketResponseDto>>),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Agent access required")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn list_tickets(
    RequireAgent(_user): RequireAgent,
    State(service): State<Arc<TicketService>>,
    AppQuery(command): AppQuery<FilterTicketsCommand>,
) -> Result<Json<ApiResponse<Vec<TicketResponseDto>>>> {
    let (tickets, total) = service.list_all_tickets(command).await?;
    Ok(Json(ApiResponse::success(
        Some(tickets),
        None,
        Some(Meta { total }),
    )))
}

/// Open a ticket
///
/// Attachments may be embedded as base64. Customers always report as themselves; agents
/// may file on behalf of another reporter.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketCommand,
    responses(
        (status = 201, description = "Ticket created", body = ApiResponse<TicketResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Desk role required"),
        (status = 404, description = "Branch not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn create_ticket(
    RequireDeskUser(user): RequireDeskUser,
    State(service): State<Arc<TicketService>>,
    AppJson(mut command): AppJson<CreateTicketCommand>,
) -> Result<(StatusCode, Json<ApiResponse<TicketResponseDto>>)> {
    if !user.has_agent_access() || command.reporter.is_none() {
        command.reporter = Some(user.sub.clone());
    }

    let ticket = service.create_ticket(command).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(ticket),
            Some("Ticket created".to_string()),
            None,
        )),
    ))
}

/// Get ticket by ID or key
#[utoipa::path(
    get,
    path = "/api/tickets/{ticket}",
    params(
        ("ticket" = String, Path, description = "Ticket id (digits only) or key, e.g. DESK-12")
    ),
    responses(
        (status = 200, description = "Ticket found", body = ApiResponse<TicketResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Desk role required"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_ticket(
    RequireDeskUser(_user): RequireDeskUser,
    State(service): State<Arc<TicketService>>,
    Path(ticket): Path<String>,
) -> Result<Json<ApiResponse<TicketResponseDto>>> {
    let ticket = match TicketRef::parse(&ticket)? {
        TicketRef::Id(id) => service.load_ticket(id).await?,
        TicketRef::Key(key) => service.load_ticket_by_key(&key).await?,
    };
    Ok(Json(ApiResponse::success(Some(ticket), None, None)))
}

/// Update ticket properties
///
/// Body is a flat object of property name to new value. The update is all or nothing.
/// Only numeric ids are accepted.
#[utoipa::path(
    method(put, patch),
    path = "/api/tickets/{ticket}",
    params(
        ("ticket" = i64, Path, description = "Ticket id")
    ),
    request_body = UpdatePropertiesDto,
    responses(
        (status = 200, description = "Ticket updated", body = ApiResponse<TicketResponseDto>),
        (status = 400, description = "Unknown property or invalid value"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Agent access required"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn update_ticket(
    RequireAgent(user): RequireAgent,
    State(service): State<Arc<TicketService>>,
    Path(ticket): Path<String>,
    AppJson(mut command): AppJson<UpdatePropertiesCommand>,
) -> Result<Json<ApiResponse<TicketResponseDto>>> {
    command.id = numeric_id("Ticket", &ticket)?;
    tracing::debug!("Updating ticket {} as {}", command.id, user.sub);

    let ticket = service.update_properties(command).await?;
    Ok(Json(ApiResponse::success(
        Some(ticket),
        Some("Ticket updated".to_string()),
        None,
    )))
}

/// Delete ticket by ID or key
#[utoipa::path(
    delete,
    path = "/api/tickets/{ticket}",
    params(
        ("ticket" = String, Path, description = "Ticket id (digits only) or key, e.g. DESK-12")
    ),
    responses(
        (status = 204, description = "Ticket deleted"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Agent access required"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn delete_ticket(
    RequireAgent(_user): RequireAgent,
    State(service): State<Arc<TicketService>>,
    Path(ticket): Path<String>,
) -> Result<StatusCode> {
    match TicketRef::parse(&ticket)? {
        TicketRef::Id(id) => service.delete_ticket(id).await?,
        TicketRef::Key(key) => service.delete_ticket_by_key(&key).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

