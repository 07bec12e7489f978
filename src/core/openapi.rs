use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::tickets::{
    dtos as tickets_dtos, handlers as tickets_handlers, models as tickets_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Tickets
        tickets_handlers::list_tickets,
        tickets_handlers::create_ticket,
        tickets_handlers::get_ticket,
        tickets_handlers::update_ticket,
        tickets_handlers::delete_ticket,
        // Ticket attachments
        tickets_handlers::list_attachments,
        tickets_handlers::add_attachments,
        tickets_handlers::get_attachment,
        tickets_handlers::download_attachment,
        tickets_handlers::remove_attachment,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Tickets
            tickets_models::TicketStatus,
            tickets_models::TicketPriority,
            tickets_models::TicketSource,
            tickets_dtos::TicketResponseDto,
            tickets_dtos::CreateTicketCommand,
            tickets_dtos::UpdatePropertiesDto,
            ApiResponse<tickets_dtos::TicketResponseDto>,
            ApiResponse<Vec<tickets_dtos::TicketResponseDto>>,
            // Attachments
            tickets_dtos::EncodedAttachmentDto,
            tickets_dtos::AddTicketAttachmentCommand,
            tickets_dtos::AttachmentResponseDto,
            tickets_dtos::RemoveAttachmentResponseDto,
            ApiResponse<tickets_dtos::AttachmentResponseDto>,
            ApiResponse<Vec<tickets_dtos::AttachmentResponseDto>>,
            ApiResponse<tickets_dtos::RemoveAttachmentResponseDto>,
        )
    ),
    tags(
        (name = "tickets", description = "Help-desk tickets and their attachments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Helpdesk API",
        version = "0.1.0",
        description = "API documentation for the help-desk ticket service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
