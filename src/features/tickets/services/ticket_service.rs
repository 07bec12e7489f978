use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::tickets::dtos::{
    AddTicketAttachmentCommand, AttachmentResponseDto, CreateTicketCommand,
    FilterTicketsCommand, RemoveTicketAttachmentCommand, RetrieveTicketAttachmentCommand,
    TicketResponseDto, UpdatePropertiesCommand,
};
use crate::features::tickets::models::{
    Attachment, Ticket, TicketKey, TicketPriority, TicketSource, TicketStatus,
};
use crate::features::tickets::repositories::{NewTicket, TicketFilter, TicketRepository};
use crate::features::tickets::services::attachment_input::normalize_attachments;
use crate::features::tickets::services::property_update::apply_properties;

fn ticket_not_found(reference: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("Ticket '{}' not found", reference))
}

fn attachment_not_found(ticket_id: i64, attachment_id: i64) -> AppError {
    AppError::NotFound(format!(
        "Attachment '{}' not found on ticket '{}'",
        attachment_id, ticket_id
    ))
}

/// Service for ticket operations
pub struct TicketService {
    repository: Arc<dyn TicketRepository>,
}

impl TicketService {
    pub fn new(repository: Arc<dyn TicketRepository>) -> Self {
        Self { repository }
    }

    async fn require_ticket(&self, id: i64) -> Result<Ticket> {
        self.repository
            .find_ticket(id)
            .await?
            .ok_or_else(|| ticket_not_found(id))
    }

    async fn require_ticket_by_key(&self, key: &str) -> Result<Ticket> {
        // An unparseable key cannot name any ticket
        let parsed = key.parse::<TicketKey>().map_err(|_| ticket_not_found(key))?;

        self.repository
            .find_ticket_by_key(&parsed)
            .await?
            .ok_or_else(|| ticket_not_found(key))
    }

    async fn represent(&self, ticket: Ticket) -> Result<TicketResponseDto> {
        let attachments = self.repository.list_attachments(ticket.id).await?;
        Ok(TicketResponseDto::from_parts(ticket, attachments))
    }

    /// Get ticket by ID
    pub async fn load_ticket(&self, id: i64) -> Result<TicketResponseDto> {
        let ticket = self.require_ticket(id).await?;
        self.represent(ticket).await
    }

    /// Get ticket by key, e.g. `DESK-12` (case-insensitive)
    pub async fn load_ticket_by_key(&self, key: &str) -> Result<TicketResponseDto> {
        let ticket = self.require_ticket_by_key(key).await?;
        self.represent(ticket).await
    }

    pub async fn list_ticket_attachments(
        &self,
        ticket_id: i64,
    ) -> Result<Vec<AttachmentResponseDto>> {
        self.require_ticket(ticket_id).await?;

        let attachments = self.repository.list_attachments(ticket_id).await?;
        Ok(attachments.into_iter().map(Into::into).collect())
    }

    async fn require_attachment(&self, ticket_id: i64, attachment_id: i64) -> Result<Attachment> {
        self.require_ticket(ticket_id).await?;

        self.repository
            .find_attachment(ticket_id, attachment_id)
            .await?
            .ok_or_else(|| attachment_not_found(ticket_id, attachment_id))
    }

    pub async fn get_ticket_attachment(
        &self,
        command: RetrieveTicketAttachmentCommand,
    ) -> Result<AttachmentResponseDto> {
        let attachment = self
            .require_attachment(command.ticket_id, command.attachment_id)
            .await?;
        Ok(attachment.into())
    }

    /// Attachment metadata together with its stored bytes
    pub async fn get_ticket_attachment_content(
        &self,
        command: RetrieveTicketAttachmentCommand,
    ) -> Result<(AttachmentResponseDto, Vec<u8>)> {
        let attachment = self
            .require_attachment(command.ticket_id, command.attachment_id)
            .await?;

        let content = self
            .repository
            .find_attachment_content(command.ticket_id, command.attachment_id)
            .await?
            .ok_or_else(|| attachment_not_found(command.ticket_id, command.attachment_id))?;

        Ok((attachment.into(), content))
    }

    /// Open a ticket. Nothing is persisted unless the whole command is valid.
    pub async fn create_ticket(&self, mut command: CreateTicketCommand) -> Result<TicketResponseDto> {
        command.validate()?;

        let reporter = command
            .reporter
            .take()
            .ok_or_else(|| AppError::Validation("reporter is required".to_string()))?;
        let branch_id = command
            .branch
            .ok_or_else(|| AppError::Validation("branch is required".to_string()))?;
        let files = normalize_attachments(std::mem::take(&mut command.attachments))?;

        let branch = self
            .repository
            .find_branch(branch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Branch '{}' not found", branch_id)))?;

        let attachment_count = files.len();
        let ticket = self
            .repository
            .insert_ticket(
                NewTicket {
                    branch_id: branch.id,
                    subject: command.subject,
                    description: command.description,
                    reporter,
                    assignee: command.assignee.filter(|a| !a.trim().is_empty()),
                    status: command.status.unwrap_or(TicketStatus::New),
                    priority: command.priority.unwrap_or(TicketPriority::Medium),
                    source: command.source.unwrap_or(TicketSource::Web),
                },
                files,
            )
            .await?;

        tracing::info!(
            "Ticket created: id={}, key={}, branch={} ({}), attachments={}",
            ticket.id,
            ticket.key,
            branch.name,
            branch.key,
            attachment_count
        );

        self.represent(ticket).await
    }

    pub async fn add_attachments_for_ticket(
        &self,
        mut command: AddTicketAttachmentCommand,
    ) -> Result<Vec<AttachmentResponseDto>> {
        if command.attachments.is_empty() {
            return Err(AppError::Validation(
                "at least one attachment is required".to_string(),
            ));
        }
        let files = normalize_attachments(std::mem::take(&mut command.attachments))?;

        let ticket = self.require_ticket(command.ticket_id).await?;
        let attachments = self.repository.insert_attachments(ticket.id, files).await?;

        tracing::info!(
            "Attachments added: ticket={}, count={}",
            ticket.key,
            attachments.len()
        );

        Ok(attachments.into_iter().map(Into::into).collect())
    }

    /// Remove an attachment and return the key of the ticket it belonged to
    pub async fn remove_attachment_from_ticket(
        &self,
        command: RemoveTicketAttachmentCommand,
    ) -> Result<String> {
        let ticket = self.require_ticket(command.ticket_id).await?;

        let removed = self
            .repository
            .delete_attachment(ticket.id, command.attachment_id)
            .await?;
        if !removed {
            return Err(attachment_not_found(ticket.id, command.attachment_id));
        }

        tracing::info!(
            "Attachment removed: ticket={}, attachment={}",
            ticket.key,
            command.attachment_id
        );

        Ok(ticket.key)
    }

    pub async fn delete_ticket(&self, id: i64) -> Result<()> {
        if !self.repository.delete_ticket(id).await? {
            return Err(ticket_not_found(id));
        }

        tracing::info!("Ticket deleted: id={}", id);
        Ok(())
    }

    pub async fn delete_ticket_by_key(&self, key: &str) -> Result<()> {
        let ticket = self.require_ticket_by_key(key).await?;

        if !self.repository.delete_ticket(ticket.id).await? {
            return Err(ticket_not_found(key));
        }

        tracing::info!("Ticket deleted: id={}, key={}", ticket.id, ticket.key);
        Ok(())
    }

    /// Change ticket properties, all or nothing
    pub async fn update_properties(
        &self,
        command: UpdatePropertiesCommand,
    ) -> Result<TicketResponseDto> {
        let ticket = self.require_ticket(command.id).await?;

        let mut updated = apply_properties(&ticket, &command.properties)?;
        updated.updated_at = Utc::now();
        let saved = self.repository.save_ticket(&updated).await?;

        tracing::info!(
            "Ticket updated: key={}, properties=[{}]",
            saved.key,
            command
                .properties
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.represent(saved).await
    }

    /// One page of tickets matching the filter, plus the total number of matches
    pub async fn list_all_tickets(
        &self,
        command: FilterTicketsCommand,
    ) -> Result<(Vec<TicketResponseDto>, i64)> {
        let filter = TicketFilter::try_from(command)?;
        let (tickets, total) = self.repository.list_tickets(&filter).await?;

        let ids: Vec<i64> = tickets.iter().map(|t| t.id).collect();
        let mut attachments: HashMap<i64, Vec<Attachment>> = HashMap::new();
        for attachment in self.repository.list_attachments_for_tickets(&ids).await? {
            attachments
                .entry(attachment.ticket_id)
                .or_default()
                .push(attachment);
        }

        let items = tickets
            .into_iter()
            .map(|t| {
                let own = attachments.remove(&t.id).unwrap_or_default();
                TicketResponseDto::from_parts(t, own)
            })
            .collect();

        Ok((items, total))
    }
}
