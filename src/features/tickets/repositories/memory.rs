use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{
    Attachment, Branch, Ticket, TicketKey, TicketStatus, UploadedFile,
};
use crate::features::tickets::repositories::{
    NewTicket, SortOrder, TicketFilter, TicketRepository, TicketSort,
};

#[derive(Default)]
struct Store {
    branches: HashMap<i64, Branch>,
    tickets: BTreeMap<i64, Ticket>,
    attachments: BTreeMap<i64, (Attachment, Vec<u8>)>,
    last_ticket_id: i64,
    last_attachment_id: i64,
}

impl Store {
    fn store_files(&mut self, ticket_id: i64, files: Vec<UploadedFile>) -> Vec<Attachment> {
        let mut stored = Vec::with_capacity(files.len());

        for file in files {
            self.last_attachment_id += 1;
            let attachment = Attachment {
                id: self.last_attachment_id,
                ticket_id,
                filename: file.filename.clone(),
                content_type: file.content_type.clone(),
                file_size: file.size(),
                hash: file.hash(),
                created_at: Utc::now(),
            };
            self.attachments
                .insert(attachment.id, (attachment.clone(), file.content));
            stored.push(attachment);
        }

        stored
    }
}

fn status_rank(status: TicketStatus) -> usize {
    TicketStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(usize::MAX)
}

fn compare(sort: TicketSort, a: &Ticket, b: &Ticket) -> Ordering {
    let primary = match sort {
        TicketSort::Id => Ordering::Equal,
        TicketSort::Key => a.key.cmp(&b.key),
        TicketSort::Subject => a.subject.cmp(&b.subject),
        TicketSort::Status => status_rank(a.status).cmp(&status_rank(b.status)),
        TicketSort::Priority => a.priority.weight().cmp(&b.priority.weight()),
        TicketSort::CreatedAt => a.created_at.cmp(&b.created_at),
        TicketSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };

    primary.then(a.id.cmp(&b.id))
}

/// In-memory ticket store used as the persistence collaborator in tests
#[derive(Default)]
pub struct InMemoryTicketRepository {
    store: RwLock<Store>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(mut self, id: i64, name: &str, key: &str) -> Self {
        self.store.get_mut().branches.insert(
            id,
            Branch {
                id,
                name: name.to_string(),
                key: key.to_string(),
                sequence_number: 0,
            },
        );
        self
    }

    /// Overrides stored timestamps so time filters can be exercised deterministically
    pub async fn set_timestamps(
        &self,
        id: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) {
        if let Some(ticket) = self.store.write().await.tickets.get_mut(&id) {
            ticket.created_at = created_at;
            ticket.updated_at = updated_at;
        }
    }

    /// Last ticket id handed out, 0 when none
    pub async fn last_ticket_id(&self) -> i64 {
        self.store.read().await.last_ticket_id
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_branch(&self, id: i64) -> Result<Option<Branch>> {
        Ok(self.store.read().await.branches.get(&id).cloned())
    }

    async fn insert_ticket(&self, ticket: NewTicket, files: Vec<UploadedFile>) -> Result<Ticket> {
        let mut store = self.store.write().await;

        let branch = store
            .branches
            .get_mut(&ticket.branch_id)
            .ok_or_else(|| AppError::NotFound(format!("Branch '{}' not found", ticket.branch_id)))?;
        branch.sequence_number += 1;
        let number = branch.sequence_number;
        let key = TicketKey::new(&branch.key, number).map_err(AppError::Internal)?;

        store.last_ticket_id += 1;
        let now = Utc::now();
        let created = Ticket {
            id: store.last_ticket_id,
            number,
            key: key.to_string(),
            branch_id: ticket.branch_id,
            subject: ticket.subject,
            description: ticket.description,
            reporter: ticket.reporter,
            assignee: ticket.assignee,
            status: ticket.status,
            priority: ticket.priority,
            source: ticket.source,
            created_at: now,
            updated_at: now,
        };
        store.tickets.insert(created.id, created.clone());
        store.store_files(created.id, files);

        Ok(created)
    }

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        Ok(self.store.read().await.tickets.get(&id).cloned())
    }

    async fn find_ticket_by_key(&self, key: &TicketKey) -> Result<Option<Ticket>> {
        let store = self.store.read().await;

        Ok(store
            .tickets
            .values()
            .find(|t| {
                t.number == key.number()
                    && store
                        .branches
                        .get(&t.branch_id)
                        .is_some_and(|b| b.key == key.branch_key())
            })
            .cloned())
    }

    async fn save_ticket(&self, ticket: &Ticket) -> Result<Ticket> {
        let mut store = self.store.write().await;
        let stored = store
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket.id)))?;

        stored.subject = ticket.subject.clone();
        stored.description = ticket.description.clone();
        stored.assignee = ticket.assignee.clone();
        stored.status = ticket.status;
        stored.priority = ticket.priority;
        stored.source = ticket.source;
        stored.updated_at = ticket.updated_at;

        Ok(stored.clone())
    }

    async fn delete_ticket(&self, id: i64) -> Result<bool> {
        let mut store = self.store.write().await;
        if store.tickets.remove(&id).is_none() {
            return Ok(false);
        }
        store.attachments.retain(|_, (a, _)| a.ticket_id != id);
        Ok(true)
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<(Vec<Ticket>, i64)> {
        let store = self.store.read().await;

        let mut matching: Vec<Ticket> = store
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare(filter.sort, a, b);
            match filter.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn list_attachments(&self, ticket_id: i64) -> Result<Vec<Attachment>> {
        self.list_attachments_for_tickets(&[ticket_id]).await
    }

    async fn list_attachments_for_tickets(&self, ticket_ids: &[i64]) -> Result<Vec<Attachment>> {
        Ok(self
            .store
            .read()
            .await
            .attachments
            .values()
            .filter(|(a, _)| ticket_ids.contains(&a.ticket_id))
            .map(|(a, _)| a.clone())
            .collect())
    }

    async fn insert_attachments(
        &self,
        ticket_id: i64,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Attachment>> {
        let mut store = self.store.write().await;
        if !store.tickets.contains_key(&ticket_id) {
            return Err(AppError::NotFound(format!("Ticket '{}' not found", ticket_id)));
        }
        Ok(store.store_files(ticket_id, files))
    }

    async fn find_attachment(
        &self,
        ticket_id: i64,
        attachment_id: i64,
    ) -> Result<Option<Attachment>> {
        Ok(self
            .store
            .read()
            .await
            .attachments
            .get(&attachment_id)
            .filter(|(a, _)| a.ticket_id == ticket_id)
            .map(|(a, _)| a.clone()))
    }

    async fn find_attachment_content(
        &self,
        ticket_id: i64,
        attachment_id: i64,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .store
            .read()
            .await
            .attachments
            .get(&attachment_id)
            .filter(|(a, _)| a.ticket_id == ticket_id)
            .map(|(_, content)| content.clone()))
    }

    async fn delete_attachment(&self, ticket_id: i64, attachment_id: i64) -> Result<bool> {
        let mut store = self.store.write().await;
        let owned = store
            .attachments
            .get(&attachment_id)
            .is_some_and(|(a, _)| a.ticket_id == ticket_id);
        if owned {
            store.attachments.remove(&attachment_id);
        }
        Ok(owned)
    }
}
