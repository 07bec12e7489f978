use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::Result;
use crate::features::tickets::models::{
    Attachment, Branch, Ticket, TicketKey, TicketPriority, TicketSource, TicketStatus,
    UploadedFile,
};

/// Fields of a ticket about to be inserted; id, number and key are allocated by the store.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub branch_id: i64,
    pub subject: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub source: TicketSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketSort {
    Id,
    Key,
    Subject,
    Status,
    Priority,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl TicketSort {
    pub fn column(&self) -> &'static str {
        match self {
            TicketSort::Id => "id",
            TicketSort::Key => "key",
            TicketSort::Subject => "subject",
            TicketSort::Status => "status",
            TicketSort::Priority => "priority",
            TicketSort::CreatedAt => "created_at",
            TicketSort::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for TicketSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "id" => Ok(TicketSort::Id),
            "key" => Ok(TicketSort::Key),
            "subject" => Ok(TicketSort::Subject),
            "status" => Ok(TicketSort::Status),
            "priority" => Ok(TicketSort::Priority),
            "created_at" => Ok(TicketSort::CreatedAt),
            "updated_at" => Ok(TicketSort::UpdatedAt),
            other => Err(format!(
                "Invalid sort '{}'. Allowed values: id, key, subject, status, priority, created_at, updated_at",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Invalid order '{}'. Allowed values: asc, desc", other)),
        }
    }
}

/// Typed listing criteria. All time bounds are UTC and inclusive.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub updated_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub source: Option<TicketSource>,
    pub branch_id: Option<i64>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub subject_contains: Option<String>,
    pub sort: TicketSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl TicketFilter {
    /// Whether `ticket` satisfies every criterion (paging and sorting aside)
    #[cfg(test)]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let within = |value: DateTime<Utc>,
                      after: Option<DateTime<Utc>>,
                      before: Option<DateTime<Utc>>| {
            after.is_none_or(|a| value >= a) && before.is_none_or(|b| value <= b)
        };

        within(ticket.created_at, self.created_after, self.created_before)
            && within(ticket.updated_at, self.updated_after, self.updated_before)
            && self.status.is_none_or(|s| ticket.status == s)
            && self.priority.is_none_or(|p| ticket.priority == p)
            && self.source.is_none_or(|s| ticket.source == s)
            && self.branch_id.is_none_or(|b| ticket.branch_id == b)
            && self
                .reporter
                .as_deref()
                .is_none_or(|r| ticket.reporter == r)
            && self
                .assignee
                .as_deref()
                .is_none_or(|a| ticket.assignee.as_deref() == Some(a))
            && self.subject_contains.as_deref().is_none_or(|needle| {
                ticket
                    .subject
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

/// Persistence collaborator of the ticket service.
///
/// Implementations own transactions and concurrency control; the service assumes
/// nothing about exclusive access.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_branch(&self, id: i64) -> Result<Option<Branch>>;

    /// Allocates id, branch sequence number and key, and stores the initial attachments
    /// in the same unit of work.
    async fn insert_ticket(&self, ticket: NewTicket, files: Vec<UploadedFile>) -> Result<Ticket>;

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>>;

    async fn find_ticket_by_key(&self, key: &TicketKey) -> Result<Option<Ticket>>;

    /// Persists the mutable properties of `ticket` and returns the stored row.
    async fn save_ticket(&self, ticket: &Ticket) -> Result<Ticket>;

    /// Deletes the ticket and its attachments. Returns false when nothing was deleted.
    async fn delete_ticket(&self, id: i64) -> Result<bool>;

    /// Returns one page of matching tickets and the total number of matches.
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<(Vec<Ticket>, i64)>;

    /// Attachments of one ticket ordered by id.
    async fn list_attachments(&self, ticket_id: i64) -> Result<Vec<Attachment>>;

    /// Attachments of several tickets ordered by id.
    async fn list_attachments_for_tickets(&self, ticket_ids: &[i64]) -> Result<Vec<Attachment>>;

    async fn insert_attachments(
        &self,
        ticket_id: i64,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Attachment>>;

    async fn find_attachment(&self, ticket_id: i64, attachment_id: i64)
        -> Result<Option<Attachment>>;

    async fn find_attachment_content(
        &self,
        ticket_id: i64,
        attachment_id: i64,
    ) -> Result<Option<Vec<u8>>>;

    /// Returns false when the ticket has no such attachment.
    async fn delete_attachment(&self, ticket_id: i64, attachment_id: i64) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ticket_at(created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id: 1,
            number: 1,
            key: "DESK-1".to_string(),
            branch_id: 1,
            subject: "VPN keeps dropping".to_string(),
            description: "Every ten minutes".to_string(),
            reporter: "alice".to_string(),
            assignee: None,
            status: TicketStatus::New,
            priority: TicketPriority::Medium,
            source: TicketSource::Web,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_time_bounds_are_inclusive() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let ticket = ticket_at(at);

        let filter = TicketFilter {
            created_after: Some(at),
            created_before: Some(at),
            ..Default::default()
        };
        assert!(filter.matches(&ticket));

        let filter = TicketFilter {
            created_after: Some(at + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!filter.matches(&ticket));
    }

    #[test]
    fn test_subject_match_is_case_insensitive() {
        let ticket = ticket_at(Utc::now());
        let filter = TicketFilter {
            subject_contains: Some("vpn".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&ticket));
    }

    #[test]
    fn test_assignee_filter_skips_unassigned() {
        let ticket = ticket_at(Utc::now());
        let filter = TicketFilter {
            assignee: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&ticket));
    }

    #[test]
    fn test_sort_and_order_parse() {
        assert_eq!("updated_at".parse::<TicketSort>().unwrap(), TicketSort::UpdatedAt);
        assert!("reporter".parse::<TicketSort>().is_err());
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
