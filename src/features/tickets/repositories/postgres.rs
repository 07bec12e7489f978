use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{Attachment, Branch, Ticket, TicketKey, UploadedFile};
use crate::features::tickets::repositories::{NewTicket, TicketFilter, TicketRepository};

const TICKET_COLUMNS: &str = "id, number, key, branch_id, subject, description, reporter, assignee, \
     status, priority, source, created_at, updated_at";

const ATTACHMENT_COLUMNS: &str =
    "id, ticket_id, filename, content_type, file_size, hash, created_at";

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// Escape LIKE wildcards so user input is matched literally
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TicketFilter) {
    if let Some(at) = filter.created_after {
        qb.push(" AND created_at >= ").push_bind(at);
    }
    if let Some(at) = filter.created_before {
        qb.push(" AND created_at <= ").push_bind(at);
    }
    if let Some(at) = filter.updated_after {
        qb.push(" AND updated_at >= ").push_bind(at);
    }
    if let Some(at) = filter.updated_before {
        qb.push(" AND updated_at <= ").push_bind(at);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(source) = filter.source {
        qb.push(" AND source = ").push_bind(source);
    }
    if let Some(branch_id) = filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id);
    }
    if let Some(reporter) = &filter.reporter {
        qb.push(" AND reporter = ").push_bind(reporter.clone());
    }
    if let Some(assignee) = &filter.assignee {
        qb.push(" AND assignee = ").push_bind(assignee.clone());
    }
    if let Some(subject) = &filter.subject_contains {
        qb.push(" AND subject ILIKE ")
            .push_bind(format!("%{}%", escape_like(subject)));
    }
}

async fn insert_files(
    conn: &mut PgConnection,
    ticket_id: i64,
    files: Vec<UploadedFile>,
) -> Result<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(files.len());

    for file in files {
        let size = file.size();
        let hash = file.hash();
        let attachment: Attachment = sqlx::query_as(&format!(
            "INSERT INTO ticket_attachments (ticket_id, filename, content_type, file_size, hash, content) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            ATTACHMENT_COLUMNS
        ))
        .bind(ticket_id)
        .bind(file.filename)
        .bind(file.content_type)
        .bind(size)
        .bind(hash)
        .bind(file.content)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("Failed to insert attachment"))?;

        attachments.push(attachment);
    }

    Ok(attachments)
}

/// PostgreSQL-backed ticket store
pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_branch(&self, id: i64) -> Result<Option<Branch>> {
        sqlx::query_as::<_, Branch>(
            "SELECT id, name, key, sequence_number FROM branches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get branch"))
    }

    async fn insert_ticket(&self, ticket: NewTicket, files: Vec<UploadedFile>) -> Result<Ticket> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // Row lock on the branch serializes number allocation per branch
        let allocated: Option<(String, i64)> = sqlx::query_as(
            "UPDATE branches SET sequence_number = sequence_number + 1 \
             WHERE id = $1 RETURNING key, sequence_number",
        )
        .bind(ticket.branch_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to allocate ticket number"))?;

        let (branch_key, number) = allocated.ok_or_else(|| {
            AppError::NotFound(format!("Branch '{}' not found", ticket.branch_id))
        })?;
        let key = TicketKey::new(&branch_key, number).map_err(AppError::Internal)?;

        let created: Ticket = sqlx::query_as(&format!(
            "INSERT INTO tickets \
             (number, key, branch_id, subject, description, reporter, assignee, status, priority, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            TICKET_COLUMNS
        ))
        .bind(number)
        .bind(key.to_string())
        .bind(ticket.branch_id)
        .bind(ticket.subject)
        .bind(ticket.description)
        .bind(ticket.reporter)
        .bind(ticket.assignee)
        .bind(ticket.status)
        .bind(ticket.priority)
        .bind(ticket.source)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create ticket"))?;

        insert_files(&mut *tx, created.id, files).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit ticket"))?;

        Ok(created)
    }

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get ticket by ID"))
    }

    async fn find_ticket_by_key(&self, key: &TicketKey) -> Result<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT t.id, t.number, t.key, t.branch_id, t.subject, t.description, t.reporter, \
             t.assignee, t.status, t.priority, t.source, t.created_at, t.updated_at \
             FROM tickets t \
             JOIN branches b ON b.id = t.branch_id \
             WHERE b.key = $1 AND t.number = $2",
        )
        .bind(key.branch_key())
        .bind(key.number())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get ticket by key"))
    }

    async fn save_ticket(&self, ticket: &Ticket) -> Result<Ticket> {
        sqlx::query_as::<_, Ticket>(&format!(
            "UPDATE tickets SET subject = $2, description = $3, assignee = $4, \
             status = $5, priority = $6, source = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {}",
            TICKET_COLUMNS
        ))
        .bind(ticket.id)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(&ticket.assignee)
        .bind(ticket.status)
        .bind(ticket.priority)
        .bind(ticket.source)
        .bind(ticket.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update ticket"))?
        .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket.id)))
    }

    async fn delete_ticket(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete ticket"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<(Vec<Ticket>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tickets WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count tickets"))?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM tickets WHERE 1=1",
            TICKET_COLUMNS
        ));
        push_filters(&mut qb, filter);
        let direction = filter.order.as_sql();
        qb.push(format!(
            " ORDER BY {} {}, id {}",
            filter.sort.column(),
            direction,
            direction
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let tickets = qb
            .build_query_as::<Ticket>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list tickets"))?;

        Ok((tickets, total))
    }

    async fn list_attachments(&self, ticket_id: i64) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {} FROM ticket_attachments WHERE ticket_id = $1 ORDER BY id",
            ATTACHMENT_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list attachments"))
    }

    async fn list_attachments_for_tickets(&self, ticket_ids: &[i64]) -> Result<Vec<Attachment>> {
        if ticket_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {} FROM ticket_attachments WHERE ticket_id = ANY($1) ORDER BY id",
            ATTACHMENT_COLUMNS
        ))
        .bind(ticket_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list attachments"))
    }

    async fn insert_attachments(
        &self,
        ticket_id: i64,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Attachment>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let attachments = insert_files(&mut *tx, ticket_id, files).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit attachments"))?;

        Ok(attachments)
    }

    async fn find_attachment(
        &self,
        ticket_id: i64,
        attachment_id: i64,
    ) -> Result<Option<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {} FROM ticket_attachments WHERE id = $1 AND ticket_id = $2",
            ATTACHMENT_COLUMNS
        ))
        .bind(attachment_id)
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get attachment"))
    }

    async fn find_attachment_content(
        &self,
        ticket_id: i64,
        attachment_id: i64,
    ) -> Result<Option<Vec<u8>>> {
        sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT content FROM ticket_attachments WHERE id = $1 AND ticket_id = $2",
        )
        .bind(attachment_id)
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get attachment content"))
    }

    async fn delete_attachment(&self, ticket_id: i64, attachment_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM ticket_attachments WHERE id = $1 AND ticket_id = $2")
                .bind(attachment_id)
                .bind(ticket_id)
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to delete attachment"))?;

        Ok(result.rows_affected() > 0)
    }
}
