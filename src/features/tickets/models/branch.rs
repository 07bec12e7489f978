use sqlx::FromRow;

/// Database model for a branch, the organizational grouping a ticket belongs to.
///
/// `key` prefixes the keys of the branch's tickets and `sequence_number` holds the
/// last ticket number handed out.
#[derive(Debug, Clone, FromRow)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub key: String,
    #[allow(dead_code)]
    pub sequence_number: i64,
}
