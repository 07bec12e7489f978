use chrono::{DateTime, NaiveDate, Utc};

use crate::core::error::{AppError, Result};
use crate::features::tickets::dtos::FilterTicketsCommand;
use crate::features::tickets::repositories::{SortOrder, TicketFilter, TicketSort};
use crate::shared::types::PaginationQuery;

/// Parse an RFC 3339 instant (any offset) or a bare date at midnight UTC
fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    // A raw '+' in a query string decodes to a space
    if let Some(at) = value
        .rsplit_once(' ')
        .filter(|(_, offset)| is_hh_mm(offset))
        .and_then(|(local, offset)| {
            DateTime::parse_from_rfc3339(&format!("{}+{}", local, offset)).ok()
        })
    {
        return Ok(at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "{} must be an RFC 3339 timestamp or a YYYY-MM-DD date, got '{}'",
                field, value
            ))
        })
}

fn is_hh_mm(offset: &str) -> bool {
    let bytes = offset.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn instant(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    non_blank(value)
        .map(|v| parse_instant(field, &v))
        .transpose()
}

impl TryFrom<FilterTicketsCommand> for TicketFilter {
    type Error = AppError;

    fn try_from(command: FilterTicketsCommand) -> Result<Self> {
        let sort = non_blank(command.sort)
            .map(|s| s.parse::<TicketSort>())
            .transpose()
            .map_err(AppError::Validation)?
            .unwrap_or_default();
        let order = non_blank(command.order)
            .map(|o| o.parse::<SortOrder>())
            .transpose()
            .map_err(AppError::Validation)?
            .unwrap_or_default();

        let pagination = PaginationQuery {
            page: command.page,
            page_size: command.page_size,
        };

        Ok(Self {
            created_after: instant("created_after", command.created_after)?,
            created_before: instant("created_before", command.created_before)?,
            updated_after: instant("updated_after", command.updated_after)?,
            updated_before: instant("updated_before", command.updated_before)?,
            status: command.status,
            priority: command.priority,
            source: command.source,
            branch_id: command.branch,
            reporter: non_blank(command.reporter),
            assignee: non_blank(command.assignee),
            subject_contains: non_blank(command.subject),
            sort,
            order,
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
    }
}
