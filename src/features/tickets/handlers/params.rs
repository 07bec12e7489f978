use crate::core::error::{AppError, Result};

/// A `{ticket}` path segment: only digits means an id, anything else a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketRef {
    Id(i64),
    Key(String),
}

impl TicketRef {
    pub fn parse(segment: &str) -> Result<Self> {
        if is_numeric(segment) {
            numeric_id("Ticket", segment).map(TicketRef::Id)
        } else {
            Ok(TicketRef::Key(segment.to_string()))
        }
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a path segment that must be a positive numeric id.
///
/// Anything else cannot name a resource and is reported as not found.
pub fn numeric_id(resource: &str, segment: &str) -> Result<i64> {
    segment
        .parse::<i64>()
        .ok()
        .filter(|id| is_numeric(segment) && *id > 0)
        .ok_or_else(|| AppError::NotFound(format!("{} '{}' not found", resource, segment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_are_ids_and_the_rest_keys() {
        assert_eq!(TicketRef::parse("42").unwrap(), TicketRef::Id(42));
        assert_eq!(
            TicketRef::parse("DESK-42").unwrap(),
            TicketRef::Key("DESK-42".to_string())
        );
        assert_eq!(TicketRef::parse("-4").unwrap(), TicketRef::Key("-4".to_string()));
    }

    #[test]
    fn test_numeric_id_rejects_non_positive_and_overflow() {
        assert_eq!(numeric_id("Ticket", "7").unwrap(), 7);
        assert!(matches!(numeric_id("Ticket", "0"), Err(AppError::NotFound(_))));
        assert!(matches!(
            numeric_id("Ticket", "99999999999999999999"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(numeric_id("Ticket", "+7"), Err(AppError::NotFound(_))));
        assert!(matches!(numeric_id("Attachment", "abc"), Err(AppError::NotFound(_))));
    }
}
