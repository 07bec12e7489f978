use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

use crate::shared::validation::{BRANCH_KEY_REGEX, TICKET_KEY_REGEX};

/// Ticket status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    Open,
    Pending,
    InProgress,
    Closed,
    OnHold,
}

impl TicketStatus {
    pub const ALL: &[TicketStatus] = &[
        TicketStatus::New,
        TicketStatus::Open,
        TicketStatus::Pending,
        TicketStatus::InProgress,
        TicketStatus::Closed,
        TicketStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
            TicketStatus::OnHold => "on_hold",
        }
    }
}

/// Ticket priority enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub const ALL: &[TicketPriority] = &[
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    /// Numeric weight used when sorting by priority
    #[cfg(test)]
    pub fn weight(&self) -> u8 {
        match self {
            TicketPriority::Low => 1,
            TicketPriority::Medium => 2,
            TicketPriority::High => 3,
        }
    }
}

/// Channel a ticket arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "ticket_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketSource {
    Web,
    Email,
    Phone,
}

impl TicketSource {
    pub const ALL: &[TicketSource] = &[TicketSource::Web, TicketSource::Email, TicketSource::Phone];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketSource::Web => "web",
            TicketSource::Email => "email",
            TicketSource::Phone => "phone",
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ty, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
                        format!(
                            "Invalid {} '{}'. Allowed values: {}",
                            $label,
                            s,
                            allowed.join(", ")
                        )
                    })
            }
        }
    };
}

impl_text_enum!(TicketStatus, "status");
impl_text_enum!(TicketPriority, "priority");
impl_text_enum!(TicketSource, "source");

/// Human-readable ticket identifier: `{BRANCH_KEY}-{number}`, e.g. `DESK-12`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketKey {
    branch_key: String,
    number: i64,
}

impl TicketKey {
    pub fn new(branch_key: &str, number: i64) -> Result<Self, String> {
        if !BRANCH_KEY_REGEX.is_match(branch_key) {
            return Err(format!("Invalid branch key '{}'", branch_key));
        }
        if number < 1 {
            return Err(format!("Invalid ticket number {}", number));
        }

        Ok(Self {
            branch_key: branch_key.to_string(),
            number,
        })
    }

    pub fn branch_key(&self) -> &str {
        &self.branch_key
    }

    pub fn number(&self) -> i64 {
        self.number
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.branch_key, self.number)
    }
}

impl FromStr for TicketKey {
    type Err = String;

    /// Parses case-insensitively; the stored form is upper case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        let captures = TICKET_KEY_REGEX
            .captures(&normalized)
            .ok_or_else(|| format!("Invalid ticket key '{}'", s))?;

        let number = captures[2]
            .parse::<i64>()
            .map_err(|_| format!("Invalid ticket key '{}'", s))?;

        Ok(Self {
            branch_key: captures[1].to_string(),
            number,
        })
    }
}

/// Database model for ticket
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub number: i64,
    pub key: String,
    pub branch_id: i64,
    pub subject: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub source: TicketSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), *status);
        }
        assert_eq!(TicketStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_unknown_enum_value_lists_allowed_values() {
        let err = "urgent".parse::<TicketPriority>().unwrap_err();
        assert!(err.contains("urgent"));
        assert!(err.contains("low, medium, high"));
    }

    #[test]
    fn test_ticket_key_parse_and_display() {
        let key: TicketKey = "desk-42".parse().unwrap();
        assert_eq!(key.branch_key(), "DESK");
        assert_eq!(key.number(), 42);
        assert_eq!(key.to_string(), "DESK-42");
    }

    #[test]
    fn test_ticket_key_rejects_malformed_input() {
        assert!("DESK".parse::<TicketKey>().is_err());
        assert!("DESK-0".parse::<TicketKey>().is_err());
        assert!("12".parse::<TicketKey>().is_err());
        assert!("DE SK-1".parse::<TicketKey>().is_err());
    }

    #[test]
    fn test_ticket_key_new_validates_parts() {
        assert_eq!(TicketKey::new("IT", 7).unwrap().to_string(), "IT-7");
        assert!(TicketKey::new("it", 7).is_err());
        assert!(TicketKey::new("IT", 0).is_err());
    }
}
