use std::str::FromStr;

use serde_json::{Map, Value};

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{Ticket, TicketPriority, TicketSource, TicketStatus};

pub const UPDATABLE_PROPERTIES: &[&str] = &[
    "subject",
    "description",
    "status",
    "priority",
    "source",
    "assignee",
];

const MAX_TEXT_LENGTH: usize = 255;

/// Apply a property map to a copy of `ticket`.
///
/// Every entry is checked before anything is returned; a single bad entry rejects the
/// whole update and all problems are reported together.
pub fn apply_properties(ticket: &Ticket, properties: &Map<String, Value>) -> Result<Ticket> {
    if properties.is_empty() {
        return Err(AppError::Validation(
            "at least one property is required".to_string(),
        ));
    }

    let mut updated = ticket.clone();
    let mut errors = Vec::new();

    for (name, value) in properties {
        if let Err(message) = apply(&mut updated, name, value) {
            errors.push(message);
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    Ok(updated)
}

fn apply(ticket: &mut Ticket, name: &str, value: &Value) -> std::result::Result<(), String> {
    match name {
        "subject" => {
            let subject = required_text(name, value)?;
            if subject.chars().count() > MAX_TEXT_LENGTH {
                return Err(format!("subject must be at most {} characters", MAX_TEXT_LENGTH));
            }
            ticket.subject = subject.to_string();
        }
        "description" => ticket.description = required_text(name, value)?.to_string(),
        "status" => ticket.status = parse_enum::<TicketStatus>(name, value)?,
        "priority" => ticket.priority = parse_enum::<TicketPriority>(name, value)?,
        "source" => ticket.source = parse_enum::<TicketSource>(name, value)?,
        "assignee" => {
            ticket.assignee = match value {
                Value::Null => None,
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) if s.chars().count() > MAX_TEXT_LENGTH => {
                    return Err(format!(
                        "assignee must be at most {} characters",
                        MAX_TEXT_LENGTH
                    ));
                }
                Value::String(s) => Some(s.clone()),
                _ => return Err("assignee must be a string or null".to_string()),
            };
        }
        unknown => {
            return Err(format!(
                "Unknown property '{}'. Allowed properties: {}",
                unknown,
                UPDATABLE_PROPERTIES.join(", ")
            ));
        }
    }

    Ok(())
}

fn required_text<'a>(name: &str, value: &'a Value) -> std::result::Result<&'a str, String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::String(_) => Err(format!("{} must not be empty", name)),
        _ => Err(format!("{} must be a string", name)),
    }
}

fn parse_enum<T>(name: &str, value: &Value) -> std::result::Result<T, String>
where
    T: FromStr<Err = String>,
{
    match value {
        Value::String(s) => s.parse::<T>(),
        _ => Err(format!("{} must be a string", name)),
    }
}
