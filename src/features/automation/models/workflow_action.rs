use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Database model for a workflow action: set `property` to `value` when `action` fires
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct WorkflowAction {
    pub id: i64,
    #[validate(length(min = 1, max = 255, message = "action must be 1-255 characters"))]
    pub action: String,
    #[validate(length(min = 1, max = 255, message = "property must be 1-255 characters"))]
    pub property: String,
    #[validate(length(max = 255, message = "value must be at most 255 characters"))]
    pub value: String,
}

#[allow(dead_code)]
impl WorkflowAction {
    pub fn new(
        action: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            action: action.into(),
            property: property.into(),
            value: value.into(),
        }
    }
}
