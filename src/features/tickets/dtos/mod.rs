mod attachment_dto;
mod ticket_dto;

pub use attachment_dto::*;
pub use ticket_dto::*;
