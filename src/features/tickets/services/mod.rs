mod attachment_input;
mod property_update;
mod ticket_filter;
mod ticket_service;

pub use ticket_service::TicketService;
