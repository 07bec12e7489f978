pub mod attachment_handler;
mod params;
pub mod ticket_handler;

pub use attachment_handler::*;
pub use ticket_handler::*;
