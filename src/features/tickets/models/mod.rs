mod attachment;
mod branch;
mod ticket;

pub use attachment::{Attachment, UploadedFile};
pub use branch::Branch;
pub use ticket::{Ticket, TicketKey, TicketPriority, TicketSource, TicketStatus};
