#[cfg(test)]
mod memory;
mod postgres;
mod ticket_repository;

#[cfg(test)]
pub use memory::InMemoryTicketRepository;
pub use postgres::PgTicketRepository;
pub use ticket_repository::*;
