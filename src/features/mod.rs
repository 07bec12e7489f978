pub mod auth;
pub mod automation;
pub mod tickets;
