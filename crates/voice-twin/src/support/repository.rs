use super::domain::{Ticket, TicketId};

/// Storage abstraction over the ticket table.
pub trait TicketRepository: Send + Sync {
    fn insert(&self, ticket: Ticket) -> Result<Ticket, TicketStoreError>;
    fn update(&self, ticket: Ticket) -> Result<(), TicketStoreError>;
    fn fetch(&self, id: &TicketId) -> Result<Option<Ticket>, TicketStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TicketStoreError {
    #[error("ticket not found")]
    NotFound,
    #[error("ticket store unavailable: {0}")]
    Unavailable(String),
}
