//! Customer support tickets: fetch, patch, and threaded messages.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Ticket, TicketId, TicketMessage, TicketPatch, TicketStatus};
pub use repository::{TicketRepository, TicketStoreError};
pub use router::{support_router, AuthenticatedUser};
pub use service::{MessageOutcome, SupportService};
