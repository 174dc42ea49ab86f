use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{Ticket, TicketId, TicketMessage, TicketPatch, TicketStatus};
use super::repository::{TicketRepository, TicketStoreError};

/// Ticket operations over a repository trait.
pub struct SupportService<R> {
    tickets: Arc<R>,
}

/// Result of trying to append a message. A closed ticket is a business
/// rejection, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    Appended(Ticket),
    TicketClosed,
    NotFound,
}

impl<R> SupportService<R>
where
    R: TicketRepository + 'static,
{
    pub fn new(tickets: Arc<R>) -> Self {
        Self { tickets }
    }

    pub fn open(
        &self,
        requester: String,
        subject: String,
        body: String,
        now: DateTime<Utc>,
    ) -> Result<Ticket, TicketStoreError> {
        self.tickets.insert(Ticket::open(requester, subject, body, now))
    }

    pub fn get(&self, id: &TicketId) -> Result<Option<Ticket>, TicketStoreError> {
        self.tickets.fetch(id)
    }

    pub fn patch(
        &self,
        id: &TicketId,
        patch: TicketPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Ticket>, TicketStoreError> {
        let mut ticket = match self.tickets.fetch(id)? {
            Some(ticket) => ticket,
            None => return Ok(None),
        };

        if let Some(subject) = patch.subject {
            ticket.subject = subject;
        }
        if let Some(status) = patch.status {
            ticket.status = status;
        }
        ticket.updated_at = now;

        self.tickets.update(ticket.clone())?;
        Ok(Some(ticket))
    }

    pub fn add_message(
        &self,
        id: &TicketId,
        author: String,
        body: String,
        now: DateTime<Utc>,
    ) -> Result<MessageOutcome, TicketStoreError> {
        let mut ticket = match self.tickets.fetch(id)? {
            Some(ticket) => ticket,
            None => return Ok(MessageOutcome::NotFound),
        };

        if ticket.status == TicketStatus::Closed {
            return Ok(MessageOutcome::TicketClosed);
        }

        ticket.messages.push(TicketMessage {
            author,
            body,
            sent_at: now,
        });
        ticket.updated_at = now;

        self.tickets.update(ticket.clone())?;
        Ok(MessageOutcome::Appended(ticket))
    }
}
