use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for support tickets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn issue() -> Self {
        Self(format!("tkt-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Closed => "closed",
        }
    }
}

/// One entry in a ticket's thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub author: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// A support ticket owned by one requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub requester: String,
    pub subject: String,
    pub status: TicketStatus,
    pub messages: Vec<TicketMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn open(requester: String, subject: String, body: String, now: DateTime<Utc>) -> Self {
        let first_message = TicketMessage {
            author: requester.clone(),
            body,
            sent_at: now,
        };
        Self {
            id: TicketId::issue(),
            requester,
            subject,
            status: TicketStatus::Open,
            messages: vec![first_message],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update accepted by the PATCH endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TicketPatch {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.status.is_none()
    }
}
