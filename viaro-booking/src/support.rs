use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(TicketStatus::Open),
            "IN_PROGRESS" => Some(TicketStatus::InProgress),
            "RESOLVED" => Some(TicketStatus::Resolved),
            "CLOSED" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

/// A customer support ticket. Flat record, no cross-entity consistency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupportTicket {
    pub fn open(user_id: Uuid, booking_id: Option<Uuid>, subject: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            booking_id,
            subject,
            body,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Closed tickets are immutable; anything else may move to any status.
    pub fn set_status(&mut self, status: TicketStatus) -> bool {
        if self.status == TicketStatus::Closed {
            return false;
        }
        self.status = status;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_ticket_is_immutable() {
        let mut ticket = SupportTicket::open(
            Uuid::new_v4(),
            None,
            "Seat map not loading".to_string(),
            "The seat picker spins forever on trip page.".to_string(),
        );
        assert!(ticket.set_status(TicketStatus::InProgress));
        assert!(ticket.set_status(TicketStatus::Closed));
        assert!(!ticket.set_status(TicketStatus::Open));
        assert_eq!(ticket.status, TicketStatus::Closed);
    }
}
