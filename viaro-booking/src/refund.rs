use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Requested,
    Approved,
    Rejected,
    Processed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Requested => "REQUESTED",
            RefundStatus::Approved => "APPROVED",
            RefundStatus::Rejected => "REJECTED",
            RefundStatus::Processed => "PROCESSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REQUESTED" => Some(RefundStatus::Requested),
            "APPROVED" => Some(RefundStatus::Approved),
            "REJECTED" => Some(RefundStatus::Rejected),
            "PROCESSED" => Some(RefundStatus::Processed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: i32,
    pub reason: String,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefundRequest {
    pub fn open(booking_id: Uuid, amount: i32, reason: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            amount,
            reason,
            status: RefundStatus::Requested,
            created_at: now,
            updated_at: now,
        }
    }

    /// Requested → Approved
    pub fn approve(&mut self) -> Result<(), RefundError> {
        self.transition(RefundStatus::Requested, RefundStatus::Approved)
    }

    /// Requested → Rejected (terminal)
    pub fn reject(&mut self) -> Result<(), RefundError> {
        self.transition(RefundStatus::Requested, RefundStatus::Rejected)
    }

    /// Approved → Processed (terminal, money has moved)
    pub fn process(&mut self) -> Result<(), RefundError> {
        self.transition(RefundStatus::Approved, RefundStatus::Processed)
    }

    fn transition(&mut self, from: RefundStatus, to: RefundStatus) -> Result<(), RefundError> {
        if self.status != from {
            return Err(RefundError::InvalidTransition {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RefundError {
    #[error("Refund not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid refund transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
