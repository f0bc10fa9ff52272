use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment lifecycle of a booking. Transitions only move forward:
/// pending -> paid | failed. Terminal states never reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid payment transition from {from} to {to}")]
    Invalid {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

/// Check a requested payment transition against the current state.
///
/// Returns `Ok(true)` when a write is required, `Ok(false)` when the
/// booking is already in the target state (idempotent replay, e.g. a
/// webhook delivered twice). Reverse transitions out of a terminal state
/// are rejected, which is what guards a concurrent failed -> paid race.
pub fn plan_transition(
    current: PaymentStatus,
    target: PaymentStatus,
) -> Result<bool, TransitionError> {
    if current == target {
        return Ok(false);
    }
    match (current, target) {
        (PaymentStatus::Pending, PaymentStatus::Paid)
        | (PaymentStatus::Pending, PaymentStatus::Failed) => Ok(true),
        (from, to) => Err(TransitionError::Invalid { from, to }),
    }
}

/// A booking ties one user to one flight. User and flight are immutable
/// after creation; only the payment status transitions.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_are_allowed() {
        assert_eq!(plan_transition(PaymentStatus::Pending, PaymentStatus::Paid), Ok(true));
        assert_eq!(plan_transition(PaymentStatus::Pending, PaymentStatus::Failed), Ok(true));
    }

    #[test]
    fn test_replays_are_idempotent() {
        assert_eq!(plan_transition(PaymentStatus::Paid, PaymentStatus::Paid), Ok(false));
        assert_eq!(plan_transition(PaymentStatus::Failed, PaymentStatus::Failed), Ok(false));
        assert_eq!(plan_transition(PaymentStatus::Pending, PaymentStatus::Pending), Ok(false));
    }

    #[test]
    fn test_terminal_states_never_reopen() {
        assert_eq!(
            plan_transition(PaymentStatus::Failed, PaymentStatus::Paid),
            Err(TransitionError::Invalid {
                from: PaymentStatus::Failed,
                to: PaymentStatus::Paid,
            })
        );
        assert_eq!(
            plan_transition(PaymentStatus::Paid, PaymentStatus::Failed),
            Err(TransitionError::Invalid {
                from: PaymentStatus::Paid,
                to: PaymentStatus::Failed,
            })
        );
        assert!(plan_transition(PaymentStatus::Paid, PaymentStatus::Pending).is_err());
        assert!(plan_transition(PaymentStatus::Failed, PaymentStatus::Pending).is_err());
    }
}
