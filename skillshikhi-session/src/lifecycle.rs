use serde::{Deserialize, Serialize};

/// Status of a teaching-session request.
///
/// `pending -> {accepted, rejected, cancelled}`
/// `accepted -> {completed, cancelled}`
/// `rejected`, `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Accepted => "accepted",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "accepted" => Ok(SessionStatus::Accepted),
            "rejected" => Ok(SessionStatus::Rejected),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            _ => Err(format!("unknown session status: {s}")),
        }
    }
}

/// A transition requested by one of the two parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

impl SessionAction {
    pub fn target_status(self) -> SessionStatus {
        match self {
            SessionAction::Accept => SessionStatus::Accepted,
            SessionAction::Reject => SessionStatus::Rejected,
            SessionAction::Cancel => SessionStatus::Cancelled,
            SessionAction::Complete => SessionStatus::Completed,
        }
    }

    /// Statuses this action may be applied from.
    pub fn allowed_from(self) -> &'static [SessionStatus] {
        match self {
            SessionAction::Accept | SessionAction::Reject => &[SessionStatus::Pending],
            SessionAction::Cancel => &[SessionStatus::Pending, SessionStatus::Accepted],
            SessionAction::Complete => &[SessionStatus::Accepted],
        }
    }
}

impl std::str::FromStr for SessionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(SessionAction::Accept),
            "reject" => Ok(SessionAction::Reject),
            "cancel" => Ok(SessionAction::Cancel),
            "complete" => Ok(SessionAction::Complete),
            _ => Err(format!("unknown session action: {s}")),
        }
    }
}

/// Which side of the request the acting user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Requester,
    Recipient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a {from} request")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },
    #[error("only the recipient may {action} a request")]
    NotAuthorized { action: &'static str },
}

fn action_name(action: SessionAction) -> &'static str {
    match action {
        SessionAction::Accept => "accept",
        SessionAction::Reject => "reject",
        SessionAction::Cancel => "cancel",
        SessionAction::Complete => "complete",
    }
}

/// Validate a transition and return the resulting status.
///
/// Accept and reject belong to the recipient; cancel and complete may come
/// from either party. The status check here is advisory: the storage layer
/// repeats it as a conditional update, so a racing transition fails there
/// even after passing this check.
pub fn check_transition(
    current: SessionStatus,
    action: SessionAction,
    actor: Party,
) -> Result<SessionStatus, TransitionError> {
    match action {
        SessionAction::Accept | SessionAction::Reject if actor != Party::Recipient => {
            return Err(TransitionError::NotAuthorized {
                action: action_name(action),
            });
        }
        _ => {}
    }

    if !action.allowed_from().contains(&current) {
        return Err(TransitionError::InvalidTransition {
            from: current,
            action: action_name(action),
        });
    }

    Ok(action.target_status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionAction::*;
    use SessionStatus::*;

    #[test]
    fn accept_only_from_pending() {
        assert_eq!(check_transition(Pending, Accept, Party::Recipient), Ok(Accepted));
        // A second accept on an already-accepted request must fail, not
        // silently succeed.
        assert!(matches!(
            check_transition(Accepted, Accept, Party::Recipient),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn only_recipient_may_accept_or_reject() {
        assert!(matches!(
            check_transition(Pending, Accept, Party::Requester),
            Err(TransitionError::NotAuthorized { .. })
        ));
        assert!(matches!(
            check_transition(Pending, Reject, Party::Requester),
            Err(TransitionError::NotAuthorized { .. })
        ));
        assert_eq!(check_transition(Pending, Reject, Party::Recipient), Ok(Rejected));
    }

    #[test]
    fn cancel_matrix() {
        for party in [Party::Requester, Party::Recipient] {
            assert_eq!(check_transition(Pending, Cancel, party), Ok(Cancelled));
            assert_eq!(check_transition(Accepted, Cancel, party), Ok(Cancelled));
            for terminal in [Rejected, Completed, Cancelled] {
                assert!(matches!(
                    check_transition(terminal, Cancel, party),
                    Err(TransitionError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn complete_only_from_accepted_by_either_party() {
        assert_eq!(check_transition(Accepted, Complete, Party::Requester), Ok(Completed));
        assert_eq!(check_transition(Accepted, Complete, Party::Recipient), Ok(Completed));
        assert!(matches!(
            check_transition(Pending, Complete, Party::Requester),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn full_lifecycle_walkthrough() {
        // u1 requests, u2 accepts, u1 completes, a late cancel conflicts.
        let after_accept = check_transition(Pending, Accept, Party::Recipient).unwrap();
        assert_eq!(after_accept, Accepted);

        let after_complete = check_transition(after_accept, Complete, Party::Requester).unwrap();
        assert_eq!(after_complete, Completed);

        assert!(matches!(
            check_transition(after_complete, Cancel, Party::Requester),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [Pending, Accepted, Rejected, Completed, Cancelled] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!("expired".parse::<SessionStatus>().is_err());
    }
}
