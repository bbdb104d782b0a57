//! State machine for the `status` field of an application.
//!
//! The regular path is pending → reviewing → interview, and an application
//! can be accepted or rejected from any non-terminal state. Once accepted or
//! rejected it can no longer move.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "reviewing" => Some(ApplicationStatus::Reviewing),
            "interview" => Some(ApplicationStatus::Interview),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot move application from {} to {}",
            self.from, self.to
        )
    }
}

impl std::error::Error for InvalidTransition {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Requested status equals the current one. Re-setting is a no-op success.
    Unchanged,
    Changed(ApplicationStatus),
}

pub fn apply_transition(
    current: ApplicationStatus,
    requested: ApplicationStatus,
) -> Result<TransitionOutcome, InvalidTransition> {
    use ApplicationStatus::*;

    if current == requested {
        return Ok(TransitionOutcome::Unchanged);
    }

    let allowed = match (current, requested) {
        (Pending, Reviewing) => true,
        (Reviewing, Interview) => true,
        (Pending | Reviewing | Interview, Accepted | Rejected) => true,
        _ => false,
    };

    if allowed {
        Ok(TransitionOutcome::Changed(requested))
    } else {
        Err(InvalidTransition {
            from: current,
            to: requested,
        })
    }
}
