use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Admin role attached to a [`User`](../lapin-store) record.
///
/// Stored as TEXT (`super_admin` / `business_admin`) so the column stays
/// readable in ad-hoc queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    BusinessAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::BusinessAdmin => "business_admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "business_admin" => Ok(Role::BusinessAdmin),
            other => Err(UnknownVariant("role", other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a submission.
///
/// The only legal transitions are `draft -> completed` (finalization) and
/// `completed -> archived` (retention cleanup).  `archived` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Completed,
    Archived,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Archived => "archived",
        }
    }

    /// Whether `self -> next` is a legal status transition.
    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (SubmissionStatus::Draft, SubmissionStatus::Completed)
                | (SubmissionStatus::Completed, SubmissionStatus::Archived)
        )
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SubmissionStatus::Draft),
            "completed" => Ok(SubmissionStatus::Completed),
            "archived" => Ok(SubmissionStatus::Archived),
            other => Err(UnknownVariant("submission status", other.to_string())),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted enum column held a value no variant matches.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {0}: {1}")]
pub struct UnknownVariant(pub &'static str, pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::SuperAdmin, Role::BusinessAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn status_transitions() {
        use SubmissionStatus::*;

        assert!(Draft.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Archived));

        // archived is terminal, draft cannot skip to archived
        assert!(!Draft.can_transition_to(Archived));
        assert!(!Archived.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Draft));
    }

    #[test]
    fn status_serde_uses_snake_case() {
        let json = serde_json::to_string(&SubmissionStatus::Completed).unwrap();
        assert_eq!(json, r#""completed""#);
    }
}
