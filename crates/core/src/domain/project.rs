use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,
    Sent,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "SENT" => Some(Self::Sent),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub client_name: String,
    pub raw_requirements: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub client_name: String,
    #[serde(default)]
    pub raw_requirements: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "project name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Project {
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        matches!((self.status, next), (ProjectStatus::Draft, ProjectStatus::Sent))
    }

    pub fn transition_to(&mut self, next: ProjectStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidProjectTransition { from: self.status, to: next })
    }

    /// Marks the project as sent. Finalizing an already sent project is a no-op.
    pub fn finalize(&mut self) -> Result<(), DomainError> {
        if self.status == ProjectStatus::Sent {
            return Ok(());
        }
        self.transition_to(ProjectStatus::Sent)
    }
}
