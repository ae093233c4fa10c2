use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub i64);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A staffing category with an hourly billing rate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub hourly_rate: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub hourly_rate: Decimal,
}

impl NewRole {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("role name must not be empty".to_string()));
        }
        if self.hourly_rate < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "role `{}` hourly_rate must be non-negative",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::NewRole;

    #[test]
    fn rejects_blank_name_and_negative_rate() {
        let blank = NewRole { name: "  ".to_string(), hourly_rate: Decimal::new(50, 0) };
        assert!(blank.validate().is_err());

        let negative = NewRole { name: "QA".to_string(), hourly_rate: Decimal::new(-1, 0) };
        assert!(negative.validate().is_err());

        let free = NewRole { name: "Intern".to_string(), hourly_rate: Decimal::ZERO };
        assert!(free.validate().is_ok());
    }
}
