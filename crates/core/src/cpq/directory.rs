use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::domain::role::{Role, RoleId};

/// Read-only view over the role catalog used for rate snapshots and name lookups.
#[derive(Clone, Debug, Default)]
pub struct RoleDirectory {
    roles: Vec<Role>,
}

impl RoleDirectory {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    pub fn find(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == role_id)
    }

    pub fn contains(&self, role_id: RoleId) -> bool {
        self.find(role_id).is_some()
    }

    pub fn rate_of(&self, role_id: RoleId) -> Option<Decimal> {
        self.find(role_id).map(|role| role.hourly_rate)
    }

    pub fn name_of(&self, role_id: RoleId) -> Option<&str> {
        self.find(role_id).map(|role| role.name.as_str())
    }

    /// Returns the directory roles whose ids were requested, in directory order.
    /// Unknown ids are dropped and duplicates collapse.
    pub fn resolve(&self, requested: &HashSet<RoleId>) -> Vec<Role> {
        self.roles.iter().filter(|role| requested.contains(&role.id)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
