use serde::{Deserialize, Serialize};

use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    Vendor,
    Admin,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub warehouse_id: String,
}

/// The signed-in user, as handed over by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActingUser {
    pub id: String,
    pub role: Role,
    /// Present only for employees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeProfile>,
}

impl ActingUser {
    pub fn employee(id: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Employee,
            employee: Some(EmployeeProfile { warehouse_id: warehouse_id.into() }),
        }
    }

    pub fn vendor(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: Role::Vendor, employee: None }
    }

    pub fn employee_warehouse(&self) -> Option<&str> {
        match self.role {
            Role::Employee => self.employee.as_ref().map(|e| e.warehouse_id.as_str()),
            _ => None,
        }
    }
}

/// Read-only identity snapshot for one page view.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<ActingUser>,
    pub token: Option<Masked<String>>,
}

impl Session {
    pub fn new(user: Option<ActingUser>, token: Option<String>) -> Self {
        Self { user, token: token.map(Masked) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_employee(&self) -> bool {
        matches!(self.user.as_ref().map(|u| u.role), Some(Role::Employee))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose().as_str())
    }
}
