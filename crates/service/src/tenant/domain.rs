use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::lifecycle::{fold_status, Lifecycle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantStatus {
    Pending,
    Active,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TenantStatus::Pending => "Pending",
            TenantStatus::Active => "Active",
            TenantStatus::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TenantStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_status(s).as_str() {
            "pending" => Ok(TenantStatus::Pending),
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            _ => Err(ServiceError::Validation(format!("unknown tenant status '{s}'"))),
        }
    }
}

impl Lifecycle for TenantStatus {
    const ENTITY: &'static str = "tenant";

    fn targets(self) -> &'static [Self] {
        match self {
            TenantStatus::Pending => &[TenantStatus::Active],
            TenantStatus::Active => &[TenantStatus::Suspended],
            TenantStatus::Suspended => &[TenantStatus::Active],
        }
    }
}
