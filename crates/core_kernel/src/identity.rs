//! Acting identity and request context
//!
//! The identity collaborator (the HTTP layer's token validation) hands every
//! domain operation a verified [`Actor`]. Domain code treats it as opaque,
//! trusted input and only inspects the role and user id for authorization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::identifiers::UserId;

/// Role held by an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Day-to-day responsible for an asset; reports and resubmits claims
    Custodian,
    /// Reviews, approves, rejects and liquidates claims; issues invoices
    Manager,
}

impl Role {
    /// Returns the wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Custodian => "custodian",
            Role::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custodian" => Ok(Role::Custodian),
            "manager" => Ok(Role::Manager),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated user performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn custodian(user_id: UserId) -> Self {
        Self::new(user_id, Role::Custodian)
    }

    pub fn manager(user_id: UserId) -> Self {
        Self::new(user_id, Role::Manager)
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

/// Client details captured for the audit timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client IP address, if known
    pub ip_address: Option<IpAddr>,
    /// Client user-agent string, if sent
    pub user_agent: Option<String>,
    /// When the request was received
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Context stamped with the current time and no client details
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Context stamped with a fixed time
    pub fn at(received_at: DateTime<Utc>) -> Self {
        Self {
            ip_address: None,
            user_agent: None,
            received_at,
        }
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip_address = Some(ip);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
