use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Closed set of portal roles. Every command receives the acting user's
/// role; unknown role strings never map into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Patient,
    Doctor,
    Secretary,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Patient" | "patient" => Some(Role::Patient),
            "Doctor" | "doctor" => Some(Role::Doctor),
            "Secretary" | "secretary" => Some(Role::Secretary),
            "Admin" | "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Doctor, secretary and admin act as clinic staff; admin is treated
    /// as a superset of every staff role.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Doctor | Role::Secretary | Role::Admin)
    }

    pub fn is_front_desk(&self) -> bool {
        matches!(self, Role::Secretary | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "Patient"),
            Role::Doctor => write!(f, "Doctor"),
            Role::Secretary => write!(f, "Secretary"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role_or_patient(&self) -> Role {
        self.role.unwrap_or(Role::Patient)
    }
}
