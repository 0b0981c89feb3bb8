use crate::common::error::AppError;
use crate::entities::sessions::SessionIdentity;
use crate::entities::users::User as UserEntity;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Mentor,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            _ => Err(AppError::InternalServerError("unknown user role")),
        }
    }
}

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

/// An operator holding the admin token. Not tied to any user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admin;

impl TryFrom<SessionIdentity> for Identity {
    type Error = AppError;
    fn try_from(value: SessionIdentity) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: value.user_id,
            role: Role::from_str(&value.role)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl TryFrom<UserEntity> for Profile {
    type Error = AppError;
    fn try_from(value: UserEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: value.id,
            display_name: value.display_name,
            avatar_url: value.avatar_url,
            role: Role::from_str(&value.role)?,
        })
    }
}
