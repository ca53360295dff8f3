use std::fmt;

use time::PrimitiveDateTime;

use crate::pb::user_v1::UserRole;

/// Access tier of a stored user. UNKNOWN only exists on the wire and is
/// rejected during validation, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid role value {0}")]
pub struct InvalidRole(pub i32);

impl Role {
    pub fn as_i32(self) -> i32 {
        match self {
            Role::User => 1,
            Role::Admin => 2,
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = InvalidRole;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::User),
            2 => Ok(Role::Admin),
            other => Err(InvalidRole(other)),
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => UserRole::User,
            Role::Admin => UserRole::Admin,
        }
    }
}

/// A row of the `auth` table as the service sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: PrimitiveDateTime,
    pub updated_at: Option<PrimitiveDateTime>,
}

/// Validated input for an insert.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

// Keep the password out of logs.
impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}
