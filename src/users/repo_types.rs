use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::users::dto::{InvalidRole, Role, User};

/// Raw `auth` row as returned by SELECT.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: i32,
    pub created_at: PrimitiveDateTime,
    pub updated_at: Option<PrimitiveDateTime>, // NULL until the first update
}

impl TryFrom<UserRow> for User {
    type Error = InvalidRole;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: i64::from(r.id),
            name: r.name,
            email: r.email,
            role: Role::try_from(r.role)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
