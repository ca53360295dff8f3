//! Request validation. Each wire request is checked and turned into the
//! typed value the repository works with; nothing reaches storage otherwise.

use crate::error::ServiceError;
use crate::pb::user_v1::{
    CreateUserRequest, DeleteUserRequest, GetUserInfoRequest, UpdateUserRequest,
};
use crate::users::dto::{NewUser, Role, UserUpdate};

pub const MISSING_ID: &str = "User-id must be provided";
pub const EMPTY_NAME: &str = "User name must not be empty";
pub const EMPTY_EMAIL: &str = "Email must not be empty";
pub const BAD_PASSWORD: &str =
    "Password must not be empty. Password must be equal to Password_confirm";
pub const INVALID_ROLE: &str = "Invalid role";

pub trait Validate {
    type Output;

    fn validate(&self) -> Result<Self::Output, ServiceError>;
}

fn require_id(id: i64) -> Result<i64, ServiceError> {
    if id == 0 {
        return Err(ServiceError::invalid(MISSING_ID));
    }
    Ok(id)
}

fn require_role(raw: i32) -> Result<Role, ServiceError> {
    Role::try_from(raw).map_err(|_| ServiceError::invalid(INVALID_ROLE))
}

/// Trimmed value, or `None` when nothing is left.
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Validate for GetUserInfoRequest {
    type Output = i64;

    fn validate(&self) -> Result<i64, ServiceError> {
        require_id(self.id)
    }
}

impl Validate for DeleteUserRequest {
    type Output = i64;

    fn validate(&self) -> Result<i64, ServiceError> {
        require_id(self.id)
    }
}

impl Validate for CreateUserRequest {
    type Output = NewUser;

    fn validate(&self) -> Result<NewUser, ServiceError> {
        let name = non_blank(&self.name).ok_or_else(|| ServiceError::invalid(EMPTY_NAME))?;
        let email = non_blank(&self.email).ok_or_else(|| ServiceError::invalid(EMPTY_EMAIL))?;

        if self.password.trim().is_empty() || self.password != self.password_confirm {
            return Err(ServiceError::invalid(BAD_PASSWORD));
        }

        let role = require_role(self.role)?;

        Ok(NewUser {
            name,
            email,
            password: self.password.clone(),
            role,
        })
    }
}

impl Validate for UpdateUserRequest {
    type Output = (i64, UserUpdate);

    // The id is not checked here: updating id 0 simply matches no row.
    fn validate(&self) -> Result<(i64, UserUpdate), ServiceError> {
        let role = require_role(self.role)?;
        Ok((
            self.id,
            UserUpdate {
                name: self.name.as_deref().and_then(non_blank),
                email: self.email.as_deref().and_then(non_blank),
                role,
            },
        ))
    }
}
