use std::sync::Arc;

use time::PrimitiveDateTime;
use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn};

use crate::{
    error::ServiceError,
    pb::user_v1::{
        user_v1_server::{UserV1, UserV1Server},
        CreateUserRequest, CreateUserResponse, DeleteUserRequest, GetUserInfoRequest,
        GetUserInfoResponse, UpdateUserRequest, UserRole,
    },
    users::{repo::UserRepository, validate::Validate},
};

pub fn user_server(users: Arc<dyn UserRepository>) -> UserV1Server<UserService> {
    UserV1Server::new(UserService::new(users))
}

/// gRPC front of the user repository.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

fn to_timestamp(dt: PrimitiveDateTime) -> prost_types::Timestamp {
    let utc = dt.assume_utc();
    prost_types::Timestamp {
        seconds: utc.unix_timestamp(),
        nanos: utc.nanosecond() as i32,
    }
}

/// Logs the failure at a level matching who is at fault and converts it.
fn reject(method: &str, e: ServiceError) -> Status {
    match &e {
        ServiceError::InvalidArgument(msg) => warn!(method, error = %msg, "invalid input"),
        ServiceError::Internal(msg) => error!(method, error = %msg, "request failed"),
    }
    e.into()
}

#[tonic::async_trait]
impl UserV1 for UserService {
    #[instrument(skip_all)]
    async fn get_user_info(
        &self,
        request: Request<GetUserInfoRequest>,
    ) -> Result<Response<GetUserInfoResponse>, Status> {
        let req = request.into_inner();
        info!(id = req.id, "Get-User");

        let id = req.validate().map_err(|e| reject("Get-User", e))?;
        let user = self
            .users
            .get(id)
            .await
            .map_err(|e| reject("Get-User", e.into()))?;

        Ok(Response::new(GetUserInfoResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: UserRole::from(user.role).into(),
            created_at: Some(to_timestamp(user.created_at)),
            updated_at: user.updated_at.map(to_timestamp),
        }))
    }

    #[instrument(skip_all)]
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<CreateUserResponse>, Status> {
        let req = request.into_inner();
        info!(name = %req.name, email = %req.email, role = req.role, "Create-User");

        let new_user = req.validate().map_err(|e| reject("Create-User", e))?;
        let id = self
            .users
            .create(&new_user)
            .await
            .map_err(|e| reject("Create-User", e.into()))?;

        info!(user_id = id, email = %new_user.email, "user created");
        Ok(Response::new(CreateUserResponse { id }))
    }

    #[instrument(skip_all)]
    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> Result<Response<()>, Status> {
        let req = request.into_inner();
        info!(id = req.id, name = ?req.name, email = ?req.email, role = req.role, "Update-User");

        let (id, changes) = req.validate().map_err(|e| reject("Update-User", e))?;
        self.users
            .update(id, &changes)
            .await
            .map_err(|e| reject("Update-User", e.into()))?;

        Ok(Response::new(()))
    }

    #[instrument(skip_all)]
    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> Result<Response<()>, Status> {
        let req = request.into_inner();
        info!(id = req.id, "Delete-User");

        let id = req.validate().map_err(|e| reject("Delete-User", e))?;
        self.users
            .delete(id)
            .await
            .map_err(|e| reject("Delete-User", e.into()))?;

        Ok(Response::new(()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use tonic::Code;

    use super::*;
    use crate::users::{
        dto::{NewUser, User, UserUpdate},
        repo::RepoError,
    };

    fn now() -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc();
        PrimitiveDateTime::new(now.date(), now.time())
    }

    /// Keeps users in a map; ids start at 1 like a serial column.
    #[derive(Default)]
    struct MemoryUsers {
        rows: Mutex<BTreeMap<i64, User>>,
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn get(&self, id: i64) -> Result<User, RepoError> {
            let rows = self.rows.lock().unwrap();
            rows.get(&id)
                .cloned()
                .ok_or(RepoError::Query(sqlx::Error::RowNotFound))
        }

        async fn create(&self, user: &NewUser) -> Result<i64, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
            rows.insert(
                id,
                User {
                    id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    role: user.role,
                    created_at: now(),
                    updated_at: None,
                },
            );
            Ok(id)
        }

        async fn update(&self, id: i64, changes: &UserUpdate) -> Result<(), RepoError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(user) = rows.get_mut(&id) {
                if let Some(name) = &changes.name {
                    user.name = name.clone();
                }
                if let Some(email) = &changes.email {
                    user.email = email.clone();
                }
                user.role = changes.role;
                user.updated_at = Some(now());
            }
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<(), RepoError> {
            self.rows.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn list(&self, limit: i64) -> Result<Vec<User>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.values().take(limit as usize).cloned().collect())
        }
    }

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUsers::default()))
    }

    fn create_req(name: &str, password_confirm: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            name: name.into(),
            email: "ann@example.com".into(),
            password: "s3cret".into(),
            password_confirm: password_confirm.into(),
            role: role as i32,
        }
    }

    async fn create(svc: &UserService, req: CreateUserRequest) -> Result<i64, Status> {
        svc.create_user(Request::new(req))
            .await
            .map(|r| r.into_inner().id)
    }

    async fn get(svc: &UserService, id: i64) -> Result<GetUserInfoResponse, Status> {
        svc.get_user_info(Request::new(GetUserInfoRequest { id }))
            .await
            .map(Response::into_inner)
    }

    #[tokio::test]
    async fn create_with_empty_name_is_invalid() {
        let err = create(&service(), create_req("  ", "s3cret", UserRole::User))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn create_with_mismatched_password_is_invalid() {
        let err = create(&service(), create_req("Ann", "different", UserRole::User))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn create_with_unknown_role_is_invalid() {
        let err = create(&service(), create_req("Ann", "s3cret", UserRole::Unknown))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn get_with_zero_id_is_invalid() {
        let err = get(&service(), 0).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn delete_with_zero_id_is_invalid() {
        let err = service()
            .delete_user(Request::new(DeleteUserRequest { id: 0 }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn created_user_can_be_fetched() {
        let svc = service();
        let id = create(&svc, create_req(" Ann ", "s3cret", UserRole::Admin))
            .await
            .expect("create");
        assert!(id > 0);

        let user = get(&svc, id).await.expect("get");
        assert_eq!(user.id, id);
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.role, UserRole::Admin as i32);
        assert!(user.created_at.is_some());
        assert!(user.updated_at.is_none());
    }

    #[tokio::test]
    async fn missing_user_is_internal_error() {
        let err = get(&service(), 404).await.unwrap_err();
        assert_eq!(err.code(), Code::Internal);
    }

    #[tokio::test]
    async fn update_with_only_email_keeps_name() {
        let svc = service();
        let id = create(&svc, create_req("Ann", "s3cret", UserRole::User))
            .await
            .expect("create");

        svc.update_user(Request::new(UpdateUserRequest {
            id,
            name: None,
            email: Some(" new@example.com ".into()),
            role: UserRole::Admin as i32,
        }))
        .await
        .expect("update");

        let user = get(&svc, id).await.expect("get");
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.role, UserRole::Admin as i32);
        assert!(user.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_with_blank_name_leaves_it_unchanged() {
        let svc = service();
        let id = create(&svc, create_req("Ann", "s3cret", UserRole::User))
            .await
            .expect("create");

        svc.update_user(Request::new(UpdateUserRequest {
            id,
            name: Some("   ".into()),
            email: None,
            role: UserRole::User as i32,
        }))
        .await
        .expect("update");

        let user = get(&svc, id).await.expect("get");
        assert_eq!(user.name, "Ann");
    }

    #[tokio::test]
    async fn update_with_unknown_role_is_invalid() {
        let err = service()
            .update_user(Request::new(UpdateUserRequest {
                id: 1,
                name: None,
                email: None,
                role: UserRole::Unknown as i32,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn deleted_user_is_gone() {
        let svc = service();
        let id = create(&svc, create_req("Ann", "s3cret", UserRole::User))
            .await
            .expect("create");

        svc.delete_user(Request::new(DeleteUserRequest { id }))
            .await
            .expect("delete");

        assert_eq!(get(&svc, id).await.unwrap_err().code(), Code::Internal);
    }

    #[test]
    fn timestamp_conversion_keeps_seconds_and_nanos() {
        let dt = time::macros::datetime!(2024-01-02 03:04:05.5);
        let ts = to_timestamp(dt);
        assert_eq!(ts.seconds, 1_704_164_645);
        assert_eq!(ts.nanos, 500_000_000);
    }
}
