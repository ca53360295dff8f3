use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::users::dto::{InvalidRole, NewUser, User, UserUpdate};
use crate::users::repo_types::UserRow;

const TABLE: &str = "auth";
const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("stored row is invalid: {0}")]
    Corrupt(#[from] InvalidRole),
}

/// Storage for user records. Every failure, including a missing row, is a
/// `RepoError`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<User, RepoError>;
    async fn create(&self, user: &NewUser) -> Result<i64, RepoError>;
    async fn update(&self, id: i64, changes: &UserUpdate) -> Result<(), RepoError>;
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
    /// First `limit` users ordered by id.
    async fn list(&self, limit: i64) -> Result<Vec<User>, RepoError>;
}

// ---- Query construction ----

pub(crate) fn select_by_id(id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM {TABLE} WHERE id = "));
    qb.push_bind(id);
    qb
}

pub(crate) fn select_page(limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM {TABLE} ORDER BY id LIMIT "));
    qb.push_bind(limit);
    qb
}

pub(crate) fn insert(user: &NewUser) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {TABLE} (name, email, password, role) VALUES ("
    ));
    {
        let mut values = qb.separated(", ");
        values.push_bind(user.name.clone());
        values.push_bind(user.email.clone());
        values.push_bind(user.password.clone());
        values.push_bind(user.role.as_i32());
    }
    qb.push(") RETURNING id");
    qb
}

/// Role and updated_at are always written; name and email only when given.
pub(crate) fn update(id: i64, changes: &UserUpdate) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {TABLE} SET "));
    {
        let mut set = qb.separated(", ");
        set.push("role = ").push_bind_unseparated(changes.role.as_i32());
        set.push("updated_at = now()");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(email) = &changes.email {
            set.push("email = ").push_bind_unseparated(email.clone());
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb
}

pub(crate) fn delete_by_id(id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {TABLE} WHERE id = "));
    qb.push_bind(id);
    qb
}

// ---- Postgres implementation ----

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get(&self, id: i64) -> Result<User, RepoError> {
        let mut qb = select_by_id(id);
        debug!(sql = qb.sql(), id, "select user");
        let row = qb.build_query_as::<UserRow>().fetch_one(&self.db).await?;
        Ok(User::try_from(row)?)
    }

    async fn create(&self, user: &NewUser) -> Result<i64, RepoError> {
        let mut qb = insert(user);
        debug!(sql = qb.sql(), "insert user");
        let (id,) = qb
            .build_query_as::<(i32,)>()
            .fetch_one(&self.db)
            .await?;
        Ok(i64::from(id))
    }

    async fn update(&self, id: i64, changes: &UserUpdate) -> Result<(), RepoError> {
        let mut qb = update(id, changes);
        debug!(sql = qb.sql(), id, "update user");
        let res = qb.build().execute(&self.db).await?;
        debug!(rows = res.rows_affected(), "user updated");
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut qb = delete_by_id(id);
        debug!(sql = qb.sql(), id, "delete user");
        let res = qb.build().execute(&self.db).await?;
        debug!(rows = res.rows_affected(), "user deleted");
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, RepoError> {
        let mut qb = select_page(limit);
        let rows = qb.build_query_as::<UserRow>().fetch_all(&self.db).await?;
        rows.into_iter()
            .map(|r| User::try_from(r).map_err(RepoError::from))
            .collect()
    }
}
