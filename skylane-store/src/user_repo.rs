use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use skylane_core::user::{User, UserStatus};
use skylane_core::{CoreError, CoreResult};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    status: String,
    is_staff: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = UserStatus::parse(&row.status)
            .ok_or_else(|| CoreError::Internal(format!("unknown user status '{}'", row.status)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            status,
            is_staff: row.is_staff,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account. Registration always starts in `pending`;
    /// only the admin endpoints move the status.
    pub async fn create(&self, new_user: NewUser) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING id, username, email, password_hash, first_name, last_name, status, is_staff, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                CoreError::Validation("A user with this username or email already exists".into())
            }
            other => db_err(other),
        })?;
        row.try_into()
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, first_name, last_name, status, is_staff, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("User {id} not found")))?;
        row.try_into()
    }

    pub async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, first_name, last_name, status, is_staff, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(User::try_from).transpose()
    }

    /// Overwrite the approval status. Intentionally idempotent: repeating
    /// an approve/reject on a user already in that state is a no-op.
    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET status = $2 WHERE id = $1
            RETURNING id, username, email, password_hash, first_name, last_name, status, is_staff, created_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("User {id} not found")))?;
        row.try_into()
    }

    pub async fn list_by_status(&self, status: UserStatus) -> CoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, first_name, last_name, status, is_staff, created_at FROM users WHERE status = $1 ORDER BY created_at",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(User::try_from).collect()
    }
}

fn db_err(err: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {err}"))
}
