//! User accounts
//!
//! PostgreSQL-backed storage for the accounts that may submit proposals.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use serde::Serialize;
use uuid::Uuid;

/// User record from the database
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response (without sensitive data)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// User service for database operations
pub struct UserService {
    pool: Pool,
}

impl UserService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create the users table. Called once at startup.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS users (\
                 id UUID PRIMARY KEY, \
                 email TEXT UNIQUE NOT NULL, \
                 password_hash TEXT NOT NULL, \
                 name TEXT NOT NULL, \
                 created_at TIMESTAMPTZ NOT NULL, \
                 updated_at TIMESTAMPTZ NOT NULL)",
                &[],
            )
            .await?;
        Ok(())
    }

    /// Create a new user
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, AppError> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let row = client
            .query_one(
                "INSERT INTO users (id, email, password_hash, name, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id, email, password_hash, name, created_at, updated_at",
                &[&id, &email, &password_hash, &name, &now, &now],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") {
                    AppError::Conflict("Email already registered".to_string())
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(Self::row_to_user(&row))
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, email, password_hash, name, created_at, updated_at \
                 FROM users WHERE email = $1",
                &[&email],
            )
            .await?;
        Ok(row.as_ref().map(Self::row_to_user))
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, email, password_hash, name, created_at, updated_at \
                 FROM users WHERE id = $1",
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(Self::row_to_user))
    }

    fn row_to_user(row: &tokio_postgres::Row) -> User {
        User {
            id: row.get(0),
            email: row.get(1),
            password_hash: row.get(2),
            name: row.get(3),
            created_at: row.get(4),
            updated_at: row.get(5),
        }
    }
}
