//! # User Repository
//!
//! Provides database access layer for user records.
//!
//! The chat engine does not depend on this repository; it is the persistence
//! interface a deployment wiring connections to registered accounts would use.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{UserRepository, UserForCreate, create_pool};
//! # async fn example() -> lib_core::Result<()> {
//! let pool = create_pool("sqlite::memory:").await?;
//!
//! let user = UserRepository::create(
//!     &pool,
//!     UserForCreate::new("alice".into(), "alice@example.com".into(), "hashed".into()),
//! ).await?;
//!
//! let found = UserRepository::find_by_email(&pool, "alice@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use super::models::{User, UserForCreate, UserForUpdate};
use super::DbPool;
use crate::error::{AppError, Result};
use sqlx::query_as;

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Create a new user.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] if the username or email fails validation
    /// - [`AppError::Conflict`] if the username or email already exists
    pub async fn create(pool: &DbPool, user_data: UserForCreate) -> Result<User> {
        user_data.validate().map_err(AppError::InvalidInput)?;

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, is_guest) VALUES (?, ?, ?, ?)"
        )
        .bind(&user_data.username)
        .bind(&user_data.email)
        .bind(&user_data.password_hash)
        .bind(user_data.is_guest)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(user_id = id, username = %user_data.username, "[STORE] User created");

        let user = query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>> {
        let user = query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Find a user by their email address.
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
        let user = query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Find a user by their username.
    pub async fn find_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
        let user = query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Update the provided fields of a user.
    ///
    /// Returns `Ok(None)` when no user has this id. An update with no fields
    /// set returns the current record unchanged.
    pub async fn update(pool: &DbPool, id: i64, user_data: UserForUpdate) -> Result<Option<User>> {
        user_data.validate().map_err(AppError::InvalidInput)?;

        if user_data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        // Build update query dynamically
        let mut updates = Vec::new();
        if user_data.username.is_some() {
            updates.push("username = ?");
        }
        if user_data.email.is_some() {
            updates.push("email = ?");
        }
        if user_data.is_guest.is_some() {
            updates.push("is_guest = ?");
        }
        updates.push("updated_at = CURRENT_TIMESTAMP");

        let query_str = format!("UPDATE users SET {} WHERE id = ?", updates.join(", "));
        let mut query = sqlx::query(&query_str);

        if let Some(ref username) = user_data.username {
            query = query.bind(username);
        }
        if let Some(ref email) = user_data.email {
            query = query.bind(email);
        }
        if let Some(is_guest) = user_data.is_guest {
            query = query.bind(is_guest);
        }

        let result = query.bind(id).execute(pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Delete a user. Returns `true` if a row was removed.
    pub async fn delete(pool: &DbPool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
