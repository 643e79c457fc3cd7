// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! API users.
//!
//! The service only needs key lookup; user administration is handled by
//! external tooling against the same table.

use sqlx::Row;

use crate::errors::StoreError;

use super::{Store, User};

impl Store {
    /// Find the user owning an API key. An empty key matches nobody.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn user_by_key(&self, key: &str) -> Result<Option<User>, StoreError> {
        if key.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query("SELECT key, name, admin FROM users WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            key: row.try_get("key")?,
            name: row.try_get("name")?,
            admin: row.try_get::<i64, _>("admin")? != 0,
        }))
    }

    /// Create a user. Fails when the key or name is already taken.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure or constraint violation.
    pub async fn create_user(&self, key: &str, name: &str, admin: bool) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (key, name, admin) VALUES (?, ?, ?)")
            .bind(key)
            .bind(name)
            .bind(i64::from(admin))
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
