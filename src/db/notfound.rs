// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Registrable domains that produced an empty lookup.
//!
//! A best-effort diagnostic set: the refresh pipeline never reads it, it
//! exists so operators can see what people searched for in vain.

use sqlx::Row;

use crate::errors::StoreError;

use super::Store;

impl Store {
    /// Record a lookup miss. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn record_not_found(&self, registrable: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO not_found (domain) VALUES (?)")
            .bind(registrable)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Whether a domain is in the not-found set.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn is_not_found(&self, registrable: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 AS one FROM not_found WHERE domain = ?")
            .bind(registrable)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }
}
