// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lookup popularity counters, keyed by registrable domain.
//!
//! Every successful lookup bumps the counter; the top-list sampler walks the
//! table in descending order to prioritize refreshes for what people
//! actually query. Counters never decay.

use sqlx::Row;

use crate::errors::StoreError;

use super::Store;

impl Store {
    /// Insert the domain with count 1, or increment an existing counter.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn bump_top_list(&self, registrable: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO top_list (domain, count) VALUES (?, 1)
             ON CONFLICT (domain) DO UPDATE SET count = count + 1",
        )
        .bind(registrable)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// All counters, most popular first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn top_domains(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let rows = sqlx::query("SELECT domain, count FROM top_list ORDER BY count DESC, domain")
            .fetch_all(self.pool())
            .await?;

        let mut domains = Vec::with_capacity(rows.len());
        for row in rows {
            domains.push((row.try_get("domain")?, row.try_get("count")?));
        }
        Ok(domains)
    }

    /// The counter for one registrable domain, 0 when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn top_list_count(&self, registrable: &str) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT count FROM top_list WHERE domain = ?")
            .bind(registrable)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(row.try_get("count")?),
            None => Ok(0),
        }
    }
}
