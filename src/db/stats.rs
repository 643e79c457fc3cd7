// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Population snapshots.
//!
//! Append-only from the snapshot worker's perspective; the retention worker
//! trims the table back to the newest entries once it grows past the cap.

use sqlx::Row;

use crate::errors::StoreError;

use super::{StatEntry, Store};

impl Store {
    /// Append a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn insert_stat(&self, entry: &StatEntry) -> Result<(), StoreError> {
        let scanners = serde_json::to_string(&entry.scanners)
            .map_err(|e| StoreError::Decode(format!("failed to encode scanners: {e}")))?;

        sqlx::query(
            "INSERT INTO stats (date, total, updated, valid, scanners) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.date)
        .bind(entry.total)
        .bind(entry.updated)
        .bind(entry.valid)
        .bind(scanners)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// The newest snapshot, or `None` when the table is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn newest_stat(&self) -> Result<Option<StatEntry>, StoreError> {
        let row = sqlx::query(
            "SELECT date, total, updated, valid, scanners
             FROM stats ORDER BY date DESC, id DESC LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let scanners: String = row.try_get("scanners")?;
        let scanners = serde_json::from_str(&scanners)
            .map_err(|e| StoreError::Decode(format!("failed to decode scanners: {e}")))?;

        Ok(Some(StatEntry {
            date: row.try_get("date")?,
            total: row.try_get("total")?,
            updated: row.try_get("updated")?,
            valid: row.try_get("valid")?,
            scanners,
        }))
    }

    /// Number of stored snapshots.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn stat_count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM stats")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Delete the oldest snapshots until at most `cap` remain. Returns the
    /// number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn trim_stats(&self, cap: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM stats WHERE id NOT IN (
                 SELECT id FROM stats ORDER BY date DESC, id DESC LIMIT ?
             )",
        )
        .bind(cap)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
