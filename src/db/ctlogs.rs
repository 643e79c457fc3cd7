// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CT-log scanner progress cursors.
//!
//! An external scanner keeps these rows current while it feeds the domains
//! collection; the core only reads them for statistics. The write side is
//! still implemented here so the scanner and the tests share one code path.

use sqlx::Row;

use crate::errors::StoreError;

use super::{ScannerProgress, Store};

impl Store {
    /// Upsert a scanner cursor. The name is lowercased.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn set_scanner_progress(
        &self,
        name: &str,
        index: i64,
        size: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO ct_logs (name, idx, size) VALUES (?, ?, ?)
             ON CONFLICT (name) DO UPDATE SET idx = excluded.idx, size = excluded.size",
        )
        .bind(name.to_ascii_lowercase())
        .bind(index)
        .bind(size)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// All scanner cursors, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn scanner_progress(&self) -> Result<Vec<ScannerProgress>, StoreError> {
        let rows = sqlx::query("SELECT name, idx, size FROM ct_logs ORDER BY name")
            .fetch_all(self.pool())
            .await?;

        let mut scanners = Vec::with_capacity(rows.len());
        for row in rows {
            scanners.push(ScannerProgress {
                name: row.try_get("name")?,
                index: row.try_get("idx")?,
                size: row.try_get("size")?,
            });
        }
        Ok(scanners)
    }
}
