// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operations on the `domains` and `records` tables.
//!
//! The `records` field is exclusively written through [`Store::touch_record`]
//! and [`Store::append_record`]; everything else only reads it. `updated` is
//! the refresh cool-down stamp.

use sqlx::Row;

use crate::dns::name::{fqdn_of, Parts};
use crate::errors::StoreError;

use super::{DnsRecord, DomainEntry, Store};

impl Store {
    /// Insert the triple if absent, with empty records and `updated = 0`.
    ///
    /// Returns `true` when the row is new. Re-inserting an existing triple
    /// is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn upsert_domain(&self, parts: &Parts) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO domains (domain, tld, sub)
             VALUES (?, ?, ?)
             ON CONFLICT (domain, tld, sub) DO NOTHING",
        )
        .bind(&parts.domain)
        .bind(&parts.tld)
        .bind(&parts.sub)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Read the refresh stamp, or `None` when the triple is not stored.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn get_updated(&self, parts: &Parts) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT updated FROM domains WHERE domain = ? AND tld = ? AND sub = ?")
            .bind(&parts.domain)
            .bind(&parts.tld)
            .bind(&parts.sub)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("updated")?)),
            None => Ok(None),
        }
    }

    /// Write the refresh stamp.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn set_updated(&self, parts: &Parts, now: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE domains SET updated = ? WHERE domain = ? AND tld = ? AND sub = ?")
            .bind(now)
            .bind(&parts.domain)
            .bind(&parts.tld)
            .bind(&parts.sub)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Set the observation time of the matching `(type, value)` record.
    ///
    /// Returns the number of rows that matched: `0` means the record is new
    /// and should be appended, `1` is the expected update, anything above
    /// means the no-duplicates invariant is broken and the caller must
    /// surface it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn touch_record(
        &self,
        parts: &Parts,
        rtype: u16,
        value: &str,
        now: i64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE records SET time = ?
             WHERE domain_id = (
                 SELECT id FROM domains WHERE domain = ? AND tld = ? AND sub = ?
             )
             AND rtype = ? AND value = ?",
        )
        .bind(now)
        .bind(&parts.domain)
        .bind(&parts.tld)
        .bind(&parts.sub)
        .bind(i64::from(rtype))
        .bind(value)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Append a record unless an equal `(type, value)` entry already exists.
    /// Idempotent; appending to an unknown triple is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn append_record(
        &self,
        parts: &Parts,
        rtype: u16,
        value: &str,
        time: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO records (domain_id, rtype, value, time)
             SELECT d.id, ?, ?, ?
             FROM domains d
             WHERE d.domain = ? AND d.tld = ? AND d.sub = ?
               AND NOT EXISTS (
                   SELECT 1 FROM records r
                   WHERE r.domain_id = d.id AND r.rtype = ? AND r.value = ?
               )",
        )
        .bind(i64::from(rtype))
        .bind(value)
        .bind(time)
        .bind(&parts.domain)
        .bind(&parts.tld)
        .bind(&parts.sub)
        .bind(i64::from(rtype))
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Fetch one entry with its full record history.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn find_one(&self, parts: &Parts) -> Result<Option<DomainEntry>, StoreError> {
        let entries = self
            .fetch_entries(
                "SELECT d.domain, d.tld, d.sub, d.updated, r.rtype, r.value, r.time
                 FROM domains d
                 LEFT JOIN records r ON r.domain_id = d.id
                 WHERE d.domain = ? AND d.tld = ? AND d.sub = ?
                 ORDER BY d.id, r.id",
                &[&parts.domain, &parts.tld, &parts.sub],
            )
            .await?;
        Ok(entries.into_iter().next())
    }

    /// Fetch every entry under a registrable domain, full records included.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn find_by_domain(
        &self,
        domain: &str,
        tld: &str,
    ) -> Result<Vec<DomainEntry>, StoreError> {
        self.fetch_entries(
            "SELECT d.domain, d.tld, d.sub, d.updated, r.rtype, r.value, r.time
             FROM domains d
             LEFT JOIN records r ON r.domain_id = d.id
             WHERE d.domain = ? AND d.tld = ?
             ORDER BY d.id, r.id",
            &[domain, tld],
        )
        .await
    }

    /// Every stored FQDN under a registrable domain, apex included.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn list_fqdns(&self, domain: &str, tld: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT sub FROM domains WHERE domain = ? AND tld = ? ORDER BY id")
            .bind(domain)
            .bind(tld)
            .fetch_all(self.pool())
            .await?;

        let mut fqdns = Vec::with_capacity(rows.len());
        for row in rows {
            let sub: String = row.try_get("sub")?;
            fqdns.push(fqdn_of(domain, tld, &sub));
        }
        Ok(fqdns)
    }

    /// Up to `n` uniformly sampled entries, without records.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn sample_domains(&self, n: i64) -> Result<Vec<DomainEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT domain, tld, sub, updated FROM domains ORDER BY RANDOM() LIMIT ?",
        )
        .bind(n)
        .fetch_all(self.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(DomainEntry {
                domain: row.try_get("domain")?,
                tld: row.try_get("tld")?,
                sub: row.try_get("sub")?,
                updated: row.try_get("updated")?,
                records: Vec::new(),
            });
        }
        Ok(entries)
    }

    /// Total number of stored FQDNs.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn count_total(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM domains")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Number of FQDNs refreshed at least once.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn count_updated(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM domains WHERE updated > 0")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Number of FQDNs with at least one record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn count_valid(&self) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM domains d
             WHERE EXISTS (SELECT 1 FROM records r WHERE r.domain_id = d.id)",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(row.try_get("n")?)
    }

    /// Distinct registrable labels starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn domains_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let pattern = format!("{}%", escape_like(prefix));
        let rows = sqlx::query(
            "SELECT DISTINCT domain FROM domains WHERE domain LIKE ? ESCAPE '\\' ORDER BY domain",
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;

        let mut domains = Vec::with_capacity(rows.len());
        for row in rows {
            domains.push(row.try_get("domain")?);
        }
        Ok(domains)
    }

    /// Distinct TLDs stored for a registrable label, sorted.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn tlds_of_domain(&self, domain: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT tld FROM domains WHERE domain = ? ORDER BY tld")
            .bind(domain)
            .fetch_all(self.pool())
            .await?;

        let mut tlds = Vec::with_capacity(rows.len());
        for row in rows {
            tlds.push(row.try_get("tld")?);
        }
        Ok(tlds)
    }

    /// Run a domains-with-records join and fold the rows into entries.
    async fn fetch_entries(
        &self,
        sql: &str,
        binds: &[&str],
    ) -> Result<Vec<DomainEntry>, StoreError> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let rows = query.fetch_all(self.pool()).await?;

        let mut entries: Vec<DomainEntry> = Vec::new();
        for row in rows {
            let domain: String = row.try_get("domain")?;
            let tld: String = row.try_get("tld")?;
            let sub: String = row.try_get("sub")?;
            let updated: i64 = row.try_get("updated")?;

            let is_same = entries
                .last()
                .is_some_and(|e| e.domain == domain && e.tld == tld && e.sub == sub);
            if !is_same {
                entries.push(DomainEntry {
                    domain,
                    tld,
                    sub,
                    updated,
                    records: Vec::new(),
                });
            }

            let rtype: Option<i64> = row.try_get("rtype")?;
            if let Some(rtype) = rtype {
                let value: String = row.try_get("value")?;
                let time: i64 = row.try_get("time")?;
                let rtype = u16::try_from(rtype)
                    .map_err(|_| StoreError::Decode(format!("record type {rtype} out of range")))?;
                if let Some(entry) = entries.last_mut() {
                    entry.records.push(DnsRecord { rtype, value, time });
                }
            }
        }

        Ok(entries)
    }
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod domain_tests;
