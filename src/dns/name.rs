// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hostname validation, canonicalization and label decomposition.
//!
//! Every stored entity is keyed by the triple `(domain, tld, sub)`:
//!
//! - `tld` is the *effective* TLD under the public-suffix rules and may span
//!   multiple labels (`co.uk`)
//! - `domain` is the single registrable label directly above it (`example`)
//! - `sub` is everything below the registrable domain, possibly empty
//!
//! `mail.example.co.uk` therefore splits into
//! `(domain: "example", tld: "co.uk", sub: "mail")`.
//!
//! The split is backed by the `addr` crate's public-suffix list. Names whose
//! registrable part is empty (the input is itself a public suffix) have no
//! parts and cannot be stored.

use serde::{Deserialize, Serialize};

/// Maximum length of a full hostname
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single label
const MAX_LABEL_LEN: usize = 63;

/// The label parts of a fully-qualified domain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parts {
    /// Registrable label, e.g. `example`
    pub domain: String,
    /// Effective TLD, e.g. `co.uk`
    pub tld: String,
    /// Subdomain labels below the registrable domain, possibly empty
    pub sub: String,
}

impl Parts {
    /// Reassemble the full hostname, e.g. `mail.example.co.uk`.
    #[must_use]
    pub fn fqdn(&self) -> String {
        fqdn_of(&self.domain, &self.tld, &self.sub)
    }

    /// The registrable domain, e.g. `example.co.uk`.
    #[must_use]
    pub fn registrable(&self) -> String {
        format!("{}.{}", self.domain, self.tld)
    }
}

/// Join `(domain, tld, sub)` back into a full hostname.
#[must_use]
pub fn fqdn_of(domain: &str, tld: &str, sub: &str) -> String {
    if sub.is_empty() {
        format!("{domain}.{tld}")
    } else {
        format!("{sub}.{domain}.{tld}")
    }
}

/// Canonicalize a hostname: lowercase and strip one trailing dot.
#[must_use]
pub fn clean(name: &str) -> String {
    let name = name.strip_suffix('.').unwrap_or(name);
    name.to_ascii_lowercase()
}

/// Syntactic hostname validation.
///
/// Accepts ASCII letters, digits, `-` and `_` in labels of 1-63 characters,
/// up to 253 characters overall, with no label starting or ending in `-`.
/// One trailing dot is tolerated. Wildcard labels are rejected.
#[must_use]
pub fn is_valid(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);

    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }

    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return false;
        }
    }

    true
}

/// Split a name into its `(domain, tld, sub)` parts.
///
/// The input is cleaned first. Returns `None` when the name does not parse
/// or when the registrable part is empty, i.e. the input is itself a public
/// suffix (`co.uk`).
#[must_use]
pub fn parts(fqdn: &str) -> Option<Parts> {
    let name = clean(fqdn);
    if !is_valid(&name) {
        return None;
    }

    let parsed = addr::parse_dns_name(&name).ok()?;
    let suffix = parsed.suffix()?;

    if suffix.len() >= name.len() {
        // The whole name is a public suffix; nothing registrable above it.
        return None;
    }

    let rest = &name[..name.len() - suffix.len() - 1];
    let (sub, domain) = match rest.rfind('.') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => ("", rest),
    };

    if domain.is_empty() {
        return None;
    }

    Some(Parts {
        domain: domain.to_string(),
        tld: suffix.to_string(),
        sub: sub.to_string(),
    })
}

/// The effective TLD of a name, e.g. `co.uk` for `mail.example.co.uk`.
///
/// Unlike [`parts`], a bare public suffix returns itself.
#[must_use]
pub fn tld_of(fqdn: &str) -> Option<String> {
    let name = clean(fqdn);
    if !is_valid(&name) {
        return None;
    }
    let parsed = addr::parse_dns_name(&name).ok()?;
    parsed.suffix().map(ToString::to_string)
}

/// The registrable domain of a name, e.g. `example.co.uk`.
#[must_use]
pub fn registrable_of(fqdn: &str) -> Option<String> {
    parts(fqdn).map(|p| p.registrable())
}

/// The subdomain part of a name, e.g. `mail` for `mail.example.co.uk`.
///
/// Returns `None` when the name has no parts; the apex yields an empty
/// string.
#[must_use]
pub fn sub_of(fqdn: &str) -> Option<String> {
    parts(fqdn).map(|p| p.sub)
}

/// Whether the name carries labels below its registrable domain.
#[must_use]
pub fn has_sub(fqdn: &str) -> bool {
    parts(fqdn).is_some_and(|p| !p.sub.is_empty())
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod name_tests;
