// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired DNS names of a route, derived from its external-dns annotations.
//!
//! The internal-hostname annotation wins whenever it carries a value. Otherwise the
//! hostname annotation is used. Either value may list several hostnames separated by
//! commas; whitespace anywhere in the value is ignored.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use traefik2dns::hostnames::desired_names;
//! use traefik2dns::labels::HOSTNAME_ANNOTATION;
//!
//! let annotations = BTreeMap::from([(
//!     HOSTNAME_ANNOTATION.to_string(),
//!     "a.example.com, b.example.com".to_string(),
//! )]);
//! let names = desired_names(&annotations);
//! assert_eq!(names.len(), 2);
//! assert!(names.contains("a.example.com"));
//! ```

use crate::labels::{HOSTNAME_ANNOTATION, HOSTNAME_SEPARATOR, INTERNAL_HOSTNAME_ANNOTATION};
use std::collections::{BTreeMap, BTreeSet};

/// Compute the set of hostnames that should be published for a route.
///
/// Returns an empty set when neither annotation carries a hostname, in which case the
/// route has no records.
#[must_use]
pub fn desired_names(annotations: &BTreeMap<String, String>) -> BTreeSet<String> {
    selected_value(annotations)
        .map(split_hostnames)
        .unwrap_or_default()
}

/// Pick the annotation value that is authoritative for this route.
fn selected_value(annotations: &BTreeMap<String, String>) -> Option<&str> {
    [INTERNAL_HOSTNAME_ANNOTATION, HOSTNAME_ANNOTATION]
        .into_iter()
        .filter_map(|key| annotations.get(key))
        .map(String::as_str)
        .find(|value| !value.trim().is_empty())
}

/// Split a comma-separated hostname list, dropping whitespace and empty entries.
fn split_hostnames(value: &str) -> BTreeSet<String> {
    value
        .split(HOSTNAME_SEPARATOR)
        .map(|token| token.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|host| !host.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "hostnames_tests.rs"]
mod hostnames_tests;
