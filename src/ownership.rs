// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ownership marker handling.
//!
//! The marker is the pair `managed-by: traefik2dns`. It is used in two places:
//!
//! - **Routes** carry it as an annotation set by whoever operates the route. Only
//!   routes with the marker have their records deleted when the route goes away.
//! - **Records** get it as both label and annotation when traefik2dns creates them,
//!   recording where they came from.

use crate::constants::CONTROLLER_NAME;
use crate::labels::MANAGED_BY;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

/// Whether a resource carries the ownership marker as a label or an annotation.
#[must_use]
pub fn is_owned<K: ResourceExt>(resource: &K) -> bool {
    resource.labels().get(MANAGED_BY).map(String::as_str) == Some(CONTROLLER_NAME)
        || resource.annotations().get(MANAGED_BY).map(String::as_str) == Some(CONTROLLER_NAME)
}

/// Whether a route's operator has handed its records over to this controller.
///
/// Only the route's annotations are consulted.
#[must_use]
pub fn is_route_managed<K: ResourceExt>(route: &K) -> bool {
    route.annotations().get(MANAGED_BY).map(String::as_str) == Some(CONTROLLER_NAME)
}

/// Stamp the ownership marker onto object metadata as both label and annotation.
///
/// Existing labels and annotations are kept; a foreign `managed-by` value is replaced.
pub fn mark_owned(metadata: &mut ObjectMeta) {
    metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert(MANAGED_BY.to_string(), CONTROLLER_NAME.to_string());
    metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(MANAGED_BY.to_string(), CONTROLLER_NAME.to_string());
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod ownership_tests;
