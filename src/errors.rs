// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for address discovery and record management.
//!
//! This module provides specialized error types for:
//! - Discovering the load-balancer addresses that records point at
//! - Creating and deleting `DNSEndpoint` records
//!
//! Resolution errors are fatal at startup. Record errors are reported per name and
//! never stop the controller.

use thiserror::Error;

/// Errors that can occur while building the address set from the ingress services.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// Listing the load-balancer services failed
    ///
    /// Returned when the API server rejects the list call or it keeps failing after
    /// transient retries are exhausted.
    #[error("Failed to list services matching '{selector}' in namespace '{namespace}': {source}")]
    ServiceList {
        /// The label selector that was queried
        selector: String,
        /// The namespace that was queried
        namespace: String,
        /// Underlying error from the service lister
        #[source]
        source: anyhow::Error,
    },

    /// A load-balancer hostname could not be resolved to IP addresses
    ///
    /// Any failed lookup abandons the whole resolution; partial results are discarded.
    #[error("Failed to resolve load balancer hostname '{hostname}': {source}")]
    HostLookup {
        /// The hostname published in the service's load-balancer status
        hostname: String,
        /// Underlying resolver error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while managing `DNSEndpoint` records.
#[derive(Error, Debug)]
pub enum RecordError {
    /// Creating a record failed for a reason other than it already existing
    #[error("Failed to create DNSEndpoint '{namespace}/{name}': {source}")]
    CreateFailed {
        /// Record name (the DNS hostname)
        name: String,
        /// Namespace of the owning route
        namespace: String,
        /// Underlying API error
        #[source]
        source: kube::Error,
    },

    /// Deleting a record failed, either immediately or after conflict retries ran out
    #[error("Failed to delete DNSEndpoint '{namespace}/{name}' after {attempts} attempt(s): {source}")]
    DeleteFailed {
        /// Record name (the DNS hostname)
        name: String,
        /// Namespace of the owning route
        namespace: String,
        /// Number of delete calls issued
        attempts: u32,
        /// The last API error observed
        #[source]
        source: kube::Error,
    },

    /// The route cannot be mapped to records (e.g. it carries no namespace)
    #[error("IngressRoute '{route}' cannot be reconciled: {reason}")]
    InvalidRoute {
        /// Route name
        route: String,
        /// Why the route was rejected
        reason: String,
    },
}

impl RecordError {
    /// Name of the record the error refers to, if any.
    #[must_use]
    pub fn record_name(&self) -> Option<&str> {
        match self {
            Self::CreateFailed { name, .. } | Self::DeleteFailed { name, .. } => Some(name),
            Self::InvalidRoute { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
