// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the traefik2dns controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::num::NonZeroUsize;

// ============================================================================
// Controller Identity
// ============================================================================

/// Identity string written into the ownership marker of every record this controller creates
pub const CONTROLLER_NAME: &str = "traefik2dns";

// ============================================================================
// API Constants
// ============================================================================

/// API group of Traefik `IngressRoute` resources
pub const TRAEFIK_API_GROUP: &str = "traefik.containo.us";

/// API version of Traefik `IngressRoute` resources
pub const TRAEFIK_API_VERSION: &str = "v1alpha1";

/// Kind name for the `IngressRoute` resource
pub const KIND_INGRESS_ROUTE: &str = "IngressRoute";

/// API group of external-dns `DNSEndpoint` resources
pub const EXTERNAL_DNS_API_GROUP: &str = "externaldns.k8s.io";

/// API version of external-dns `DNSEndpoint` resources
pub const EXTERNAL_DNS_API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version) of `DNSEndpoint`
pub const EXTERNAL_DNS_API_GROUP_VERSION: &str = "externaldns.k8s.io/v1alpha1";

/// Kind name for the `DNSEndpoint` resource
pub const KIND_DNS_ENDPOINT: &str = "DNSEndpoint";

/// Plural resource name used in `DNSEndpoint` API paths
pub const DNS_ENDPOINT_PLURAL: &str = "dnsendpoints";

// ============================================================================
// Configuration Defaults
// ============================================================================

/// Default label selector for the Traefik load-balancer service(s)
pub const DEFAULT_TRAEFIK_LABEL: &str = "app.kubernetes.io/instance=traefik-traefik";

/// Default namespace for the Traefik load-balancer service(s)
pub const DEFAULT_TRAEFIK_NAMESPACE: &str = "traefik";

/// Default bind address for the metrics/health HTTP server
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default capacity of the route event channel between watcher and reconciler
pub const DEFAULT_EVENT_BUFFER: NonZeroUsize = NonZeroUsize::new(256).unwrap();

// ============================================================================
// Retry Constants
// ============================================================================

/// Maximum number of delete attempts when the API server reports a write conflict
pub const CONFLICT_RETRY_MAX_ATTEMPTS: u32 = 5;

/// Initial backoff between conflicting delete attempts (10ms)
pub const CONFLICT_RETRY_INITIAL_INTERVAL_MILLIS: u64 = 10;

/// Upper bound for the backoff between conflicting delete attempts (1 second)
pub const CONFLICT_RETRY_MAX_INTERVAL_MILLIS: u64 = 1_000;

// ============================================================================
// Kubernetes API Status Reasons
// ============================================================================

/// `reason` reported by the API server when creating an object that already exists
pub const REASON_ALREADY_EXISTS: &str = "AlreadyExists";

/// `reason` reported by the API server on an optimistic-concurrency write conflict
pub const REASON_CONFLICT: &str = "Conflict";

/// HTTP status code shared by `AlreadyExists` and `Conflict` responses
pub const HTTP_CONFLICT: u16 = 409;

/// HTTP status code for a missing object
pub const HTTP_NOT_FOUND: u16 = 404;
