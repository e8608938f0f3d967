// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource types for the two APIs traefik2dns talks to.
//!
//! Neither type is owned by this project: `IngressRoute` belongs to Traefik and
//! `DNSEndpoint` to external-dns. Both are modelled here just far enough for the
//! controller to read routes and publish records, and every optional field is
//! lenient so that objects written by newer versions of those projects still
//! deserialize.
//!
//! # Example
//!
//! ```rust
//! use traefik2dns::crd::{DNSEndpoint, DNSEndpointSpec, Endpoint};
//!
//! let record = DNSEndpoint::new(
//!     "svc.internal",
//!     DNSEndpointSpec {
//!         endpoints: vec![Endpoint::new("svc.internal", vec!["10.0.0.5".to_string()])],
//!     },
//! );
//! assert_eq!(record.spec.endpoints[0].dns_name, "svc.internal");
//! ```

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Traefik IngressRoute
// ============================================================================

/// `IngressRoute` is Traefik's HTTP routing rule.
///
/// traefik2dns only reads the object's metadata; the spec is kept so routes can be
/// listed and logged in full.
///
/// # Example
///
/// ```yaml
/// apiVersion: traefik.containo.us/v1alpha1
/// kind: IngressRoute
/// metadata:
///   name: dashboard
///   namespace: apps
///   annotations:
///     external-dns.alpha.kubernetes.io/internal-hostname: dashboard.internal
///     managed-by: traefik2dns
/// spec:
///   entryPoints: [websecure]
///   routes:
///     - match: Host(`dashboard.internal`)
///       kind: Rule
///       services:
///         - name: dashboard
///           port: 80
/// ```
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "traefik.containo.us",
    version = "v1alpha1",
    kind = "IngressRoute",
    namespaced,
    doc = "IngressRoute is the CRD implementation of a Traefik HTTP router."
)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteSpec {
    /// Entry points this route is attached to (e.g., `web`, `websecure`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<String>>,

    /// Routing rules
    #[serde(default)]
    pub routes: Vec<IngressRouteRule>,

    /// TLS options, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<serde_json::Value>,
}

/// A single Traefik routing rule.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteRule {
    /// Traefik matcher expression, e.g. ``Host(`a.example.com`)``
    #[serde(rename = "match")]
    pub match_rule: String,

    /// Rule kind, always `Rule` in practice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<IngressRouteService>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middlewares: Option<Vec<MiddlewareRef>>,
}

/// Backend service referenced by a routing rule.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteService {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<IntOrString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Reference to a Traefik `Middleware`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

// ============================================================================
// external-dns DNSEndpoint
// ============================================================================

/// `DNSEndpoint` is the external-dns source resource that publishes DNS records.
///
/// The object name doubles as the DNS name: traefik2dns creates one `DNSEndpoint` per
/// hostname, in the namespace of the route that asked for it.
///
/// # Example
///
/// ```yaml
/// apiVersion: externaldns.k8s.io/v1alpha1
/// kind: DNSEndpoint
/// metadata:
///   name: dashboard.internal
///   namespace: apps
///   annotations:
///     managed-by: traefik2dns
///   labels:
///     managed-by: traefik2dns
/// spec:
///   endpoints:
///     - dnsName: dashboard.internal
///       targets: [10.0.0.5]
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "externaldns.k8s.io",
    version = "v1alpha1",
    kind = "DNSEndpoint",
    plural = "dnsendpoints",
    namespaced,
    doc = "DNSEndpoint is a set of DNS records published by external-dns."
)]
#[kube(status = "DNSEndpointStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSEndpointSpec {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// One DNS name and the targets it resolves to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified hostname
    pub dns_name: String,

    /// Record targets, IP addresses for A/AAAA records
    #[serde(default)]
    pub targets: Vec<String>,

    /// Record type (A, AAAA, CNAME...). external-dns infers it when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_identifier: Option<String>,

    #[serde(
        default,
        rename = "recordTTL",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_ttl: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_specific: Option<Vec<ProviderSpecificProperty>>,
}

impl Endpoint {
    /// Endpoint for `dns_name` with the given targets and every optional field unset.
    #[must_use]
    pub fn new(dns_name: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            targets,
            ..Self::default()
        }
    }
}

/// Provider-specific key/value setting on an endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// Status written by external-dns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSEndpointStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
