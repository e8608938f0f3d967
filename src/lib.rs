// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # traefik2dns - external-dns records for Traefik IngressRoutes
//!
//! traefik2dns watches Traefik `IngressRoute` resources and publishes an external-dns
//! `DNSEndpoint` for every hostname declared in their annotations, pointing at the
//! addresses of the Traefik load balancer.
//!
//! ## Overview
//!
//! - At startup the Traefik load-balancer service(s) are listed and their ingress
//!   points resolved into a fixed address set.
//! - Hostnames come from `external-dns.alpha.kubernetes.io/internal-hostname`, or
//!   `external-dns.alpha.kubernetes.io/hostname` when the former is absent.
//! - Every created record is marked `managed-by: traefik2dns`; records are only
//!   deleted for routes carrying the same marker.
//!
//! ## Modules
//!
//! - [`crd`] - `IngressRoute` and `DNSEndpoint` resource types
//! - [`hostnames`] - Desired hostnames from route annotations
//! - [`ownership`] - The `managed-by` marker
//! - [`addresses`] - Load-balancer address resolution
//! - [`endpoints`] - `DNSEndpoint` construction and API calls
//! - [`reconciler`] - Route event handling
//! - [`watcher`] - `IngressRoute` watch stream adapter
//! - [`context`] - Shared controller context
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use traefik2dns::hostnames::desired_names;
//!
//! let annotations = BTreeMap::from([(
//!     "external-dns.alpha.kubernetes.io/hostname".to_string(),
//!     "a.example.com, b.example.com".to_string(),
//! )]);
//!
//! let names = desired_names(&annotations);
//! assert_eq!(names.len(), 2);
//! ```

pub mod addresses;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod endpoints;
pub mod errors;
pub mod hostnames;
pub mod labels;
pub mod metrics;
pub mod ownership;
pub mod reconciler;
pub mod retry;
pub mod watcher;

#[cfg(test)]
mod testing;
