// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line and environment configuration.
//!
//! Every flag can also be set through the environment variable shown in `--help`, so
//! the controller can be configured entirely from a Deployment's `env:` block.

use crate::constants::{
    DEFAULT_EVENT_BUFFER, DEFAULT_METRICS_BIND_ADDRESS, DEFAULT_TRAEFIK_LABEL,
    DEFAULT_TRAEFIK_NAMESPACE,
};
use clap::Parser;
use std::net::SocketAddr;
use std::num::NonZeroUsize;

/// Publishes external-dns `DNSEndpoint` records for annotated Traefik `IngressRoute`s.
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(name = "traefik2dns", version, about)]
pub struct ControllerConfig {
    /// Label selector identifying the Traefik load-balancer service(s)
    #[arg(long, env = "TRAEFIK_LABEL", default_value = DEFAULT_TRAEFIK_LABEL)]
    pub traefik_label: String,

    /// Namespace the Traefik load-balancer service(s) live in
    #[arg(long, env = "TRAEFIK_NAMESPACE", default_value = DEFAULT_TRAEFIK_NAMESPACE)]
    pub traefik_namespace: String,

    /// Address the `/metrics` and `/healthz` endpoints listen on
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: SocketAddr,

    /// Capacity of the queue between the route watcher and the reconciler
    #[arg(long, env = "EVENT_BUFFER", default_value_t = DEFAULT_EVENT_BUFFER)]
    pub event_buffer: NonZeroUsize,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
