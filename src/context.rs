// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared controller context.
//!
//! Everything the controller needs after startup lives here instead of in globals:
//! - Kubernetes client
//! - parsed configuration
//! - the load-balancer address set resolved once at startup
//!
//! The address set is read-only for the life of the process.

use crate::addresses::{AddressResolver, AddressSet};
use crate::config::ControllerConfig;
use crate::endpoints::KubeRecordClient;
use crate::errors::ResolutionError;
use crate::reconciler::RecordReconciler;
use kube::Client;
use std::sync::Arc;
use tracing::info;

/// Shared context handed to the watcher and the reconciler.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Controller configuration
    pub config: ControllerConfig,

    /// Record targets, resolved once at startup
    pub addresses: Arc<AddressSet>,
}

impl Context {
    /// Build a context around an already resolved address set.
    #[must_use]
    pub fn new(client: Client, config: ControllerConfig, addresses: AddressSet) -> Self {
        Self {
            client,
            config,
            addresses: Arc::new(addresses),
        }
    }

    /// Resolve the load-balancer addresses selected by `config` and build the context.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the services cannot be listed or a load-balancer
    /// hostname cannot be resolved. The controller cannot start without targets.
    pub async fn initialize(
        client: Client,
        config: ControllerConfig,
    ) -> Result<Self, ResolutionError> {
        let addresses = AddressResolver::from_client(client.clone())
            .resolve(&config.traefik_label, &config.traefik_namespace)
            .await?;

        info!(
            selector = %config.traefik_label,
            namespace = %config.traefik_namespace,
            addresses = %addresses,
            "Resolved Traefik load balancer addresses"
        );

        Ok(Self::new(client, config, addresses))
    }

    /// Reconciler writing `DNSEndpoint`s through this context's client.
    #[must_use]
    pub fn record_reconciler(&self) -> RecordReconciler<KubeRecordClient> {
        RecordReconciler::new(
            KubeRecordClient::new(self.client.clone()),
            Arc::clone(&self.addresses),
        )
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
