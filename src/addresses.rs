// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Discovery of the addresses every published record points at.
//!
//! Traefik is exposed through one or more `LoadBalancer` services. Their
//! `status.loadBalancer.ingress` entries carry either a literal IP or a hostname
//! (typical for cloud load balancers). Hostnames are resolved through the system
//! resolver so that records always target IPs.
//!
//! The resolution runs once at startup. The resulting [`AddressSet`] is then shared
//! read-only with the reconciler for the life of the process.
//!
//! # Ordering
//!
//! Addresses appear in service list order, then ingress order within a service, then
//! resolver order within a hostname. An ingress entry carrying both a hostname and an
//! IP contributes the resolved addresses first.

use crate::errors::ResolutionError;
use crate::retry::retry_api_call;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// Ordered list of target addresses for every managed record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet(Vec<String>);

impl AddressSet {
    #[must_use]
    pub fn new(addresses: Vec<String>) -> Self {
        Self(addresses)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for AddressSet {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Source of the load-balancer services fronting the ingress layer.
#[async_trait]
pub trait ServiceLister: Send + Sync {
    /// List services in `namespace` matching the label `selector`, in API order.
    async fn list(&self, namespace: &str, selector: &str) -> anyhow::Result<Vec<Service>>;
}

/// Hostname to IP resolution.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `hostname` into one or more IP addresses.
    async fn lookup(&self, hostname: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// [`ServiceLister`] backed by the Kubernetes API.
///
/// Transient API errors are retried with the default Kubernetes backoff.
#[derive(Clone)]
pub struct KubeServiceLister {
    client: Client,
}

impl KubeServiceLister {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceLister for KubeServiceLister {
    async fn list(&self, namespace: &str, selector: &str) -> anyhow::Result<Vec<Service>> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(selector);

        let services = retry_api_call(
            || api.list(&params),
            &format!("list services {selector} in {namespace}"),
        )
        .await?;

        Ok(services.items)
    }
}

/// [`HostResolver`] using the operating system resolver (`getaddrinfo`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostResolver;

#[async_trait]
impl HostResolver for SystemHostResolver {
    async fn lookup(&self, hostname: &str) -> std::io::Result<Vec<IpAddr>> {
        let mut ips: Vec<IpAddr> = Vec::new();
        // getaddrinfo returns one entry per socket type, collapse them
        for addr in tokio::net::lookup_host((hostname, 0)).await? {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        Ok(ips)
    }
}

/// Builds the [`AddressSet`] from the ingress services' load-balancer status.
pub struct AddressResolver<L, H> {
    lister: L,
    resolver: H,
}

impl AddressResolver<KubeServiceLister, SystemHostResolver> {
    /// Resolver backed by the Kubernetes API and the system DNS resolver.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self::new(KubeServiceLister::new(client), SystemHostResolver)
    }
}

impl<L: ServiceLister, H: HostResolver> AddressResolver<L, H> {
    pub fn new(lister: L, resolver: H) -> Self {
        Self { lister, resolver }
    }

    /// Collect the addresses of every load-balancer ingress point of the services
    /// matching `selector` in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::ServiceList`] when the services cannot be listed and
    /// [`ResolutionError::HostLookup`] as soon as any hostname fails to resolve. No
    /// partial result is returned in either case.
    pub async fn resolve(
        &self,
        selector: &str,
        namespace: &str,
    ) -> Result<AddressSet, ResolutionError> {
        let services = self.lister.list(namespace, selector).await.map_err(|source| {
            ResolutionError::ServiceList {
                selector: selector.to_string(),
                namespace: namespace.to_string(),
                source,
            }
        })?;
        debug!(
            selector = selector,
            namespace = namespace,
            count = services.len(),
            "Listed ingress services"
        );

        let mut addresses = Vec::new();
        for service in &services {
            let ingress_points = service
                .status
                .as_ref()
                .and_then(|status| status.load_balancer.as_ref())
                .and_then(|lb| lb.ingress.as_deref())
                .unwrap_or_default();

            if ingress_points.is_empty() {
                debug!(
                    service = %service.name_any(),
                    "Service has no load balancer ingress yet"
                );
            }

            for ingress in ingress_points {
                if let Some(hostname) = ingress.hostname.as_deref().filter(|h| !h.is_empty()) {
                    let ips = self.resolver.lookup(hostname).await.map_err(|source| {
                        ResolutionError::HostLookup {
                            hostname: hostname.to_string(),
                            source,
                        }
                    })?;
                    debug!(hostname = hostname, ips = ?ips, "Resolved load balancer hostname");
                    addresses.extend(ips.iter().map(IpAddr::to_string));
                }
                if let Some(ip) = ingress.ip.as_deref().filter(|ip| !ip.is_empty()) {
                    addresses.push(ip.to_string());
                }
            }
        }

        let addresses = AddressSet::new(addresses);
        if addresses.is_empty() {
            warn!(
                selector = selector,
                namespace = namespace,
                "No load balancer addresses found, records will be created without targets"
            );
        } else {
            info!(addresses = %addresses, "Detected load balancer addresses");
        }
        crate::metrics::record_resolved_addresses(addresses.len());

        Ok(addresses)
    }
}

#[cfg(test)]
#[path = "addresses_tests.rs"]
mod addresses_tests;
