// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Access to the external-dns record API.
//!
//! The reconciler talks to records only through [`RecordClient`], which keeps it
//! testable without an API server. [`KubeRecordClient`] is the production
//! implementation: a `POST` to
//! `/apis/externaldns.k8s.io/v1alpha1/namespaces/{ns}/dnsendpoints` to create and a
//! `DELETE` of `.../dnsendpoints/{name}` to remove.

use crate::addresses::AddressSet;
use crate::crd::{DNSEndpoint, DNSEndpointSpec, Endpoint};
use crate::ownership::mark_owned;
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::debug;

/// Create/delete access to `DNSEndpoint` records.
///
/// Errors are returned untouched so that callers can classify them with the
/// helpers in [`crate::retry`].
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Create `record` in `namespace`.
    async fn create(&self, namespace: &str, record: &DNSEndpoint) -> Result<(), kube::Error>;

    /// Delete the record `name` in `namespace`.
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), kube::Error>;
}

/// [`RecordClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeRecordClient {
    client: Client,
}

impl KubeRecordClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<DNSEndpoint> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl RecordClient for KubeRecordClient {
    async fn create(&self, namespace: &str, record: &DNSEndpoint) -> Result<(), kube::Error> {
        let created = self
            .api(namespace)
            .create(&PostParams::default(), record)
            .await?;
        debug!(
            namespace = namespace,
            record = ?created.metadata.name,
            "DNSEndpoint created"
        );
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        debug!(namespace = namespace, record = name, "DNSEndpoint deleted");
        Ok(())
    }
}

/// Build the owned record publishing `dns_name` with every address as target.
///
/// The object name equals the DNS name and the record lives in the route's namespace.
#[must_use]
pub fn build_record(dns_name: &str, namespace: &str, addresses: &AddressSet) -> DNSEndpoint {
    let mut record = DNSEndpoint::new(
        dns_name,
        DNSEndpointSpec {
            endpoints: vec![Endpoint::new(dns_name, addresses.to_vec())],
        },
    );
    record.metadata.namespace = Some(namespace.to_string());
    mark_owned(&mut record.metadata);
    record
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod endpoints_tests;
