// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory fakes and builders shared by the unit tests.

use crate::addresses::{HostResolver, ServiceLister};
use crate::crd::{DNSEndpoint, IngressRoute, IngressRouteSpec};
use crate::endpoints::RecordClient;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Service, ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a `kube::Error::Api` the way the API server reports it.
pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(Box::new(kube::core::Status {
        status: Some(kube::core::response::StatusSummary::Failure),
        message: format!("{reason} ({code})"),
        reason: reason.to_string(),
        code,
        metadata: None,
        details: None,
    }))
}

/// Build an `IngressRoute` with the given annotations.
pub fn route(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> IngressRoute {
    let annotations: BTreeMap<String, String> = annotations
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    IngressRoute {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: if annotations.is_empty() {
                None
            } else {
                Some(annotations)
            },
            resource_version: Some("1".to_string()),
            ..Default::default()
        },
        spec: IngressRouteSpec::default(),
    }
}

/// Build a `LoadBalancer` service whose status lists `(hostname, ip)` ingress points.
pub fn lb_service(name: &str, ingress: &[(Option<&str>, Option<&str>)]) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("traefik".to_string()),
            ..Default::default()
        },
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(
                    ingress
                        .iter()
                        .map(|(hostname, ip)| LoadBalancerIngress {
                            hostname: hostname.map(str::to_string),
                            ip: ip.map(str::to_string),
                            ..Default::default()
                        })
                        .collect(),
                ),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A call observed by [`FakeRecordClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordCall {
    Create {
        namespace: String,
        name: String,
        targets: Vec<String>,
        owned: bool,
    },
    Delete {
        namespace: String,
        name: String,
    },
}

/// Record API fake with real create/delete semantics plus scripted failures.
///
/// Creating an existing record answers `AlreadyExists`; deleting a missing one
/// answers `NotFound`. Queued failures are returned before that logic runs.
#[derive(Default)]
pub struct FakeRecordClient {
    existing: Mutex<BTreeSet<(String, String)>>,
    calls: Mutex<Vec<RecordCall>>,
    create_failures: Mutex<VecDeque<kube::Error>>,
    delete_failures: Mutex<VecDeque<kube::Error>>,
}

impl FakeRecordClient {
    pub fn with_existing(namespace: &str, name: &str) -> Self {
        let fake = Self::default();
        fake.existing
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()));
        fake
    }

    pub fn fail_next_create(&self, err: kube::Error) {
        self.create_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_delete(&self, err: kube::Error) {
        self.delete_failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<RecordCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordCall::Create { .. }))
            .count()
    }

    pub fn delete_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordCall::Delete { .. }))
            .count()
    }

    pub fn exists(&self, namespace: &str, name: &str) -> bool {
        self.existing
            .lock()
            .unwrap()
            .contains(&(namespace.to_string(), name.to_string()))
    }
}

#[async_trait]
impl RecordClient for FakeRecordClient {
    async fn create(&self, namespace: &str, record: &DNSEndpoint) -> Result<(), kube::Error> {
        let name = record.name_any();
        self.calls.lock().unwrap().push(RecordCall::Create {
            namespace: namespace.to_string(),
            name: name.clone(),
            targets: record
                .spec
                .endpoints
                .first()
                .map(|e| e.targets.clone())
                .unwrap_or_default(),
            owned: crate::ownership::is_owned(record),
        });

        if let Some(err) = self.create_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        if !self
            .existing
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name))
        {
            return Err(api_error(409, "AlreadyExists"));
        }
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        self.calls.lock().unwrap().push(RecordCall::Delete {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });

        if let Some(err) = self.delete_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        if !self
            .existing
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()))
        {
            return Err(api_error(404, "NotFound"));
        }
        Ok(())
    }
}

/// Service lister returning a fixed answer.
pub struct FakeServiceLister {
    pub services: Option<Vec<Service>>,
    pub calls: AtomicUsize,
}

impl FakeServiceLister {
    pub fn returning(services: Vec<Service>) -> Self {
        Self {
            services: Some(services),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            services: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ServiceLister for FakeServiceLister {
    async fn list(&self, _namespace: &str, _selector: &str) -> anyhow::Result<Vec<Service>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.services
            .clone()
            .ok_or_else(|| anyhow::anyhow!("services is forbidden"))
    }
}

/// Host resolver answering from a fixed table; unknown hosts fail.
#[derive(Default)]
pub struct FakeHostResolver {
    pub hosts: HashMap<String, Vec<IpAddr>>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeHostResolver {
    pub fn with(hosts: &[(&str, &[&str])]) -> Self {
        Self {
            hosts: hosts
                .iter()
                .map(|(host, ips)| {
                    (
                        (*host).to_string(),
                        ips.iter().map(|ip| ip.parse().unwrap()).collect(),
                    )
                })
                .collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HostResolver for FakeHostResolver {
    async fn lookup(&self, hostname: &str) -> std::io::Result<Vec<IpAddr>> {
        self.lookups.lock().unwrap().push(hostname.to_string());
        self.hosts.get(hostname).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such host {hostname}"),
            )
        })
    }
}
