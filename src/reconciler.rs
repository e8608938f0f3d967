// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Route event handling.
//!
//! The reconciler turns `IngressRoute` events into `DNSEndpoint` calls:
//!
//! | Event | Action |
//! |-------|--------|
//! | [`RouteEvent::Added`] | create one owned record per desired hostname |
//! | [`RouteEvent::Updated`] | nothing, records are never rewritten |
//! | [`RouteEvent::Deleted`] | if the route is managed, delete one record per desired hostname |
//!
//! Creation is a single attempt and `AlreadyExists` counts as success. Deletion
//! retries write conflicts with a short backoff and `NotFound` counts as success.
//! A failure on one hostname is reported and never stops the remaining hostnames or
//! the following events.
//!
//! Events are handled strictly one at a time by [`RecordReconciler::run`].

use crate::addresses::AddressSet;
use crate::crd::IngressRoute;
use crate::endpoints::{build_record, RecordClient};
use crate::errors::RecordError;
use crate::hostnames::desired_names;
use crate::metrics::{
    record_operation, record_route_event, OPERATION_CREATE, OPERATION_DELETE, OUTCOME_ERROR,
    OUTCOME_NOOP, OUTCOME_SUCCESS,
};
use crate::ownership::is_route_managed;
use crate::retry::{is_already_exists, is_not_found, retry_on_conflict};
use kube::ResourceExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A change to an `IngressRoute`, as delivered by the watcher.
#[derive(Clone, Debug)]
pub enum RouteEvent {
    /// The route appeared (including the initial listing at startup)
    Added(IngressRoute),
    /// The route changed: `(old, new)`
    Updated(IngressRoute, IngressRoute),
    /// The route is gone; carries its last known state
    Deleted(IngressRoute),
}

impl RouteEvent {
    /// Lowercase event name used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Updated(..) => "updated",
            Self::Deleted(_) => "deleted",
        }
    }

    /// The most recent state of the route the event is about.
    #[must_use]
    pub fn route(&self) -> &IngressRoute {
        match self {
            Self::Added(route) | Self::Updated(_, route) | Self::Deleted(route) => route,
        }
    }
}

/// Result of a single record creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Result of a single record deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// What handling one event did, hostname by hostname.
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    /// Records created by this event
    pub created: Vec<String>,
    /// Records that already existed
    pub already_present: Vec<String>,
    /// Records deleted by this event
    pub deleted: Vec<String>,
    /// Records that were already gone
    pub already_absent: Vec<String>,
    /// Per-hostname failures
    pub failures: Vec<RecordError>,
    /// A delete was skipped because the route is not managed by this controller
    pub skipped_unmanaged: bool,
}

impl ReconcileSummary {
    /// `true` when no hostname failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives `DNSEndpoint` records from route events.
pub struct RecordReconciler<R> {
    records: R,
    addresses: Arc<AddressSet>,
}

impl<R: RecordClient> RecordReconciler<R> {
    /// Create a reconciler publishing every record with `addresses` as targets.
    pub fn new(records: R, addresses: Arc<AddressSet>) -> Self {
        Self { records, addresses }
    }

    /// The target addresses used for every created record.
    #[must_use]
    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    /// Handle one route event.
    pub async fn handle(&self, event: RouteEvent) -> ReconcileSummary {
        record_route_event(event.kind());

        let summary = match &event {
            RouteEvent::Added(route) => self.on_added(route).await,
            RouteEvent::Updated(old, new) => self.on_updated(old, new),
            RouteEvent::Deleted(route) => self.on_deleted(route).await,
        };

        if !summary.is_success() {
            warn!(
                event = event.kind(),
                namespace = ?event.route().namespace(),
                route = %event.route().name_any(),
                failures = summary.failures.len(),
                "IngressRoute event handled with failures"
            );
        }
        summary
    }

    /// Create a record for every desired hostname of a new route.
    pub async fn on_added(&self, route: &IngressRoute) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let name = route.name_any();
        let Some(namespace) = route.namespace() else {
            summary.failures.push(invalid_route(&name));
            return summary;
        };
        info!("IngressRoute {namespace}/{name} added");

        for host in desired_names(route.annotations()) {
            info!("Adding DNS entries for {host}");
            match self.create_record(&host, &namespace).await {
                Ok(CreateOutcome::Created) => summary.created.push(host),
                Ok(CreateOutcome::AlreadyExists) => summary.already_present.push(host),
                Err(e) => {
                    error!("Could not create DNSEndpoint {namespace}/{host}: {e}");
                    summary.failures.push(e);
                }
            }
        }
        summary
    }

    /// Route updates never touch records.
    pub fn on_updated(&self, _old: &IngressRoute, new: &IngressRoute) -> ReconcileSummary {
        info!(
            "IngressRoute {}/{} updated",
            new.namespace().unwrap_or_default(),
            new.name_any()
        );
        ReconcileSummary::default()
    }

    /// Delete the records of a managed route that went away.
    pub async fn on_deleted(&self, route: &IngressRoute) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let name = route.name_any();
        let Some(namespace) = route.namespace() else {
            summary.failures.push(invalid_route(&name));
            return summary;
        };

        if !is_route_managed(route) {
            info!("IngressRoute {namespace}/{name} is not managed by traefik2dns. Ignored.");
            summary.skipped_unmanaged = true;
            return summary;
        }
        info!("IngressRoute {namespace}/{name} deleted");

        for host in desired_names(route.annotations()) {
            match self.delete_record(&host, &namespace).await {
                Ok(DeleteOutcome::Deleted) => summary.deleted.push(host),
                Ok(DeleteOutcome::AlreadyAbsent) => summary.already_absent.push(host),
                Err(e) => {
                    error!("Error deleting record: {e}");
                    summary.failures.push(e);
                }
            }
        }
        summary
    }

    /// Create one owned record, treating `AlreadyExists` as success. Never retried.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CreateFailed`] for any other API error.
    pub async fn create_record(
        &self,
        dns_name: &str,
        namespace: &str,
    ) -> Result<CreateOutcome, RecordError> {
        let record = build_record(dns_name, namespace, &self.addresses);

        match self.records.create(namespace, &record).await {
            Ok(()) => {
                record_operation(OPERATION_CREATE, OUTCOME_SUCCESS);
                info!(
                    namespace = namespace,
                    record = dns_name,
                    targets = %self.addresses,
                    "DNSEndpoint created"
                );
                Ok(CreateOutcome::Created)
            }
            Err(e) if is_already_exists(&e) => {
                record_operation(OPERATION_CREATE, OUTCOME_NOOP);
                info!("DNS endpoint {namespace}/{dns_name} already exists");
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(source) => {
                record_operation(OPERATION_CREATE, OUTCOME_ERROR);
                Err(RecordError::CreateFailed {
                    name: dns_name.to_string(),
                    namespace: namespace.to_string(),
                    source,
                })
            }
        }
    }

    /// Delete one record, retrying write conflicts. `NotFound` counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::DeleteFailed`] when a non-conflict error is returned or
    /// the conflict retries run out.
    pub async fn delete_record(
        &self,
        dns_name: &str,
        namespace: &str,
    ) -> Result<DeleteOutcome, RecordError> {
        let result = retry_on_conflict(
            || self.records.delete(namespace, dns_name),
            &format!("delete DNSEndpoint {namespace}/{dns_name}"),
        )
        .await;

        match result {
            Ok(()) => {
                record_operation(OPERATION_DELETE, OUTCOME_SUCCESS);
                info!(namespace = namespace, record = dns_name, "DNSEndpoint deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if is_not_found(&e.source) => {
                record_operation(OPERATION_DELETE, OUTCOME_NOOP);
                debug!(
                    namespace = namespace,
                    record = dns_name,
                    "DNSEndpoint already absent"
                );
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            Err(e) => {
                record_operation(OPERATION_DELETE, OUTCOME_ERROR);
                Err(RecordError::DeleteFailed {
                    name: dns_name.to_string(),
                    namespace: namespace.to_string(),
                    attempts: e.attempts,
                    source: e.source,
                })
            }
        }
    }

    /// Process events one at a time until the channel closes or `shutdown` resolves.
    ///
    /// An event already being handled is finished before shutdown takes effect.
    /// Returns the number of events handled.
    pub async fn run<S>(&self, mut events: mpsc::Receiver<RouteEvent>, shutdown: S) -> usize
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut handled = 0;

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!(handled = handled, "Shutdown requested, stopping reconciler");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!(handled = handled, "Route event stream closed, stopping reconciler");
                        break;
                    };
                    self.handle(event).await;
                    handled += 1;
                }
            }
        }

        handled
    }
}

fn invalid_route(name: &str) -> RecordError {
    RecordError::InvalidRoute {
        route: name.to_string(),
        reason: "route has no namespace".to_string(),
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
