// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `IngressRoute` watch stream adapter.
//!
//! The kube watcher only reports "applied" and "deleted" objects, and replays the
//! full listing after every reconnect. [`RouteEventTranslator`] keeps the last seen
//! state of every route so the stream can be turned into [`RouteEvent`]s:
//!
//! - first sighting of a route → [`RouteEvent::Added`]
//! - new `resourceVersion` for a known route → [`RouteEvent::Updated`]
//! - same `resourceVersion` (relist replay) → nothing
//! - watch deletion → [`RouteEvent::Deleted`]
//! - route missing from a completed relist → [`RouteEvent::Deleted`]

use crate::crd::IngressRoute;
use crate::reconciler::RouteEvent;
use futures::{Stream, StreamExt};
use kube::runtime::reflector::ObjectRef;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Turns raw watcher events into [`RouteEvent`]s.
#[derive(Default)]
pub struct RouteEventTranslator {
    known: HashMap<ObjectRef<IngressRoute>, IngressRoute>,
    relisted: Option<HashSet<ObjectRef<IngressRoute>>>,
}

impl RouteEventTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of routes currently known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Translate one watcher event. May yield zero, one or several route events.
    pub fn translate(&mut self, event: watcher::Event<IngressRoute>) -> Vec<RouteEvent> {
        match event {
            watcher::Event::Init => {
                debug!("IngressRoute listing started");
                self.relisted = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(route) => {
                if let Some(seen) = self.relisted.as_mut() {
                    seen.insert(ObjectRef::from_obj(&route));
                }
                self.observe(route).into_iter().collect()
            }
            watcher::Event::InitDone => self.finish_relist(),
            watcher::Event::Apply(route) => self.observe(route).into_iter().collect(),
            watcher::Event::Delete(route) => {
                self.known.remove(&ObjectRef::from_obj(&route));
                vec![RouteEvent::Deleted(route)]
            }
        }
    }

    fn observe(&mut self, route: IngressRoute) -> Option<RouteEvent> {
        let key = ObjectRef::from_obj(&route);
        match self.known.insert(key, route.clone()) {
            None => Some(RouteEvent::Added(route)),
            Some(old) if old.resource_version() == route.resource_version() => None,
            Some(old) => Some(RouteEvent::Updated(old, route)),
        }
    }

    fn finish_relist(&mut self) -> Vec<RouteEvent> {
        let Some(seen) = self.relisted.take() else {
            return Vec::new();
        };

        let mut gone: Vec<ObjectRef<IngressRoute>> = self
            .known
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        gone.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

        debug!(
            routes = seen.len(),
            vanished = gone.len(),
            "IngressRoute listing complete"
        );

        gone.into_iter()
            .filter_map(|key| self.known.remove(&key))
            .map(RouteEvent::Deleted)
            .collect()
    }
}

/// Forward a watcher stream into the event channel until either side ends.
///
/// Watch errors are logged and skipped; the stream is expected to recover on its own.
pub async fn forward_route_events<S>(stream: S, events: mpsc::Sender<RouteEvent>)
where
    S: Stream<Item = Result<watcher::Event<IngressRoute>, watcher::Error>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut translator = RouteEventTranslator::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                for route_event in translator.translate(event) {
                    if events.send(route_event).await.is_err() {
                        info!("Route event channel closed, stopping IngressRoute watcher");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "IngressRoute watch error, the watcher will retry");
            }
        }
    }

    info!("IngressRoute watch stream ended");
}

/// Watch `IngressRoute`s in all namespaces and feed them to `events`.
pub async fn run_route_watcher(client: Client, events: mpsc::Sender<RouteEvent>) {
    let api: Api<IngressRoute> = Api::all(client);
    info!("Watching IngressRoutes in all namespaces");

    let stream = watcher(api, watcher::Config::default()).default_backoff();
    forward_route_events(stream, events).await;
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod watcher_tests;
