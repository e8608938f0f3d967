// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller behaviour against a mock Kubernetes API server.
//!
//! These tests run the real kube-backed clients over HTTP, so they cover the request
//! paths, bodies and error classification the unit tests fake out.

mod common;

use common::{dns_endpoint_body, dns_endpoints_path, mock_client, status_failure};
use serde_json::json;
use std::sync::Arc;
use traefik2dns::addresses::{AddressResolver, AddressSet};
use traefik2dns::crd::IngressRoute;
use traefik2dns::endpoints::KubeRecordClient;
use traefik2dns::errors::{RecordError, ResolutionError};
use traefik2dns::reconciler::{RecordReconciler, RouteEvent};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn web_route(annotations: serde_json::Value) -> IngressRoute {
    serde_json::from_value(json!({
        "apiVersion": "traefik.containo.us/v1alpha1",
        "kind": "IngressRoute",
        "metadata": {
            "name": "web",
            "namespace": "apps",
            "resourceVersion": "7",
            "annotations": annotations
        },
        "spec": {
            "entryPoints": ["websecure"],
            "routes": [{ "match": "Host(`a.example.com`)", "kind": "Rule" }]
        }
    }))
    .expect("valid IngressRoute")
}

fn reconciler(server: &MockServer) -> RecordReconciler<KubeRecordClient> {
    RecordReconciler::new(
        KubeRecordClient::new(mock_client(server)),
        Arc::new(AddressSet::new(vec![
            "10.0.0.5".to_string(),
            "10.0.0.6".to_string(),
        ])),
    )
}

#[tokio::test]
async fn test_added_route_posts_owned_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(dns_endpoints_path("apps")))
        .and(body_partial_json(json!({
            "apiVersion": "externaldns.k8s.io/v1alpha1",
            "kind": "DNSEndpoint",
            "metadata": {
                "name": "a.example.com",
                "namespace": "apps",
                "labels": { "managed-by": "traefik2dns" },
                "annotations": { "managed-by": "traefik2dns" }
            },
            "spec": {
                "endpoints": [{
                    "dnsName": "a.example.com",
                    "targets": ["10.0.0.5", "10.0.0.6"]
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(dns_endpoint_body(
            "apps",
            "a.example.com",
            &["10.0.0.5", "10.0.0.6"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let route = web_route(json!({
        "external-dns.alpha.kubernetes.io/hostname": "a.example.com"
    }));
    let summary = reconciler(&server).handle(RouteEvent::Added(route)).await;

    assert!(summary.is_success(), "failures: {:?}", summary.failures);
    assert_eq!(summary.created, vec!["a.example.com"]);
}

#[tokio::test]
async fn test_already_exists_is_treated_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(dns_endpoints_path("apps")))
        .respond_with(ResponseTemplate::new(409).set_body_json(status_failure(
            409,
            "AlreadyExists",
            "dnsendpoints.externaldns.k8s.io \"a.example.com\" already exists",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let route = web_route(json!({
        "external-dns.alpha.kubernetes.io/hostname": "a.example.com"
    }));
    let summary = reconciler(&server).handle(RouteEvent::Added(route)).await;

    assert!(summary.is_success());
    assert_eq!(summary.already_present, vec!["a.example.com"]);
}

#[tokio::test]
async fn test_create_forbidden_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(dns_endpoints_path("apps")))
        .respond_with(ResponseTemplate::new(403).set_body_json(status_failure(
            403,
            "Forbidden",
            "dnsendpoints.externaldns.k8s.io is forbidden",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let result = reconciler(&server)
        .create_record("a.example.com", "apps")
        .await;

    assert!(matches!(result, Err(RecordError::CreateFailed { .. })));
}

#[tokio::test]
async fn test_delete_retries_after_conflict() {
    let server = MockServer::start().await;
    let record_path = format!("{}/a.example.com", dns_endpoints_path("apps"));

    Mock::given(method("DELETE"))
        .and(path(record_path.clone()))
        .respond_with(ResponseTemplate::new(409).set_body_json(status_failure(
            409,
            "Conflict",
            "the object has been modified; please apply your changes to the latest version",
        )))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(record_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(dns_endpoint_body(
            "apps",
            "a.example.com",
            &["10.0.0.5"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let route = web_route(json!({
        "external-dns.alpha.kubernetes.io/hostname": "a.example.com",
        "managed-by": "traefik2dns"
    }));
    let summary = reconciler(&server).handle(RouteEvent::Deleted(route)).await;

    assert!(summary.is_success(), "failures: {:?}", summary.failures);
    assert_eq!(summary.deleted, vec!["a.example.com"]);
}

#[tokio::test]
async fn test_delete_of_missing_record_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/a.example.com", dns_endpoints_path("apps"))))
        .respond_with(ResponseTemplate::new(404).set_body_json(status_failure(
            404,
            "NotFound",
            "dnsendpoints.externaldns.k8s.io \"a.example.com\" not found",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let result = reconciler(&server)
        .delete_record("a.example.com", "apps")
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unmanaged_route_deletion_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let route = web_route(json!({
        "external-dns.alpha.kubernetes.io/hostname": "a.example.com"
    }));
    let summary = reconciler(&server).handle(RouteEvent::Deleted(route)).await;

    assert!(summary.skipped_unmanaged);
}

#[tokio::test]
async fn test_address_resolution_lists_selected_services() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/traefik/services"))
        .and(query_param(
            "labelSelector",
            "app.kubernetes.io/instance=traefik-traefik",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "ServiceList",
            "metadata": { "resourceVersion": "42" },
            "items": [{
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": { "name": "traefik", "namespace": "traefik" },
                "spec": { "type": "LoadBalancer" },
                "status": {
                    "loadBalancer": {
                        "ingress": [{ "ip": "10.0.0.5" }, { "ip": "10.0.0.6" }]
                    }
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let addresses = AddressResolver::from_client(mock_client(&server))
        .resolve("app.kubernetes.io/instance=traefik-traefik", "traefik")
        .await
        .expect("addresses should resolve");

    assert_eq!(addresses.as_slice(), ["10.0.0.5", "10.0.0.6"]);
}

#[tokio::test]
async fn test_address_resolution_fails_when_listing_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/traefik/services"))
        .respond_with(ResponseTemplate::new(403).set_body_json(status_failure(
            403,
            "Forbidden",
            "services is forbidden",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let result = AddressResolver::from_client(mock_client(&server))
        .resolve("app=traefik", "traefik")
        .await;

    assert!(matches!(result, Err(ResolutionError::ServiceList { .. })));
}
