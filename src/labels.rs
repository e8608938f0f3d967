// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label and annotation keys understood by the controller.
//!
//! These keys are the whole contract between route authors and traefik2dns:
//! two external-dns hostname annotations on `IngressRoute`s and one ownership marker.

// ============================================================================
// external-dns Annotations
// ============================================================================

/// Primary hostname annotation. When present and non-empty its value is authoritative.
pub const INTERNAL_HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/internal-hostname";

/// Fallback hostname annotation, consulted only when the internal one is absent or empty
pub const HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/hostname";

/// Separator between hostnames inside a single annotation value
pub const HOSTNAME_SEPARATOR: char = ',';

// ============================================================================
// Ownership Marker
// ============================================================================

/// Key of the ownership marker, used both as label and as annotation
pub const MANAGED_BY: &str = "managed-by";
