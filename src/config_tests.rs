// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::ControllerConfig;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_command_definition_is_valid() {
        ControllerConfig::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ControllerConfig::try_parse_from([
            "traefik2dns",
            "--traefik-label",
            "app=ingress",
            "--traefik-namespace",
            "ingress-system",
            "--metrics-bind-address",
            "127.0.0.1:9090",
            "--event-buffer",
            "16",
        ])
        .unwrap();

        assert_eq!(config.traefik_label, "app=ingress");
        assert_eq!(config.traefik_namespace, "ingress-system");
        assert_eq!(config.metrics_bind_address.to_string(), "127.0.0.1:9090");
        assert_eq!(config.event_buffer.get(), 16);
    }

    #[test]
    fn test_zero_event_buffer_is_rejected() {
        assert!(ControllerConfig::try_parse_from(["traefik2dns", "--event-buffer", "0"]).is_err());
    }

    #[test]
    fn test_invalid_bind_address_is_rejected() {
        assert!(ControllerConfig::try_parse_from([
            "traefik2dns",
            "--metrics-bind-address",
            "not-an-address"
        ])
        .is_err());
    }

    #[test]
    fn test_environment_names_are_advertised() {
        let help = ControllerConfig::command().render_long_help().to_string();

        assert!(help.contains("TRAEFIK_LABEL"));
        assert!(help.contains("TRAEFIK_NAMESPACE"));
    }
}
