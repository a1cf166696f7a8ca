use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use tzinject_base::consts;

/// Settings of the `webhook` command.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default = "WebhookConfig::default_listen_address")]
    pub listen_address: SocketAddr,

    /// PEM encoded certificate chain.
    #[serde(default = "WebhookConfig::default_tls_cert_file")]
    pub tls_cert_file: PathBuf,

    /// PEM encoded private key.
    #[serde(default = "WebhookConfig::default_tls_key_file")]
    pub tls_key_file: PathBuf,

    /// Namespaces served by the webhook and seeded with the zoneinfo
    /// ConfigMap. Empty means every namespace but the system ones.
    #[serde(default = "WebhookConfig::default_namespaces")]
    pub namespaces: Vec<String>,

    /// Whether namespace annotations take part in the resolution.
    #[serde(default)]
    pub inject_namespace_annotation: bool,

    /// Directory holding the TZif files published in the zoneinfo ConfigMap.
    #[serde(default = "WebhookConfig::default_zoneinfo_directory")]
    pub zoneinfo_directory: PathBuf,

    /// Falls back to the in-cluster configuration, then to the default
    /// kubeconfig, when unset.
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen_address: Self::default_listen_address(),
            tls_cert_file: Self::default_tls_cert_file(),
            tls_key_file: Self::default_tls_key_file(),
            namespaces: Self::default_namespaces(),
            inject_namespace_annotation: false,
            zoneinfo_directory: Self::default_zoneinfo_directory(),
            kubeconfig: None,
        }
    }
}

impl WebhookConfig {
    #[inline]
    #[must_use]
    pub const fn default_listen_address() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), consts::DEFAULT_WEBHOOK_PORT)
    }

    #[inline]
    #[must_use]
    pub fn default_tls_cert_file() -> PathBuf { PathBuf::from(consts::DEFAULT_TLS_CERT_FILE) }

    #[inline]
    #[must_use]
    pub fn default_tls_key_file() -> PathBuf { PathBuf::from(consts::DEFAULT_TLS_KEY_FILE) }

    #[inline]
    #[must_use]
    pub fn default_namespaces() -> Vec<String> {
        vec![consts::k8s::namespaces::DEFAULT.to_string()]
    }

    #[inline]
    #[must_use]
    pub fn default_zoneinfo_directory() -> PathBuf {
        PathBuf::from(consts::DEFAULT_ZONEINFO_DIRECTORY)
    }
}
