use std::{net::SocketAddr, path::PathBuf};

use snafu::Snafu;
use tokio_rustls::rustls::{self, pki_types::pem};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read TLS material from {}, error: {source}", path.display()))]
    ReadTlsMaterial { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to parse certificate chain from {}, error: {source}", path.display()))]
    ParseCertificateChain { path: PathBuf, source: pem::Error },

    #[snafu(display("Failed to parse private key from {}, error: {source}", path.display()))]
    ParsePrivateKey { path: PathBuf, source: pem::Error },

    #[snafu(display("Failed to set safe TLS protocol versions, error: {source}"))]
    SetSafeTlsProtocolVersions { source: rustls::Error },

    #[snafu(display("Failed to configure server certificate, error: {source}"))]
    ConfigureCertificate { source: rustls::Error },

    #[snafu(display("Failed to bind TCP socket {socket_address}, error: {source}"))]
    BindTcpListener { socket_address: SocketAddr, source: std::io::Error },

    #[snafu(display("Failed to lookup namespace {namespace}, error: {source}"))]
    LookupNamespace {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to convert admitted object, error: {source}"))]
    ConvertObject { source: serde_json::Error },

    #[snafu(display("Failed to generate patch, error: {source}"))]
    GeneratePatch { source: tzinject_core::Error },

    #[snafu(display("Failed to serialize patch, error: {source}"))]
    SerializePatch { source: kube::core::admission::SerializePatchError },
}
