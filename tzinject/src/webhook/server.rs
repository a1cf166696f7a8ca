//! TLS termination in front of the admission router.

use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{Router, extract::Request};
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use snafu::ResultExt;
use tokio::net::TcpListener;
use tokio_rustls::{
    TlsAcceptor,
    rustls::{
        ServerConfig,
        crypto::ring::default_provider,
        pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject},
        version::{TLS12, TLS13},
    },
};
use tower::ServiceExt;

use super::error::{self, Error};

pub struct TlsServer {
    config: ServerConfig,
    socket_address: SocketAddr,
    router: Router,
}

impl TlsServer {
    /// Loads the PEM encoded certificate chain and private key.
    ///
    /// # Errors
    ///
    /// Fails when either file cannot be read or parsed, or when the key does
    /// not match the certificate.
    pub async fn new(
        socket_address: SocketAddr,
        cert_file: &Path,
        key_file: &Path,
        router: Router,
    ) -> Result<Self, Error> {
        let cert_chain = {
            let pem = tokio::fs::read(cert_file)
                .await
                .with_context(|_| error::ReadTlsMaterialSnafu { path: cert_file.to_path_buf() })?;
            CertificateDer::pem_slice_iter(&pem).collect::<Result<Vec<_>, _>>().with_context(
                |_| error::ParseCertificateChainSnafu { path: cert_file.to_path_buf() },
            )?
        };
        let private_key = {
            let pem = tokio::fs::read(key_file)
                .await
                .with_context(|_| error::ReadTlsMaterialSnafu { path: key_file.to_path_buf() })?;
            PrivateKeyDer::from_pem_slice(&pem)
                .with_context(|_| error::ParsePrivateKeySnafu { path: key_file.to_path_buf() })?
        };

        let mut config = ServerConfig::builder_with_provider(default_provider().into())
            .with_protocol_versions(&[&TLS12, &TLS13])
            .context(error::SetSafeTlsProtocolVersionsSnafu)?
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .context(error::ConfigureCertificateSnafu)?;
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        Ok(Self { config, socket_address, router })
    }

    /// Accepts connections until `shutdown_signal` resolves.
    ///
    /// Every connection is handled on its own task; a failed handshake or
    /// connection only affects that connection.
    ///
    /// # Errors
    ///
    /// Fails when the listening socket cannot be bound.
    pub async fn serve(
        self,
        mut shutdown_signal: impl Future<Output = ()> + Send + Unpin + 'static,
    ) -> Result<(), Error> {
        let Self { config, socket_address, router } = self;
        let tls_acceptor = TlsAcceptor::from(Arc::new(config));
        let listener = TcpListener::bind(socket_address)
            .await
            .context(error::BindTcpListenerSnafu { socket_address })?;
        tracing::info!("Listening on {socket_address}");

        loop {
            let (tcp_stream, remote_address) = tokio::select! {
                () = &mut shutdown_signal => {
                    tracing::info!("Shutdown signal received, stop accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!("Failed to accept incoming TCP connection, error: {err}");
                        continue;
                    }
                },
            };

            let tls_acceptor = tls_acceptor.clone();
            let router = router.clone();
            let _handle = tokio::spawn(async move {
                let tls_stream = match tls_acceptor.accept(tcp_stream).await {
                    Ok(tls_stream) => tls_stream,
                    Err(err) => {
                        tracing::debug!(%remote_address, "TLS handshake failed, error: {err}");
                        return;
                    }
                };

                let service =
                    service_fn(move |request: Request<Incoming>| router.clone().oneshot(request));
                if let Err(err) = auto::Builder::new(TokioExecutor::new())
                    .serve_connection_with_upgrades(TokioIo::new(tls_stream), service)
                    .await
                {
                    tracing::warn!(%remote_address, "Failed to serve connection, error: {err}");
                }
            });
        }

        Ok(())
    }
}
