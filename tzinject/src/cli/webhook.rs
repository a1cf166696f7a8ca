use std::{net::SocketAddr, path::PathBuf};

use clap::Args;
use k8s_openapi::api::core::v1::Namespace;
use kube::Api;
use sigfinn::{ExitStatus, LifecycleManager};

use super::{DefaultsArgs, Error};
use crate::{
    config::Config,
    webhook::{self, AdmissionState, NamespaceFilter, TlsServer},
    zoneinfo::{self, ZoneInfoBundle},
};

/// Serves the mutating admission webhook over TLS.
#[derive(Args, Clone)]
pub struct WebhookCommand {
    #[command(flatten)]
    defaults: DefaultsArgs,

    #[arg(long = "addr", help = "Socket address to listen on. Defaults to 0.0.0.0:8443.")]
    listen_address: Option<SocketAddr>,

    #[arg(long = "tls-crt", help = "PEM encoded TLS certificate chain.")]
    tls_cert_file: Option<PathBuf>,

    #[arg(long = "tls-key", help = "PEM encoded TLS private key.")]
    tls_key_file: Option<PathBuf>,

    #[arg(
        long = "namespaces",
        value_delimiter = ',',
        help = "Comma separated namespaces served by the webhook. kube-system and kube-public \
                are never served."
    )]
    namespaces: Option<Vec<String>>,

    #[arg(
        long = "inject-namespace-annotation",
        help = "Take the annotations of the namespace into account when resolving a workload."
    )]
    inject_namespace_annotation: bool,

    #[arg(
        long = "zoneinfo-dir",
        help = "Directory holding the TZif files published in the zoneinfo ConfigMap."
    )]
    zoneinfo_directory: Option<PathBuf>,

    #[arg(long = "kubeconfig", help = "Path to a kubeconfig file.")]
    kubeconfig: Option<PathBuf>,
}

impl WebhookCommand {
    /// Seeds the zoneinfo ConfigMaps, then serves admission requests until
    /// SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Fails when the cluster cannot be reached, the ConfigMaps cannot be
    /// created, the TLS material is invalid or the listener cannot be bound.
    pub async fn run(self, config: Config) -> Result<(), Error> {
        let Self {
            defaults: overrides,
            listen_address,
            tls_cert_file,
            tls_key_file,
            namespaces,
            inject_namespace_annotation,
            zoneinfo_directory,
            kubeconfig,
        } = self;

        let Config { mut defaults, webhook: mut settings, .. } = config;
        overrides.apply(&mut defaults);
        settings.listen_address = listen_address.unwrap_or(settings.listen_address);
        settings.tls_cert_file = tls_cert_file.unwrap_or(settings.tls_cert_file);
        settings.tls_key_file = tls_key_file.unwrap_or(settings.tls_key_file);
        settings.namespaces = namespaces.unwrap_or(settings.namespaces);
        settings.inject_namespace_annotation |= inject_namespace_annotation;
        settings.zoneinfo_directory = zoneinfo_directory.unwrap_or(settings.zoneinfo_directory);
        settings.kubeconfig = kubeconfig.or(settings.kubeconfig);

        let kube_client = super::kube_client(settings.kubeconfig.as_deref()).await?;
        let filter = NamespaceFilter::new(&settings.namespaces);

        let bundle = ZoneInfoBundle::load(&settings.zoneinfo_directory).await?;
        if bundle.is_empty() {
            tracing::warn!(
                "No zoneinfo file found in {}, the configmap strategy will mount nothing",
                settings.zoneinfo_directory.display()
            );
        }
        zoneinfo::ensure_config_maps(
            &kube_client,
            &defaults.config_map_name,
            filter.namespaces(),
            &bundle,
        )
        .await?;

        let namespaces =
            settings.inject_namespace_annotation.then(|| Api::<Namespace>::all(kube_client));
        let state = AdmissionState::new(defaults, filter, namespaces);
        let server = TlsServer::new(
            settings.listen_address,
            &settings.tls_cert_file,
            &settings.tls_key_file,
            webhook::router(state),
        )
        .await?;

        let lifecycle_manager = LifecycleManager::<Error>::new();
        let _handle = lifecycle_manager.spawn("webhook-server", move |shutdown_signal| async move {
            match server.serve(shutdown_signal).await {
                Ok(()) => ExitStatus::Success,
                Err(err) => ExitStatus::Error(Error::from(err)),
            }
        });

        tracing::info!("Webhook listening on {}", settings.listen_address);

        if let Ok(Err(err)) = lifecycle_manager.serve().await {
            tracing::error!("{err}");
            Err(err)
        } else {
            Ok(())
        }
    }
}
