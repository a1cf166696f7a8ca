use std::path::PathBuf;

use kube::config::KubeconfigError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Transform { source: tzinject_core::transform::Error },

    #[snafu(display("{source}"))]
    Webhook { source: crate::webhook::Error },

    #[snafu(display("{source}"))]
    ZoneInfo { source: crate::zoneinfo::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to initialize Kubernetes client, error: {source}"))]
    KubeConfig {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to read kubeconfig {}, error: {source}", path.display()))]
    ReadKubeconfig { path: PathBuf, source: KubeconfigError },

    #[snafu(display("Failed to load kubeconfig {}, error: {source}", path.display()))]
    LoadKubeconfig { path: PathBuf, source: KubeconfigError },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<tzinject_core::transform::Error> for Error {
    fn from(source: tzinject_core::transform::Error) -> Self { Self::Transform { source } }
}

impl From<crate::webhook::Error> for Error {
    fn from(source: crate::webhook::Error) -> Self { Self::Webhook { source } }
}

impl From<crate::zoneinfo::Error> for Error {
    fn from(source: crate::zoneinfo::Error) -> Self { Self::ZoneInfo { source } }
}
