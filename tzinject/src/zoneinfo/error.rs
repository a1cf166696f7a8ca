use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read zoneinfo directory {}, error: {source}", path.display()))]
    ReadZoneInfoDirectory { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to read zoneinfo file {}, error: {source}", path.display()))]
    ReadZoneInfoFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to get ConfigMap {name} in namespace {namespace}, error: {source}"))]
    GetConfigMap {
        name: String,
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to create ConfigMap {name} in namespace {namespace}, error: {source}"))]
    CreateConfigMap {
        name: String,
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },
}
