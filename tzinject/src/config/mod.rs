mod error;
mod log;
mod webhook;

use std::path::{Path, PathBuf};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tzinject_core::InjectionDefaults;

pub use self::{error::Error, log::LogConfig, webhook::WebhookConfig};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub defaults: InjectionDefaults,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// The default configuration rendered as YAML.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot be serialized.
    pub fn template_basic() -> Result<Vec<u8>, Error> {
        serde_yaml::to_string(&Self::default())
            .map(String::into_bytes)
            .context(error::SerializeConfigSnafu)
    }

    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(tzinject_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(tzinject_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [
            tzinject_base::PROJECT_CONFIG_DIR.to_path_buf(),
            PathBuf::from(tzinject_base::CLI_CONFIG_NAME),
        ]
        .into_iter()
        .collect()
    }

    /// Loads the file given on the command line, or the first default
    /// location that exists. Without either the built-in defaults are used.
    ///
    /// # Errors
    ///
    /// Fails when the selected file cannot be read or parsed.
    pub fn load_or_default(explicit: Option<PathBuf>) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Self::search_config_file_path();
        if path.try_exists().unwrap_or(false) {
            Self::load(path)
        } else {
            tracing::debug!("No configuration file found, using built-in defaults");
            Ok(Self::default())
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path = resolve(path.as_ref())?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = config.log.file_path.as_deref().map(resolve).transpose()?;
        config.webhook.tls_cert_file = resolve(&config.webhook.tls_cert_file)?;
        config.webhook.tls_key_file = resolve(&config.webhook.tls_key_file)?;
        config.webhook.kubeconfig = config.webhook.kubeconfig.as_deref().map(resolve).transpose()?;

        Ok(config)
    }
}

fn resolve(path: &Path) -> Result<PathBuf, Error> {
    path.try_resolve()
        .map(|path| path.to_path_buf())
        .with_context(|_| error::ResolveFilePathSnafu { file_path: path.to_path_buf() })
}
