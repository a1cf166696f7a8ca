//! Command line interface of `tzinject`.
//!
//! ```bash
//! # Inject the timezone into manifests before applying them
//! tzinject inject -t Europe/Berlin deployment.yaml - < pods.yaml | kubectl apply -f -
//!
//! # Serve the admission webhook
//! tzinject webhook --tls-crt tls.crt --tls-key tls.key --namespaces default,jobs
//! ```

mod defaults;
pub mod error;
mod inject;
mod webhook;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::{CommandFactory, Parser, Subcommand};
use kube::config::{KubeConfigOptions, Kubeconfig};
use snafu::ResultExt;
use tokio::runtime::Runtime;
use tzinject_base::CLI_PROGRAM_NAME;

pub use self::error::Error;
use self::{defaults::DefaultsArgs, inject::InjectCommand, webhook::WebhookCommand};
use crate::{config::Config, shadow};

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Inject a consistent timezone into Kubernetes workloads.",
    long_about = "tzinject sets the TZ environment variable and mounts the matching zoneinfo \
                  file into every container of Pods, Deployments and StatefulSets, either \
                  offline on manifest files or online as a mutating admission webhook.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(
        long = "config",
        short = 'c',
        env = "TZINJECT_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/tzinject/config.yaml or \
                TZINJECT_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "TZINJECT_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(
        alias = "i",
        about = "Inject the timezone into manifest files and write them to standard output"
    )]
    Inject(InjectCommand),

    #[command(alias = "w", about = "Serve the mutating admission webhook")]
    Webhook(WebhookCommand),
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    fn load_config(
        config_file: Option<PathBuf>,
        log_level: Option<tracing::Level>,
    ) -> Result<Config, Error> {
        let mut config = Config::load_or_default(config_file)?;
        if let Some(log_level) = log_level {
            config.log.level = log_level;
        }
        Ok(config)
    }

    /// Dispatches to the selected subcommand and returns the exit code.
    ///
    /// # Errors
    ///
    /// Returns the error of the subcommand, or fails when the configuration
    /// cannot be loaded or the tokio runtime cannot be started.
    pub fn run(self) -> Result<i32, Error> {
        let Self { commands, config_file, log_level } = self;
        let client_version = Self::command().get_version().unwrap_or_default().to_string();

        let command = match commands {
            Some(Commands::Version { client: true }) => {
                let mut stdout = std::io::stdout();
                stdout
                    .write_all(Self::command().render_long_version().as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                stdout
                    .write_all(format!("Client Version: {client_version}\n").as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                std::io::stdout()
                    .write_all(Config::template_basic()?.as_slice())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Inject(cmd)) => {
                let config = Self::load_config(config_file, log_level)?;
                config.log.clone().without_stdout().registry();
                cmd.run(config)?;
                return Ok(0);
            }
            Some(command) => command,
            None => {
                let help = Self::command().render_long_help().ansi().to_string();
                std::io::stderr().write_all(help.as_bytes()).context(error::WriteStdoutSnafu)?;
                return Ok(-1);
            }
        };

        let config = Self::load_config(config_file, log_level)?;
        config.log.registry();

        let fut = async move {
            match command {
                Commands::Version { .. } => {
                    let kube_client = kube_client(config.webhook.kubeconfig.as_deref()).await?;
                    let server_version = kube_client.apiserver_version().await.map_or_else(
                        |_| "unknown".to_string(),
                        |info| format!("{}.{}", info.major, info.minor),
                    );
                    let info = format!(
                        "Client Version: {client_version}\nServer Version: {server_version}\n",
                    );
                    let mut stdout = std::io::stdout();
                    stdout
                        .write_all(Self::command().render_long_version().as_bytes())
                        .context(error::WriteStdoutSnafu)?;
                    stdout.write_all(info.as_bytes()).context(error::WriteStdoutSnafu)?;
                }
                Commands::Webhook(cmd) => cmd.run(config).await?,
                Commands::Completions { .. } | Commands::DefaultConfig | Commands::Inject(_) => {}
            }
            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}

/// Builds a client from `kubeconfig`, or from the in-cluster environment and
/// the default kubeconfig when no path is given.
async fn kube_client(kubeconfig: Option<&Path>) -> Result<kube::Client, Error> {
    let Some(path) = kubeconfig else {
        return kube::Client::try_default().await.context(error::KubeConfigSnafu);
    };
    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|_| error::ReadKubeconfigSnafu { path: path.to_path_buf() })?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .with_context(|_| error::LoadKubeconfigSnafu { path: path.to_path_buf() })?;
    kube::Client::try_from(config).context(error::KubeConfigSnafu)
}
