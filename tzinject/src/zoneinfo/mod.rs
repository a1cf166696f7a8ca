//! Seeds the ConfigMap holding TZif data into every served namespace.

mod error;

use std::{collections::BTreeMap, path::Path};

use k8s_openapi::{
    ByteString, api::core::v1::ConfigMap, apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{
    Api, Client,
    api::{PostParams, ResourceExt},
};
use snafu::ResultExt;
use tzinject_base::consts::k8s::labels;

pub use self::error::Error;

/// The regular files of a zoneinfo directory, keyed by file name.
#[derive(Clone, Debug, Default)]
pub struct ZoneInfoBundle {
    files: BTreeMap<String, ByteString>,
}

impl ZoneInfoBundle {
    /// Reads every regular file directly under `directory`.
    ///
    /// Subdirectories and files whose name is not valid UTF-8 are skipped.
    ///
    /// # Errors
    ///
    /// Fails when the directory or one of its files cannot be read.
    pub async fn load<P>(directory: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let directory = directory.as_ref();
        let mut entries = tokio::fs::read_dir(directory)
            .await
            .with_context(|_| error::ReadZoneInfoDirectorySnafu { path: directory.to_path_buf() })?;

        let mut files = BTreeMap::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|_| error::ReadZoneInfoDirectorySnafu { path: directory.to_path_buf() })?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .with_context(|_| error::ReadZoneInfoFileSnafu { path: path.clone() })?;
            if !file_type.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!("Skip zoneinfo file with non UTF-8 name {}", path.display());
                continue;
            };
            let data = tokio::fs::read(&path)
                .await
                .with_context(|_| error::ReadZoneInfoFileSnafu { path: path.clone() })?;
            let _unused = files.insert(name, ByteString(data));
        }

        tracing::debug!("Loaded {} zoneinfo files from {}", files.len(), directory.display());
        Ok(Self { files })
    }

    #[inline]
    pub fn len(&self) -> usize { self.files.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.files.is_empty() }

    /// Renders the bundle as a ConfigMap named `name` in `namespace`.
    pub fn config_map(&self, name: &str, namespace: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    labels::MANAGED_BY.to_string(),
                    tzinject_base::PROJECT_NAME.to_string(),
                )])),
                ..ObjectMeta::default()
            },
            binary_data: Some(self.files.clone()),
            ..ConfigMap::default()
        }
    }
}

/// Creates the ConfigMap `name` in each namespace where it does not exist yet.
///
/// Existing ConfigMaps are left untouched.
///
/// # Errors
///
/// Stops at the first namespace where the lookup or the creation fails.
pub async fn ensure_config_maps<I, S>(
    client: &Client,
    name: &str,
    namespaces: I,
    bundle: &ZoneInfoBundle,
) -> Result<(), Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for namespace in namespaces {
        let namespace = namespace.as_ref();
        let api = Api::<ConfigMap>::namespaced(client.clone(), namespace);

        let existing = api.get_opt(name).await.with_context(|_| error::GetConfigMapSnafu {
            name: name.to_string(),
            namespace: namespace.to_string(),
        })?;
        if existing.is_some() {
            tracing::info!("ConfigMap {name} already exists in namespace {namespace}");
            continue;
        }

        let created = api
            .create(&PostParams::default(), &bundle.config_map(name, namespace))
            .await
            .with_context(|_| error::CreateConfigMapSnafu {
                name: name.to_string(),
                namespace: namespace.to_string(),
            })?;
        tracing::info!(
            "Created ConfigMap {} with {} entries in namespace {namespace}",
            created.name_any(),
            bundle.len()
        );
    }
    Ok(())
}
