//! Patch generation for one pod-shaped region.
//!
//! Operations append with the `-` token, so an empty or absent list is
//! initialised with `[]` first and every later operation relies on the ones
//! before it having been applied.

use json_patch::{AddOperation, Patch, PatchOperation, jsonptr::PointerBuf};
use serde_json::{Value, json};
use tzinject_base::consts::{self, k8s::annotations};

use crate::{
    error::{self, Error},
    pointer::{self, APPEND},
    resolver::InjectionConfig,
    resource::{MetadataTarget, PodRegion},
    strategy::Strategy,
};

fn add(path: PointerBuf, value: Value) -> PatchOperation {
    PatchOperation::Add(AddOperation { path, value })
}

fn container_field(region: &PodRegion<'_>, index: usize, field: &str) -> PointerBuf {
    pointer::join(&region.path, ["containers", index.to_string().as_str(), field])
}

pub struct PatchBuilder<'a> {
    config: &'a InjectionConfig,
    operations: Vec<PatchOperation>,
}

impl<'a> PatchBuilder<'a> {
    #[must_use]
    pub const fn new(config: &'a InjectionConfig) -> Self {
        Self { config, operations: Vec::new() }
    }
}

impl PatchBuilder<'_> {
    /// Builds the operations injecting the timezone into `region` and
    /// marking every target.
    ///
    /// A region without containers yields an empty patch.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownStrategy`] when the resolved strategy is not
    /// supported; no operation is returned in that case.
    pub fn build(
        mut self,
        region: &PodRegion<'_>,
        targets: &[MetadataTarget<'_>],
    ) -> Result<Patch, Error> {
        if region.containers().is_empty() {
            return Ok(Patch(Vec::new()));
        }

        let Ok(strategy) = self.config.strategy.parse::<Strategy>() else {
            return error::UnknownStrategySnafu { strategy: self.config.strategy.clone() }.fail();
        };
        match strategy {
            Strategy::HostPath => self.host_path(region),
            Strategy::ConfigMap => self.config_map(region),
        }
        self.environment(region);
        for target in targets {
            self.markers(target);
        }

        Ok(Patch(self.operations))
    }

    fn push(&mut self, path: PointerBuf, value: Value) { self.operations.push(add(path, value)); }

    fn host_path(&mut self, region: &PodRegion<'_>) {
        let config = self.config;
        for (index, container) in region.containers().iter().enumerate() {
            let mounts = container_field(region, index, "volumeMounts");
            if container.volume_mounts.as_ref().is_none_or(Vec::is_empty) {
                self.push(mounts.clone(), json!([]));
            }
            self.push(
                pointer::join(&mounts, [APPEND]),
                json!({
                    "name": consts::HOST_PATH_VOLUME_NAME,
                    "mountPath": config.mount_path,
                    "subPath": config.timezone,
                    "readOnly": true,
                }),
            );
            self.push(
                pointer::join(&mounts, [APPEND]),
                json!({
                    "name": consts::HOST_PATH_VOLUME_NAME,
                    "mountPath": config.host_path_prefix,
                    "readOnly": true,
                }),
            );
        }

        let volumes = pointer::join(&region.path, ["volumes"]);
        if !region.has_volumes() {
            self.push(volumes.clone(), json!([]));
        }
        self.push(
            pointer::join(&volumes, [APPEND]),
            json!({
                "name": consts::HOST_PATH_VOLUME_NAME,
                "hostPath": {"path": config.host_path_prefix},
            }),
        );
    }

    fn config_map(&mut self, region: &PodRegion<'_>) {
        let config = self.config;
        let volumes = pointer::join(&region.path, ["volumes"]);
        if !region.has_volumes() {
            self.push(volumes.clone(), json!([]));
        }
        self.push(
            pointer::join(&volumes, [APPEND]),
            json!({
                "name": consts::CONFIG_MAP_VOLUME_NAME,
                "configMap": {"name": config.config_map_name},
            }),
        );

        // ConfigMap keys are flat file names
        let file_name = config.timezone.rsplit('/').next().unwrap_or(config.timezone.as_str());
        for (index, container) in region.containers().iter().enumerate() {
            let mounts = container_field(region, index, "volumeMounts");
            if container.volume_mounts.as_ref().is_none_or(Vec::is_empty) {
                self.push(mounts.clone(), json!([]));
            }
            self.push(
                pointer::join(&mounts, [APPEND]),
                json!({
                    "name": consts::CONFIG_MAP_VOLUME_NAME,
                    "mountPath": config.mount_path,
                    "subPath": file_name,
                    "readOnly": true,
                }),
            );
        }
    }

    fn environment(&mut self, region: &PodRegion<'_>) {
        let config = self.config;
        for (index, container) in region.containers().iter().enumerate() {
            let env = container_field(region, index, "env");
            if container.env.as_ref().is_none_or(Vec::is_empty) {
                self.push(env.clone(), json!([]));
            }
            self.push(
                pointer::join(&env, [APPEND]),
                json!({"name": consts::TIMEZONE_ENV_VAR, "value": config.timezone}),
            );
        }
    }

    fn markers(&mut self, target: &MetadataTarget<'_>) {
        let config = self.config;
        if target.metadata.is_none() {
            self.push(target.path.clone(), json!({}));
        }
        let annotations_path = pointer::join(&target.path, ["annotations"]);
        if !target.has_annotations() {
            self.push(annotations_path.clone(), json!({}));
        }
        self.push(
            pointer::join(&annotations_path, [annotations::INJECTED.as_str()]),
            json!(consts::INJECTED_MARKER_VALUE),
        );
        self.push(
            pointer::join(&annotations_path, [annotations::TIMEZONE.as_str()]),
            json!(config.timezone),
        );
    }
}
