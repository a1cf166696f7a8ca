//! Classification of decoded objects into the workload shapes that can be
//! patched.
//!
//! Decoding happens in two phases. [`Kind::detect`] reads nothing but the
//! `kind` discriminator, and only a supported kind is handed to
//! [`Kind::decode`] for a full decode into its `k8s-openapi` type. Anything
//! else is reported as unrecognized rather than as an error.

mod list;

use json_patch::jsonptr::{Pointer, PointerBuf};
use k8s_openapi::{
    api::{
        apps::v1::{Deployment, StatefulSet},
        core::v1::{Container, Pod, PodSpec, PodTemplateSpec},
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use serde::Deserialize;
use serde_json::Value;
use snafu::ResultExt;

pub use self::list::ResourceList;
use crate::{
    error::{self, Error},
    pointer,
    resolver::Annotations,
};

/// Supported values of the `kind` discriminator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Pod,
    Deployment,
    StatefulSet,
    List,
}

#[derive(Deserialize)]
struct KindField {
    #[serde(default)]
    kind: String,
}

impl Kind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::List => "List",
        }
    }

    /// Reads the discriminator of `object`.
    ///
    /// Returns `None` for non-mapping values, a missing `kind` and kinds that
    /// are not handled.
    ///
    /// # Errors
    ///
    /// Fails when `kind` is present but is not a string.
    pub fn detect(object: &Value) -> Result<Option<Self>, Error> {
        if !object.is_object() {
            return Ok(None);
        }
        let KindField { kind } = KindField::deserialize(object).context(error::DetectKindSnafu)?;
        Ok(match kind.as_str() {
            "Pod" => Some(Self::Pod),
            "Deployment" => Some(Self::Deployment),
            "StatefulSet" => Some(Self::StatefulSet),
            "List" => Some(Self::List),
            _ => None,
        })
    }

    /// Fully decodes `object` as this kind.
    ///
    /// # Errors
    ///
    /// Fails when `object` does not match the schema of the kind.
    pub fn decode(self, object: &Value) -> Result<Resource, Error> {
        let resource = match self {
            Self::Pod => Pod::deserialize(object).map(|pod| Resource::Pod(Box::new(pod))),
            Self::Deployment => Deployment::deserialize(object)
                .map(|deployment| Resource::Deployment(Box::new(deployment))),
            Self::StatefulSet => StatefulSet::deserialize(object)
                .map(|stateful_set| Resource::StatefulSet(Box::new(stateful_set))),
            Self::List => ResourceList::deserialize(object).map(Resource::List),
        };
        resource.context(error::DecodeResourceSnafu { kind: self.as_str() })
    }
}

/// A decoded object of a supported kind.
#[derive(Clone, Debug)]
pub enum Resource {
    Pod(Box<Pod>),
    Deployment(Box<Deployment>),
    StatefulSet(Box<StatefulSet>),
    List(ResourceList),
}

impl Resource {
    /// Detects and decodes `object`, `None` meaning unrecognized.
    ///
    /// # Errors
    ///
    /// See [`Kind::detect`] and [`Kind::decode`].
    pub fn classify(object: &Value) -> Result<Option<Self>, Error> {
        Kind::detect(object)?.map(|kind| kind.decode(object)).transpose()
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Pod(_) => Kind::Pod,
            Self::Deployment(_) => Kind::Deployment,
            Self::StatefulSet(_) => Kind::StatefulSet,
            Self::List(_) => Kind::List,
        }
    }

    /// Locates the mutable regions of the object, with every path rooted at
    /// `prefix`.
    #[must_use]
    pub fn locate(&self, prefix: &Pointer) -> Located<'_> {
        match self {
            Self::Pod(pod) => Located::Workload(Workload {
                region: PodRegion {
                    path: pointer::join(prefix, ["spec"]),
                    spec: pod.spec.as_ref(),
                },
                targets: vec![MetadataTarget {
                    path: pointer::join(prefix, ["metadata"]),
                    metadata: decoded_metadata(&pod.metadata),
                }],
            }),
            Self::Deployment(deployment) => Located::Workload(Workload::controller(
                prefix,
                &deployment.metadata,
                deployment.spec.as_ref().map(|spec| &spec.template),
            )),
            Self::StatefulSet(stateful_set) => Located::Workload(Workload::controller(
                prefix,
                &stateful_set.metadata,
                stateful_set.spec.as_ref().map(|spec| &spec.template),
            )),
            Self::List(list) => Located::List(list),
        }
    }
}

/// `ObjectMeta` is not optional once decoded, so a document without
/// `metadata` decodes to the default value. Treat that value as absent; adding
/// `{}` over an existing empty mapping leaves the document unchanged.
fn decoded_metadata(metadata: &ObjectMeta) -> Option<&ObjectMeta> {
    (*metadata != ObjectMeta::default()).then_some(metadata)
}

/// Where the patch for a decoded object has to be generated.
pub enum Located<'a> {
    /// A pod-shaped object.
    Workload(Workload<'a>),
    /// A list whose items are handled one by one.
    List(&'a ResourceList),
}

/// The pod spec that receives volumes, mounts and environment variables.
#[derive(Clone, Debug)]
pub struct PodRegion<'a> {
    pub path: PointerBuf,
    pub spec: Option<&'a PodSpec>,
}

impl PodRegion<'_> {
    #[must_use]
    pub fn containers(&self) -> &[Container] {
        self.spec.map_or(&[], |spec| spec.containers.as_slice())
    }

    #[must_use]
    pub fn has_volumes(&self) -> bool {
        self.spec.and_then(|spec| spec.volumes.as_ref()).is_some_and(|volumes| !volumes.is_empty())
    }
}

/// Metadata that receives the marker annotations.
#[derive(Clone, Debug)]
pub struct MetadataTarget<'a> {
    pub path: PointerBuf,
    pub metadata: Option<&'a ObjectMeta>,
}

impl MetadataTarget<'_> {
    #[must_use]
    pub fn has_annotations(&self) -> bool {
        self.metadata
            .and_then(|metadata| metadata.annotations.as_ref())
            .is_some_and(|annotations| !annotations.is_empty())
    }
}

/// A pod-shaped object: one pod spec and its metadata targets, object
/// metadata first.
#[derive(Clone, Debug)]
pub struct Workload<'a> {
    pub region: PodRegion<'a>,
    pub targets: Vec<MetadataTarget<'a>>,
}

impl<'a> Workload<'a> {
    fn controller(
        prefix: &Pointer,
        metadata: &'a ObjectMeta,
        template: Option<&'a PodTemplateSpec>,
    ) -> Self {
        let template_path = pointer::join(prefix, ["spec", "template"]);
        Self {
            region: PodRegion {
                path: pointer::join(&template_path, ["spec"]),
                spec: template.and_then(|template| template.spec.as_ref()),
            },
            targets: vec![
                MetadataTarget {
                    path: pointer::join(prefix, ["metadata"]),
                    metadata: decoded_metadata(metadata),
                },
                MetadataTarget {
                    path: pointer::join(&template_path, ["metadata"]),
                    metadata: template.and_then(|template| template.metadata.as_ref()),
                },
            ],
        }
    }

    /// Annotations used to resolve the decision.
    ///
    /// For controller kinds this is the union of the template and top-level
    /// annotations, top-level values winning.
    #[must_use]
    pub fn annotations(&self) -> Annotations {
        self.targets
            .iter()
            .rev()
            .filter_map(|target| target.metadata?.annotations.as_ref())
            .flatten()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn workload(resource: &Resource) -> Workload<'_> {
        match resource.locate(Pointer::root()) {
            Located::Workload(workload) => workload,
            Located::List(_) => panic!("expected a workload"),
        }
    }

    #[test]
    fn test_detect_unrecognized() {
        assert_eq!(Kind::detect(&json!({"kind": "Service"})).unwrap(), None);
        assert_eq!(Kind::detect(&json!({"apiVersion": "v1"})).unwrap(), None);
        assert_eq!(Kind::detect(&json!(["Pod"])).unwrap(), None);
        assert_eq!(Kind::detect(&json!("Pod")).unwrap(), None);
        assert_eq!(Kind::detect(&Value::Null).unwrap(), None);
    }

    #[test]
    fn test_detect_rejects_non_string_kind() {
        assert!(Kind::detect(&json!({"kind": 7})).is_err());
    }

    #[test]
    fn test_decode_failure_names_kind() {
        let err = Resource::classify(&json!({"kind": "Pod", "spec": {"containers": "nope"}}))
            .unwrap_err();
        assert!(matches!(err, Error::DecodeResource { kind: "Pod", .. }));
    }

    #[test]
    fn test_locate_pod() {
        let resource = Resource::classify(&json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "web"},
            "spec": {"containers": [{"name": "web", "image": "nginx"}]}
        }))
        .unwrap()
        .unwrap();
        assert_eq!(resource.kind(), Kind::Pod);

        let workload = workload(&resource);
        assert_eq!(workload.region.path.as_str(), "/spec");
        assert_eq!(workload.region.containers().len(), 1);
        assert!(!workload.region.has_volumes());
        assert_eq!(workload.targets.len(), 1);
        assert_eq!(workload.targets[0].path.as_str(), "/metadata");
        assert!(!workload.targets[0].has_annotations());
    }

    #[test]
    fn test_locate_deployment_with_prefix() {
        let resource = Resource::classify(&json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web"},
            "spec": {
                "selector": {"matchLabels": {"app": "web"}},
                "template": {
                    "spec": {
                        "containers": [{"name": "web"}],
                        "volumes": [{"name": "data", "emptyDir": {}}]
                    }
                }
            }
        }))
        .unwrap()
        .unwrap();
        let prefix = pointer::join(Pointer::root(), ["items", "3"]);

        let Located::Workload(workload) = resource.locate(&prefix) else {
            panic!("expected a workload");
        };
        assert_eq!(workload.region.path.as_str(), "/items/3/spec/template/spec");
        assert!(workload.region.has_volumes());
        let paths: Vec<_> = workload.targets.iter().map(|target| target.path.as_str()).collect();
        assert_eq!(paths, ["/items/3/metadata", "/items/3/spec/template/metadata"]);
        assert!(workload.targets[1].metadata.is_none());
    }

    #[test]
    fn test_controller_annotations_prefer_top_level() {
        let resource = Resource::classify(&json!({
            "apiVersion": "apps/v1",
            "kind": "StatefulSet",
            "metadata": {"name": "db", "annotations": {"a": "top", "b": "top"}},
            "spec": {
                "selector": {},
                "serviceName": "db",
                "template": {
                    "metadata": {"annotations": {"b": "template", "c": "template"}},
                    "spec": {"containers": []}
                }
            }
        }))
        .unwrap()
        .unwrap();

        let annotations = workload(&resource).annotations();
        assert_eq!(annotations.get("a").map(String::as_str), Some("top"));
        assert_eq!(annotations.get("b").map(String::as_str), Some("top"));
        assert_eq!(annotations.get("c").map(String::as_str), Some("template"));
    }

    #[test]
    fn test_locate_list() {
        let resource = Resource::classify(&json!({"apiVersion": "v1", "kind": "List", "items": []}))
            .unwrap()
            .unwrap();
        assert!(matches!(
            resource.locate(Pointer::root()),
            Located::List(list) if list.items.is_empty()
        ));
    }
}
