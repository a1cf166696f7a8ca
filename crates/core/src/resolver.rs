//! Layered resolution of the injection decision.
//!
//! Settings are looked up in an ordered list of annotation layers: the
//! workload object first, then its namespace (only when namespace annotations
//! are enabled), then the configured defaults. The first layer carrying a
//! value wins.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tzinject_base::consts::{self, k8s::annotations};

/// Annotations attached to an object or to a namespace.
pub type Annotations = BTreeMap<String, String>;

/// The global default layer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionDefaults {
    #[serde(default = "InjectionDefaults::default_timezone")]
    pub timezone: String,

    #[serde(default = "InjectionDefaults::default_strategy")]
    pub strategy: String,

    #[serde(default = "InjectionDefaults::default_inject_by_default")]
    pub inject_by_default: bool,

    #[serde(default = "InjectionDefaults::default_host_path_prefix")]
    pub host_path_prefix: String,

    #[serde(default = "InjectionDefaults::default_mount_path")]
    pub mount_path: String,

    #[serde(default = "InjectionDefaults::default_config_map_name")]
    pub config_map_name: String,
}

impl Default for InjectionDefaults {
    fn default() -> Self {
        Self {
            timezone: Self::default_timezone(),
            strategy: Self::default_strategy(),
            inject_by_default: Self::default_inject_by_default(),
            host_path_prefix: Self::default_host_path_prefix(),
            mount_path: Self::default_mount_path(),
            config_map_name: Self::default_config_map_name(),
        }
    }
}

impl InjectionDefaults {
    #[inline]
    #[must_use]
    pub fn default_timezone() -> String { consts::DEFAULT_TIMEZONE.to_string() }

    #[inline]
    #[must_use]
    pub fn default_strategy() -> String { consts::DEFAULT_STRATEGY.to_string() }

    #[inline]
    #[must_use]
    pub const fn default_inject_by_default() -> bool { true }

    #[inline]
    #[must_use]
    pub fn default_host_path_prefix() -> String { consts::DEFAULT_HOST_PATH_PREFIX.to_string() }

    #[inline]
    #[must_use]
    pub fn default_mount_path() -> String { consts::DEFAULT_MOUNT_PATH.to_string() }

    #[inline]
    #[must_use]
    pub fn default_config_map_name() -> String { consts::DEFAULT_CONFIG_MAP_NAME.to_string() }
}

/// The effective configuration for one object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InjectionConfig {
    /// Not validated; see [`crate::Strategy`].
    pub strategy: String,

    pub timezone: String,

    pub host_path_prefix: String,

    pub mount_path: String,

    pub config_map_name: String,
}

/// Why an object is left untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The object already carries the injected marker.
    AlreadyInjected,

    /// The object's `inject` annotation is `"false"`.
    ObjectOptOut,

    /// The namespace's `inject` annotation is `"false"` and the object has none.
    NamespaceOptOut,

    /// No `inject` annotation anywhere and injection by default is disabled.
    NotRequested,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AlreadyInjected => "already injected",
            Self::ObjectOptOut => "explicit object opt-out",
            Self::NamespaceOptOut => "namespace opt-out",
            Self::NotRequested => "no instruction and inject-by-default disabled",
        };
        f.write_str(reason)
    }
}

/// What to do with one object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Leave the object untouched.
    Skip(SkipReason),

    /// Inject with the resolved settings.
    Apply(InjectionConfig),
}

/// The layer a resolved setting came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    /// An annotation on the object itself.
    Object,

    /// An annotation on the object's namespace.
    Namespace,

    /// The configured default.
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self {
            Self::Object => "object",
            Self::Namespace => "namespace",
            Self::Default => "default",
        };
        f.write_str(source)
    }
}

struct Layers<'a> {
    layers: Vec<(Source, &'a Annotations)>,
}

impl<'a> Layers<'a> {
    fn new(object: &'a Annotations, namespace: Option<&'a Annotations>) -> Self {
        let layers = std::iter::once((Source::Object, object))
            .chain(namespace.map(|annotations| (Source::Namespace, annotations)))
            .collect();
        Self { layers }
    }

    /// First layer in which `key` carries a non-empty value.
    fn non_empty(&self, key: &str) -> Option<(Source, &'a str)> {
        self.layers.iter().find_map(|&(source, annotations)| {
            annotations
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| (source, value.as_str()))
        })
    }

    fn setting(&self, key: &str, default: &str, fallback: &str) -> (Source, String) {
        self.non_empty(key).map_or_else(
            || {
                let value = if default.is_empty() { fallback } else { default };
                (Source::Default, value.to_string())
            },
            |(source, value)| (source, value.to_string()),
        )
    }
}

/// Resolves whether and how an object should be injected.
///
/// `namespace` is `None` when namespace annotations are disabled, otherwise it
/// holds the annotations of the namespace the object lives in.
#[must_use]
pub fn resolve(
    object: &Annotations,
    namespace: Option<&Annotations>,
    defaults: &InjectionDefaults,
) -> Decision {
    if object.contains_key(annotations::INJECTED.as_str()) {
        return Decision::Skip(SkipReason::AlreadyInjected);
    }

    let layers = Layers::new(object, namespace);

    // The namespace layer can only opt out, opting in is up to the object.
    let inject = annotations::INJECT.as_str();
    let namespace_opt_out = namespace
        .and_then(|namespace| namespace.get(inject))
        .is_some_and(|value| value == consts::OPT_OUT_VALUE);
    match object.get(inject).map(String::as_str) {
        Some(consts::OPT_OUT_VALUE) => return Decision::Skip(SkipReason::ObjectOptOut),
        Some(_) => {}
        None if namespace_opt_out => return Decision::Skip(SkipReason::NamespaceOptOut),
        None if defaults.inject_by_default => {}
        None => return Decision::Skip(SkipReason::NotRequested),
    }

    let (timezone_source, timezone) = layers.setting(
        annotations::TIMEZONE.as_str(),
        &defaults.timezone,
        consts::DEFAULT_TIMEZONE,
    );
    let (strategy_source, strategy) = layers.setting(
        annotations::STRATEGY.as_str(),
        &defaults.strategy,
        consts::DEFAULT_STRATEGY,
    );

    tracing::debug!(
        %timezone,
        %timezone_source,
        %strategy,
        %strategy_source,
        "Resolved injection configuration"
    );

    Decision::Apply(InjectionConfig {
        strategy,
        timezone,
        host_path_prefix: defaults.host_path_prefix.clone(),
        mount_path: defaults.mount_path.clone(),
        config_map_name: defaults.config_map_name.clone(),
    })
}
