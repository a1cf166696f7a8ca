use json_patch::{Patch, jsonptr::Pointer};

use crate::{
    error::Error,
    patch::PatchBuilder,
    resolver::{self, Annotations, Decision, InjectionDefaults},
    resource::{Located, Resource},
};

/// Turns classified objects into patches under one set of defaults.
#[derive(Clone, Copy, Debug)]
pub struct Injector<'a> {
    defaults: &'a InjectionDefaults,
    namespace: Option<&'a Annotations>,
}

impl<'a> Injector<'a> {
    /// Creates an injector that ignores namespace annotations.
    #[must_use]
    pub const fn new(defaults: &'a InjectionDefaults) -> Self { Self { defaults, namespace: None } }

    /// Enables the namespace layer with already-fetched annotations.
    #[must_use]
    pub const fn with_namespace(mut self, namespace: &'a Annotations) -> Self {
        self.namespace = Some(namespace);
        self
    }
}

impl Injector<'_> {
    /// Generates the patch for `resource`, every path rooted at `prefix`.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported strategy or on a list item that cannot be
    /// decoded.
    pub fn generate(&self, resource: &Resource, prefix: &Pointer) -> Result<Patch, Error> {
        let workload = match resource.locate(prefix) {
            Located::Workload(workload) => workload,
            Located::List(list) => return list.expand(self, prefix),
        };

        match resolver::resolve(&workload.annotations(), self.namespace, self.defaults) {
            Decision::Skip(reason) => {
                tracing::debug!(
                    kind = resource.kind().as_str(),
                    %prefix,
                    "Skip injection, {reason}"
                );
                Ok(Patch(Vec::new()))
            }
            Decision::Apply(config) => {
                PatchBuilder::new(&config).build(&workload.region, &workload.targets)
            }
        }
    }
}
