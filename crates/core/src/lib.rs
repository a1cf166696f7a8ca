//! The timezone injection engine.
//!
//! [`Resource::classify`] turns a structural object into one of the supported
//! workload shapes, [`Injector::generate`] resolves the layered configuration
//! for it and builds the JSON patch, and [`transform::Transformer`] drives the
//! same pipeline over YAML streams.

mod error;
mod injector;
mod patch;
pub mod pointer;
pub mod resolver;
pub mod resource;
mod strategy;
pub mod transform;

pub use self::{
    error::Error,
    injector::Injector,
    patch::PatchBuilder,
    resolver::{
        Annotations, Decision, InjectionConfig, InjectionDefaults, SkipReason, Source, resolve,
    },
    resource::{Kind, Resource, ResourceList},
    strategy::{ParseStrategyError, Strategy},
};
