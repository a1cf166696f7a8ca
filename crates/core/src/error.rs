use snafu::Snafu;

/// Errors raised while generating patches for a workload.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The resolved strategy is neither `hostPath` nor `configmap`.
    #[snafu(display("Unknown injection strategy specified: {strategy}"))]
    UnknownStrategy { strategy: String },

    /// The object discriminator could not be read.
    #[snafu(display("Failed to read the kind of the object, error: {source}"))]
    DetectKind { source: serde_json::Error },

    /// The object carries a supported `kind` but does not match its schema.
    #[snafu(display("Failed to decode object of kind {kind}, error: {source}"))]
    DecodeResource { kind: &'static str, source: serde_json::Error },
}
