use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read input {input}, error: {source}"))]
    ReadInput { input: String, source: std::io::Error },

    #[snafu(display("Failed to parse document {document} of input {input}, error: {source}"))]
    ParseDocument { input: String, document: usize, source: serde_yaml::Error },

    #[snafu(display(
        "Failed to generate patch for document {document} of input {input}, error: {source}"
    ))]
    GeneratePatch { input: String, document: usize, source: crate::Error },

    #[snafu(display(
        "Failed to apply patch to document {document} of input {input}, error: {source}"
    ))]
    ApplyPatch { input: String, document: usize, source: json_patch::PatchError },

    #[snafu(display("Failed to render document {document} of input {input}, error: {source}"))]
    RenderDocument { input: String, document: usize, source: serde_yaml::Error },

    #[snafu(display("Failed to write to output stream, error: {source}"))]
    WriteOutput { source: std::io::Error },

    #[snafu(display("Failed to write to diagnostics stream, error: {source}"))]
    WriteDiagnostics { source: std::io::Error },
}
