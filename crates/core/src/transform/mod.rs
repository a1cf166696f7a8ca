//! Offline injection over multi-document YAML streams.

mod error;
mod reader;

use std::{
    fmt,
    io::{Read, Write},
    path::PathBuf,
};

use json_patch::jsonptr::Pointer;
use serde_json::Value;
use snafu::ResultExt;

pub use self::{
    error::Error,
    reader::{DocumentReader, is_comment_only},
};
use crate::{injector::Injector, resource::Resource};

/// Marks the start of every document but the first in the output stream.
pub const DOCUMENT_SEPARATOR: &str = "---\n";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// One positional argument of the `inject` command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Input {
    pub index: usize,
    pub source: InputSource,
}

impl Input {
    /// `-` stands for standard input, anything else is a file path.
    #[must_use]
    pub fn from_argument(index: usize, argument: &str) -> Self {
        let source = if argument == "-" {
            InputSource::Stdin
        } else {
            InputSource::File(PathBuf::from(argument))
        };
        Self { index, source }
    }

    /// Reads the whole input.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String, Error> {
        let content = match &self.source {
            InputSource::Stdin => {
                let mut content = String::new();
                std::io::stdin().lock().read_to_string(&mut content).map(|_| content)
            }
            InputSource::File(path) => std::fs::read_to_string(path),
        };
        content.context(error::ReadInputSnafu { input: self.to_string() })
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            InputSource::Stdin => write!(f, "({})-", self.index),
            InputSource::File(path) => write!(f, "({}){}", self.index, path.display()),
        }
    }
}

enum Outcome {
    Patched(String),
    Unrecognized,
}

/// Writes every document of every input to `output`, injected when its kind
/// is supported and unchanged otherwise.
pub struct Transformer<'a, W, D> {
    injector: Injector<'a>,
    output: W,
    diagnostics: D,
    documents_written: usize,
}

impl<'a, W, D> Transformer<'a, W, D>
where
    W: Write,
    D: Write,
{
    pub const fn new(injector: Injector<'a>, output: W, diagnostics: D) -> Self {
        Self { injector, output, diagnostics, documents_written: 0 }
    }
}

impl<W, D> Transformer<'_, W, D>
where
    W: Write,
    D: Write,
{
    /// Transforms `inputs` in order.
    ///
    /// # Errors
    ///
    /// The first failing input or document aborts the run.
    pub fn transform(&mut self, inputs: &[Input]) -> Result<(), Error> {
        for input in inputs {
            let content = input.read_to_string()?;
            self.transform_input(input, &content)?;
        }
        self.output.flush().context(error::WriteOutputSnafu)
    }

    fn transform_input(&mut self, input: &Input, content: &str) -> Result<(), Error> {
        for (index, document) in DocumentReader::new(content).enumerate() {
            match self.transform_document(input, index, document)? {
                Outcome::Patched(rendered) => self.write_document(&rendered)?,
                Outcome::Unrecognized => {
                    tracing::debug!(%input, document = index, "Pass through unrecognized document");
                    writeln!(
                        self.diagnostics,
                        "unknown kind in input {input}, document {index}, writing to output as-is"
                    )
                    .context(error::WriteDiagnosticsSnafu)?;
                    self.write_document(document)?;
                }
            }
        }
        Ok(())
    }

    fn transform_document(
        &self,
        input: &Input,
        document: usize,
        content: &str,
    ) -> Result<Outcome, Error> {
        if is_comment_only(content) {
            return Ok(Outcome::Unrecognized);
        }

        let mut object: Value = serde_yaml::from_str(content)
            .with_context(|_| error::ParseDocumentSnafu { input: input.to_string(), document })?;
        let Some(resource) = Resource::classify(&object)
            .with_context(|_| error::GeneratePatchSnafu { input: input.to_string(), document })?
        else {
            return Ok(Outcome::Unrecognized);
        };

        let patch = self
            .injector
            .generate(&resource, Pointer::root())
            .with_context(|_| error::GeneratePatchSnafu { input: input.to_string(), document })?;
        tracing::debug!(
            %input,
            document,
            kind = resource.kind().as_str(),
            operations = patch.0.len(),
            "Generated patch"
        );
        json_patch::patch(&mut object, &patch)
            .with_context(|_| error::ApplyPatchSnafu { input: input.to_string(), document })?;

        serde_yaml::to_string(&object)
            .map(Outcome::Patched)
            .with_context(|_| error::RenderDocumentSnafu { input: input.to_string(), document })
    }

    fn write_document(&mut self, document: &str) -> Result<(), Error> {
        if self.documents_written > 0 {
            self.output.write_all(DOCUMENT_SEPARATOR.as_bytes()).context(error::WriteOutputSnafu)?;
        }
        self.output.write_all(document.as_bytes()).context(error::WriteOutputSnafu)?;
        if !document.ends_with('\n') {
            self.output.write_all(b"\n").context(error::WriteOutputSnafu)?;
        }
        self.documents_written += 1;
        Ok(())
    }
}
