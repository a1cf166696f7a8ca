use std::io::BufWriter;

use clap::Args;
use tzinject_core::{
    Injector,
    transform::{Input, Transformer},
};

use super::{DefaultsArgs, Error};
use crate::config::Config;

/// Injects the timezone into manifests read from files or standard input.
#[derive(Args, Clone)]
pub struct InjectCommand {
    #[command(flatten)]
    defaults: DefaultsArgs,

    #[arg(
        required = true,
        value_name = "INPUT",
        help = "Manifest files to transform, `-` reads standard input. Documents are written to \
                standard output in order."
    )]
    inputs: Vec<String>,
}

impl InjectCommand {
    pub fn run(self, config: Config) -> Result<(), Error> {
        let Self { defaults: overrides, inputs } = self;
        let mut defaults = config.defaults;
        overrides.apply(&mut defaults);

        let inputs = inputs
            .iter()
            .enumerate()
            .map(|(index, argument)| Input::from_argument(index, argument))
            .collect::<Vec<_>>();

        let stdout = std::io::stdout();
        let mut transformer = Transformer::new(
            Injector::new(&defaults),
            BufWriter::new(stdout.lock()),
            std::io::stderr(),
        );
        transformer.transform(&inputs)?;
        Ok(())
    }
}
