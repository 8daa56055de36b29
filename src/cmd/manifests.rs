use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub(crate) struct ManifestsArgs {
    /// Write the manifests to this file instead of stdout
    #[arg(long, short)]
    pub(crate) output: Option<PathBuf>,
}
