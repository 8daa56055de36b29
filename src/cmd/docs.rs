use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub(crate) struct DocsArgs {
    /// Directory the documentation is written to
    #[arg(long, short, default_value = "docs")]
    pub(crate) output: PathBuf,
}
