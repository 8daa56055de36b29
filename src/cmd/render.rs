use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Resource type, e.g. k8s_getambassador_io_mapping_v2
    #[arg(long, short)]
    pub(crate) resource: String,
    /// YAML or JSON file holding the resource configuration
    #[arg(long, short)]
    pub(crate) file: PathBuf,
    /// Print the whole Terraform state instead of the manifest
    #[arg(long, default_value_t = false)]
    pub(crate) state: bool,
}
