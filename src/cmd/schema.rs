use clap::Args;

#[derive(Args)]
pub(crate) struct SchemaArgs {
    /// Only print the schema of this resource type
    #[arg(long, short)]
    pub(crate) resource: Option<String>,
}
