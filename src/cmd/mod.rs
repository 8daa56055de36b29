use clap::{Parser, Subcommand};

use self::docs::DocsArgs;
use self::manifests::ManifestsArgs;
use self::render::RenderArgs;
use self::schema::SchemaArgs;
use self::serve::ServeArgs;

pub(crate) mod docs;
pub(crate) mod manifests;
pub(crate) mod render;
pub(crate) mod schema;
pub(crate) mod serve;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Serve the provider protocol and print the handshake line
    Serve(ServeArgs),
    /// Print the provider schema as JSON
    Schema(SchemaArgs),
    /// Print the CustomResourceDefinitions of every supported kind
    Manifests(ManifestsArgs),
    /// Render a resource configuration file without Terraform
    Render(RenderArgs),
    /// Generate Markdown documentation for every resource
    Docs(DocsArgs),
}
