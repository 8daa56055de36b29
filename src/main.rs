use std::process::exit;

use clap::Parser;
use cmd::{Cli, Commands};
use log::*;
use provider::helpers::{docs, manifests};
use provider::provider::Provider;
use provider::server;

mod cmd;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let provider = Provider::new()?;

    match &cli.command {
        Commands::Serve(args) => {
            // Terraform reads the handshake from stdout, logs go to stderr
            if let Err(err) = server::serve(provider, &args.address, args.port).await {
                error!("{}", err);
                exit(1)
            }
        }
        Commands::Schema(args) => {
            let schema = match &args.resource {
                Some(name) => provider.resource(name)?.schema().to_json(),
                None => provider.schema().to_json(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Manifests(args) => {
            let stream = manifests::crd_manifests()?;
            match &args.output {
                Some(path) => std::fs::write(path, stream)?,
                None => print!("{}", stream),
            }
        }
        Commands::Render(args) => {
            let content = std::fs::read_to_string(&args.file)?;
            match provider.render(&args.resource, &content, args.state) {
                Ok(rendered) if args.state => println!("{}", rendered),
                Ok(rendered) => print!("{}", rendered),
                Err(err) => {
                    for diagnostic in err.diagnostics().iter() {
                        error!("{}", diagnostic);
                    }
                    exit(1)
                }
            }
        }
        Commands::Docs(args) => {
            for path in docs::generate_docs(&provider, &args.output)? {
                info!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}
