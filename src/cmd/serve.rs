use clap::Args;

#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Address the protocol server listens on
    #[arg(long, default_value = "127.0.0.1", env = "K8S_CRDS_PROVIDER_ADDRESS")]
    pub(crate) address: String,
    /// Port to listen on, 0 picks a free one
    #[arg(long, default_value_t = 0, env = "K8S_CRDS_PROVIDER_PORT")]
    pub(crate) port: u16,
}
