use anyhow::Result;
use cambio::log::init_logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "cambio")]
#[command(about = "HTTP API for currency conversion and live exchange rates")]
#[command(version)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the server to
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = cambio::run(cli.config_path.as_deref(), cli.host.as_deref(), cli.port).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Server failed");
    }
    result
}
