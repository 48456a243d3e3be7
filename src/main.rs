use anyhow::Result;
use clap::Parser;
use therapy_chat::cli::{self, Cli};
use therapy_chat::{AppContext, Config};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(url) = args.api_url {
        cfg.api.base_url = url;
    }

    let level = if args.verbose {
        Level::DEBUG
    } else {
        cfg.log_level.parse().unwrap_or(Level::INFO)
    };
    // Logs go to stderr so they never interleave with the chat transcript
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("therapy-chat v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", cfg.api.base_url);

    let mut ctx = AppContext::init(cfg).await?;
    cli::run(&mut ctx, args.command).await
}
