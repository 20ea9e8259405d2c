use anyhow::Result;
use clap::Parser;
use review_sentiment::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("review_sentiment=info")),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
