use clap::Parser;
use saude_api::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("saude_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = saude_api::cli::run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => tracing::error!("Error: {e:?}"),
            _ => tracing::error!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
