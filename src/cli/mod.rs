use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::config;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "saude-api")]
#[command(about = "REST API for health establishments and their reference tables")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Apply pending migrations before serving")]
        migrate: bool,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None, migrate: false }) {
        Commands::Serve { port, migrate } => serve(port, migrate).await,
        Commands::Migrate => {
            let pool = DatabaseManager::connect_lazy(&config().database)?;
            DatabaseManager::migrate(&pool).await?;
            DatabaseManager::close(pool).await;
            Ok(())
        }
    }
}

async fn serve(port: Option<u16>, migrate: bool) -> anyhow::Result<()> {
    let config = config();
    info!("Starting Saúde API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    if migrate {
        DatabaseManager::migrate(&pool).await?;
    }

    let app = crate::routes::app(pool.clone(), config);

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Saúde API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close(pool).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
