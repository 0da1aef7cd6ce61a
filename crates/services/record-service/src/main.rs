//! Record Service - HTTP server over the federated record store.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "record-service")]
#[command(about = "Federated record store over relational and key-value backends")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Overrides RECORD_SERVICE_HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides RECORD_SERVICE_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Connect to both backends and ping them
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            record_service_lib::run_embedded(host, port).await?;
        }
        Commands::Check => {
            if !record_service_lib::check_backends().await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
