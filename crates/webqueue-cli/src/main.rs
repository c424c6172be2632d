//! webqueue CLI tool.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "webqueue")]
#[command(about = "webqueue job server client", long_about = None)]
struct Cli {
    /// API server URL
    #[arg(long, env = "WEBQUEUE_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job
    Submit {
        /// Job payload as a JSON object, e.g. '{"name":"khawaja"}'
        payload: String,
    },
    /// List pending jobs
    Queue,
    /// Show a job's current record
    Result {
        /// Job ID
        id: String,
    },
    /// Poll a job until it finishes
    Wait {
        /// Job ID
        id: String,
        /// Polling interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = commands::Client::new(&cli.api_url);

    match cli.command {
        Commands::Submit { payload } => {
            commands::submit(&client, &payload).await?;
        }
        Commands::Queue => {
            commands::queue(&client).await?;
        }
        Commands::Result { id } => {
            commands::result(&client, &id).await?;
        }
        Commands::Wait { id, interval_ms } => {
            commands::wait(&client, &id, interval_ms).await?;
        }
    }

    Ok(())
}
