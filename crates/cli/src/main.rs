mod gateway_command;
mod shutdown;
mod telemetry;
mod worker_command;

use clap::{Parser, Subcommand};

/// `relaymesh` — runs one of the two process kinds this system is built
/// from (§2): the callback/HTTP gateway, or a single worker.
#[derive(Parser)]
#[command(name = "relaymesh", about = "relaymesh — a sticky pub/sub fan-out gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the callback/HTTP gateway process (§4.C, §4.E, §6).
    Gateway(gateway_command::GatewayArgs),
    /// Run a single worker process bound to one worker id (§4.D, §6).
    Worker(worker_command::WorkerArgs),
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Gateway(args) => gateway_command::run(args).await,
        Commands::Worker(args) => worker_command::run(args).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            std::process::ExitCode::FAILURE
        },
    }
}
