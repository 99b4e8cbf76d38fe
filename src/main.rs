use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

mod api;
mod config;
mod download;
mod entrypoint;
mod platform;
mod process;

use config::{Config, Environment};

#[derive(Parser, Debug)]
#[command(
    name = "veverse-server-launcher",
    author,
    version,
    about = "Bootstraps a game server: authenticates, downloads the latest release and supervises the server process"
)]
struct Cli {
    /// Environment to launch against.
    #[arg(long = "env", value_enum, default_value_t = Environment::Dev)]
    environment: Environment,

    /// Path components between the release root and the server binary.
    #[arg(long, default_value_t = 4)]
    depth: usize,

    /// Arguments forwarded verbatim to the server process.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    server_args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Welcome to VeVerse server launcher");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// The launch pipeline: config → login → release → download → entrypoint →
/// supervise. Every stage failure short-circuits except the download pass,
/// which is best-effort across the file manifest.
async fn run(cli: Cli) -> Result<(), String> {
    let config = Config::from_env(cli.environment, cli.depth)?;
    let client = api::ApiClient::new(config.api_root.clone());

    let token = client
        .login()
        .await
        .map_err(|e| format!("failed to login: {e}"))?;
    let release = client.fetch_latest_release(&token, &config).await?;

    let downloader = download::Downloader::new(client.http().clone());
    let failures = downloader.download_release(&release).await;
    if !failures.is_empty() {
        warn!(
            "download: {} file(s) failed, continuing with a partial tree",
            failures.len()
        );
    }

    let suffix = platform::binary_suffix(config.environment);
    let found = entrypoint::find_entrypoint(Path::new("."), &suffix)
        .map_err(|e| format!("failed to find an entrypoint: {e}"))?;
    let layout = entrypoint::resolve_layout(&found, config.depth);

    let args = process::server_args(&cli.server_args);
    process::supervise(&layout.entrypoint, &layout.project_dir, &args).await
}
