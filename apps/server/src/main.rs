#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use sentinel::{APP_NAME, Dispatcher, ProbeChecker, Registry, Scheduler};
use tracing::{debug, error, info};

mod config;
mod error;
mod routes;

use config::{Config, ServerConfig};
use error::AppError;
use logger::init_tracing;
use routes::version::VersionInfo;

/// Exit code of a malformed command line.
const USAGE_EXIT_CODE: u8 = 1;

/// Quick and simple monitoring daemon with a JSON status API
#[derive(Debug, Parser)]
#[command(name = APP_NAME, about, disable_version_flag = true)]
struct Cli {
    /// YAML file with the list of probes
    #[arg(required_unless_present = "version")]
    config: Option<PathBuf>,

    /// Print version information as JSON and exit
    #[arg(short = 'v', long)]
    version: bool,
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };
    let config = match (cli.version, cli.config) {
        (false, Some(config)) => config,
        _ => return print_version(),
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// `--help` succeeds, every other argument error is a usage failure.
fn usage_exit_code(error: &clap::Error) -> u8 {
    if error.use_stderr() { USAGE_EXIT_CODE } else { 0 }
}

fn print_version() -> ExitCode {
    match serde_json::to_string(&VersionInfo::current()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("cannot encode version: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(path: PathBuf) -> Result<(), AppError> {
    let config = Config::from_file(&path)?;
    debug!("{config}");

    let registry = Arc::new(Registry::new(config.probes));
    let checker = ProbeChecker::new().map_err(AppError::Checker)?;
    let scheduler = Scheduler::new(registry.clone(), Arc::new(checker), Arc::new(Dispatcher::default()));
    scheduler.schedule_all().await;

    let server = ServerConfig::from_env();
    run_server(&server, registry).await
}

async fn run_server(server: &ServerConfig, registry: Arc<Registry>) -> Result<(), AppError> {
    let probes = registry.len();
    let registry = web::Data::from(registry);
    let version = web::Data::new(VersionInfo::current());

    let http = HttpServer::new(move || {
        App::new()
            .wrap(routes::default_headers())
            .app_data(registry.clone())
            .app_data(version.clone())
            .configure(routes::routes)
            .default_service(web::to(routes::not_found))
    })
    .disable_signals()
    .bind(server.address())
    .map_err(|source| AppError::Bind { addr: server.to_string(), source })?
    .run();

    info!(address = %server, probes, "listening");

    tokio::select! {
        result = http => result.map_err(AppError::Serve),
        result = shutdown_signal() => {
            result?;
            info!("shutting down");
            Ok(())
        }
    }
}

/// Resolves on SIGTERM or Ctrl-C.
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = terminate.recv() => Ok(()),
        result = tokio::signal::ctrl_c() => result,
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
