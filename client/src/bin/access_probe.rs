//! Exercise the access layer against a live backend from the command line.
//!
//! # Examples
//! ```sh
//! ACCESS_API_BASE_URL=https://api.example.com/ \
//!     cargo run -p client --bin access-probe -- activities --search coast
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use client::AccessSettings;
use client::domain::{AccessError, AccessLayer, ActivityQuery, LoginRequest};
use ortho_config::OrthoConfig;
use serde::Serialize;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable consulted when `--password` is omitted.
const PASSWORD_ENV: &str = "ACCESS_PASSWORD";

/// `access-probe` command arguments. Connection settings come from
/// `ACCESS_*` environment variables and the configuration file.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "access-probe",
    about = "Call the remote API through the access layer and print JSON results",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Fetch one activity.
    Activity {
        /// Activity identifier.
        id: String,
    },
    /// List activities.
    Activities {
        /// Free-text search term.
        #[arg(long)]
        search: Option<String>,
        /// One-based page number.
        #[arg(long)]
        page: Option<u32>,
    },
    /// List the stages of an activity.
    Stages {
        /// Activity identifier.
        activity_id: String,
    },
    /// Sign in and store the returned credential.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password. Falls back to `ACCESS_PASSWORD` when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored credential.
    Logout,
}

fn main() -> io::Result<()> {
    let args = CliArgs::parse();
    init_tracing();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main(args))
}

fn init_tracing() {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
}

async fn async_main(args: CliArgs) -> io::Result<()> {
    let settings = AccessSettings::load_from_iter([OsString::from("access-probe")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let layer = settings
        .build_layer()
        .map_err(|error| io::Error::other(format!("configure access layer: {error}")))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; cancelling in-flight call");
            on_interrupt.cancel();
        }
    });

    run(&layer, args.command, &cancel).await
}

async fn run(layer: &AccessLayer, command: Command, cancel: &CancellationToken) -> io::Result<()> {
    match command {
        Command::Activity { id } => {
            print_json(&layer.get_activity(&id, cancel).await.map_err(failed)?)
        }
        Command::Activities { search, page } => {
            let query = ActivityQuery {
                page,
                per_page: None,
                search,
            };
            print_json(&layer.list_activities(&query, cancel).await.map_err(failed)?)
        }
        Command::Stages { activity_id } => {
            print_json(&layer.list_stages(&activity_id, cancel).await.map_err(failed)?)
        }
        Command::Login { email, password } => {
            let password = resolve_password(password)?;
            let request = LoginRequest::new(email, password);
            print_json(&layer.login(&request, cancel).await.map_err(failed)?)
        }
        Command::Logout => {
            layer.logout().map_err(failed)?;
            print_json(&serde_json::json!({ "signedOut": true }))
        }
    }
}

fn resolve_password(explicit: Option<String>) -> io::Result<String> {
    match explicit.or_else(|| env::var(PASSWORD_ENV).ok()) {
        Some(password) if !password.is_empty() => Ok(password),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("--password or {PASSWORD_ENV} is required"),
        )),
    }
}

fn failed(error: AccessError) -> io::Error {
    io::Error::other(format!("{}: {error}", error.kind().as_str()))
}

fn print_json(value: &impl Serialize) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::other)?;
    writeln!(stdout)
}
