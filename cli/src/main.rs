use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use remote_shell::config::RemoteManifest;
use remote_shell::remote::RemoteDiagnostics;
use remote_shell::remote::diagnostics::{DiagnosticsError, suggest_entry_urls};
use remote_shell::startup::entry_urls;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("shell returned HTTP {0}")]
    Status(u16),
    #[error("diagnostics unavailable: {0}")]
    Diagnostics(#[from] DiagnosticsError),
    #[error("remote manifest: {0}")]
    Manifest(#[from] remote_shell::config::ConfigError),
    #[error("no working remote entry under {0}")]
    NoWorkingEntry(String),
    #[error("{0} of {1} remote entries are not working")]
    Failing(usize, usize),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "shell-cli", about = "Remote entry diagnostics and shell inspection")]
struct Cli {
    #[arg(long, env = "SHELL_PROBE_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one URL and report reachability, status, and marker presence.
    Probe { url: String },
    /// Try the conventional entry locations under a base URL.
    Find { base_url: String },
    /// Probe every enabled remote in the manifest that has a base URL.
    Diagnose {
        #[arg(long, env = "SHELL_REMOTES_FILE", default_value = "remotes.yaml")]
        remotes_file: PathBuf,
    },
    /// Print the running shell's aggregated route table.
    Routes {
        #[arg(long, env = "SHELL_URL", default_value = "http://127.0.0.1:3000")]
        shell_url: String,
    },
}

#[derive(Debug, Serialize)]
struct ProbeOutput<'a> {
    #[serde(flatten)]
    probe: &'a remote_shell::remote::ProbeResult,
    hints: Vec<&'static str>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);

    match cli.command {
        Command::Probe { url } => run_probe(timeout, &url).await,
        Command::Find { base_url } => run_find(timeout, &base_url).await,
        Command::Diagnose { remotes_file } => run_diagnose(timeout, remotes_file).await,
        Command::Routes { shell_url } => run_routes(&shell_url).await,
    }
}

async fn run_probe(timeout: Duration, url: &str) -> Result<(), CliError> {
    let diagnostics = RemoteDiagnostics::with_timeout(timeout)?;
    let probe = diagnostics.probe(url).await;
    let output = ProbeOutput { hints: probe.hints(), probe: &probe };
    print_json(&serde_json::to_value(&output)?)
}

async fn run_find(timeout: Duration, base_url: &str) -> Result<(), CliError> {
    let diagnostics = RemoteDiagnostics::with_timeout(timeout)?;
    for candidate in suggest_entry_urls(base_url) {
        eprintln!("trying {candidate}");
    }
    match diagnostics.find_working_variant(base_url).await {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => Err(CliError::NoWorkingEntry(base_url.to_owned())),
    }
}

async fn run_diagnose(timeout: Duration, remotes_file: PathBuf) -> Result<(), CliError> {
    let manifest = RemoteManifest::load(&remotes_file)?;
    let remotes = entry_urls(&manifest);
    if remotes.is_empty() {
        eprintln!("no enabled remote has a base URL set");
        return Ok(());
    }

    let diagnostics = RemoteDiagnostics::with_timeout(timeout)?;
    let reports = diagnostics.diagnose_all(&remotes).await;
    print_json(&serde_json::to_value(&reports)?)?;

    let failing = reports.iter().filter(|r| !r.probe.is_working()).count();
    if failing > 0 {
        return Err(CliError::Failing(failing, reports.len()));
    }
    Ok(())
}

async fn run_routes(shell_url: &str) -> Result<(), CliError> {
    let url = format!("{}/api/routes", shell_url.trim_end_matches('/'));
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Status(status.as_u16()));
    }
    let json = response.json::<Value>().await?;
    print_json(&json)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
