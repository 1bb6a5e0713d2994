mod associations;
mod backup;
mod calc;
mod config;
mod error;
mod ids;
mod ipc;
mod ledger;
mod model;
mod records;
mod store;

use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = config::DaemonConfig::load()?;
    init_tracing(&config)?;

    let mut state = ipc::AppState::in_memory();
    if let Some(workspace) = config.workspace.as_deref() {
        // A bad configured workspace should not stop the daemon; the UI can pick another.
        match state.open_workspace(workspace) {
            Ok(()) => info!(workspace = %workspace.display(), "workspace opened from config"),
            Err(e) => warn!(workspace = %workspace.display(), error = %e, "configured workspace failed to open"),
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "gradebookd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin read failed, shutting down");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // No id to echo back.
                debug!(error = %e, "unparseable request line");
                ipc::err("", "bad_json", e.to_string(), None)
            }
        };
        let _ = writeln!(stdout, "{}", resp);
        let _ = stdout.flush();
    }

    info!("stdin closed, exiting");
    Ok(())
}

/// Logs go to stderr; stdout carries the response stream.
fn init_tracing(config: &config::DaemonConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.log_filter()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
    Ok(())
}
