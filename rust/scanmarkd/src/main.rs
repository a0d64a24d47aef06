mod analytics;
mod backup;
mod config;
mod db;
mod ipc;
mod store;

use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    // stdout carries the IPC protocol; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn main() {
    let loaded = crate::config::AppConfig::load();
    let cfg = match &loaded {
        Ok(c) => c.clone(),
        Err(_) => crate::config::AppConfig::default(),
    };
    init_logging(&cfg.log_level);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "config load failed; using defaults");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "scanmarkd starting");

    let mut state = ipc::AppState::default();
    if let Some(ws) = cfg.workspace.as_deref() {
        if let Err(e) = ipc::open_workspace(&mut state, ws) {
            tracing::error!(workspace = %ws.display(), error = ?e, "configured workspace failed to open");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed; shutting down");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "malformed request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed; exiting");
}
