use gradebookd::{config::DaemonConfig, ipc, logging};
use std::io::{self, BufRead, Write};

fn main() {
    let config = DaemonConfig::from_env();
    logging::init(config.log_filter.as_deref());

    let mut state = ipc::AppState::new();
    if let Some(path) = &config.workspace {
        // A broken preset workspace must not keep the sidecar from starting.
        if let Err(e) = state.select_workspace(path) {
            tracing::warn!(workspace = %path.display(), error = %e, "preset workspace not opened");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
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
                tracing::warn!(error = %e, "unparseable request line");
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
