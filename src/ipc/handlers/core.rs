use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{reply, required_str, ParamResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "storage": if state.workspace.is_some() { "sqlite" } else { "memory" },
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let path = PathBuf::from(required_str(req, "path")?);
    match state.open_workspace(&path) {
        Ok(()) => {
            info!(workspace = %path.display(), "workspace selected");
            Ok(ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })))
        }
        Err(e) => {
            warn!(workspace = %path.display(), error = %e, "workspace open failed");
            Err(err(&req.id, "db_open_failed", format!("{e:#}"), None))
        }
    }
}

fn handle_workspace_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(path) = state.workspace.as_ref() {
        info!(workspace = %path.display(), "workspace closed");
    }
    state.close_workspace();
    ok(&req.id, json!({ "storage": "memory" }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(reply(handle_workspace_select(state, req))),
        "workspace.close" => Some(handle_workspace_close(state, req)),
        _ => None,
    }
}
