use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{reply, required_str, ParamResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

fn selected_workspace(state: &AppState, req: &Request) -> ParamResult<PathBuf> {
    state
        .workspace
        .clone()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_export(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let workspace = selected_workspace(state, req)?;
    let out_path = Path::new(required_str(req, "outPath")?);
    match backup::export_workspace_bundle(&workspace, out_path) {
        Ok(summary) => {
            info!(out = %out_path.display(), sha256 = %summary.db_sha256, "workspace exported");
            Ok(ok(
                &req.id,
                json!({
                    "outPath": out_path.to_string_lossy(),
                    "bundleFormat": summary.bundle_format,
                    "entryCount": summary.entry_count,
                    "dbSha256": summary.db_sha256,
                }),
            ))
        }
        Err(e) => {
            warn!(error = %e, "workspace export failed");
            Err(err(&req.id, "backup_failed", format!("{e:#}"), None))
        }
    }
}

fn handle_import(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let workspace = selected_workspace(state, req)?;
    let in_path = Path::new(required_str(req, "inPath")?);

    // Staging validates the input while the live store stays open.
    let staged = backup::stage_import(in_path, &workspace).map_err(|e| {
        warn!(source = %in_path.display(), error = %e, "workspace import rejected");
        err(&req.id, "backup_failed", format!("{e:#}"), None)
    })?;

    // The SQLite connection must be released before its file is replaced.
    state.close_workspace();
    let committed = staged.commit();
    if let Err(e) = state.open_workspace(&workspace) {
        error!(workspace = %workspace.display(), error = %e, "workspace reopen failed after import");
        return Err(err(
            &req.id,
            "db_open_failed",
            format!("{e:#}"),
            Some(json!({ "workspacePath": workspace.to_string_lossy(), "storage": "memory" })),
        ));
    }
    let format = committed.map_err(|e| {
        warn!(error = %e, "workspace import failed");
        err(&req.id, "backup_failed", format!("{e:#}"), None)
    })?;

    info!(source = %in_path.display(), format, "workspace imported");
    Ok(ok(
        &req.id,
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "bundleFormatDetected": format,
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspaceBundle" => handle_export(state, req),
        "backup.importWorkspaceBundle" => handle_import(state, req),
        _ => return None,
    };
    Some(reply(result))
}
