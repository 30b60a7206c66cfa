use crate::backup;
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::helpers::{required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

fn export_bundle(_state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let workspace = PathBuf::from(required_str(req, "workspacePath")?);
    let out_path = PathBuf::from(required_str(req, "outPath")?);
    let summary = backup::export_workspace_bundle(&workspace, &out_path)
        .map_err(|e| HandlerErr::new("backup_failed", format!("{e:#}")))?;
    log::info!(
        "workspace {} exported to {} ({} entries)",
        workspace.to_string_lossy(),
        out_path.to_string_lossy(),
        summary.entry_count
    );
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
    }))
}

fn import_bundle(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let in_path = PathBuf::from(required_str(req, "inPath")?);
    let workspace = PathBuf::from(required_str(req, "workspacePath")?);

    // The open connection would keep writing to the file being replaced.
    let is_current = state
        .workspace
        .as_deref()
        .is_some_and(|w| same_path(w, &workspace));
    if is_current {
        state.db = None;
    }

    let imported = backup::import_workspace_bundle(&in_path, &workspace);
    let reopened = if is_current {
        open_workspace(state, workspace.clone()).map(|_| true)
    } else {
        Ok(false)
    };
    if reopened.is_err() {
        // Half-open state would serve the old roster without a database.
        state.workspace = None;
        state.store = None;
        state.schedule = None;
    }

    let summary = imported.map_err(|e| HandlerErr::new("backup_failed", format!("{e:#}")))?;
    let reloaded = reopened?;
    log::info!(
        "bundle {} imported into {} ({} files)",
        in_path.to_string_lossy(),
        workspace.to_string_lossy(),
        summary.restored.len()
    );
    Ok(json!({
        "workspacePath": workspace.to_string_lossy(),
        "bundleFormatDetected": summary.bundle_format_detected,
        "restored": summary.restored,
        "reloaded": reloaded,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(respond(req, export_bundle(state, req))),
        "backup.importWorkspaceBundle" => Some(respond(req, import_bundle(state, req))),
        _ => None,
    }
}
