use crate::config::{self, SchoolConfig};
use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::RosterStore;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Opens (or re-opens) a workspace: roster files, config and attendance DB.
pub(crate) fn open_workspace(state: &mut AppState, path: PathBuf) -> Result<(), HandlerErr> {
    let conn = db::open_db(&path)
        .map_err(|e| HandlerErr::new("db_failed", format!("{e:#}")))?;
    let store = RosterStore::load(&path)
        .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?;
    let cfg = config::load_config(&path)
        .map_err(|e| HandlerErr::new("bad_config", format!("{e:#}")))?;

    log::info!(
        "workspace {}: {} teachers, {} subjects, {} classes, {} students, {} users",
        path.to_string_lossy(),
        store.teachers().len(),
        store.subjects().len(),
        store.classes().len(),
        store.students().len(),
        store.users().len()
    );

    state.workspace = Some(path);
    state.store = Some(store);
    state.db = Some(conn);
    state.config = cfg;
    state.schedule = None;
    Ok(())
}

fn workspace_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let Some(path) = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return Err(HandlerErr::bad_params("missing params.path"));
    };
    open_workspace(state, path.clone())?;
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigPatch {
    days: Option<Vec<String>>,
    time_slots: Option<Vec<String>>,
    lunch_slot: Option<String>,
    max_subjects_per_teacher: Option<usize>,
}

fn config_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let Some(workspace) = state.workspace.clone() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let params = if req.params.is_null() {
        json!({})
    } else {
        req.params.clone()
    };
    let patch: ConfigPatch = serde_json::from_value(params)
        .map_err(|e| HandlerErr::bad_params(format!("invalid config params: {e}")))?;

    let mut next: SchoolConfig = state.config.clone();
    if let Some(v) = patch.days {
        next.days = v;
    }
    if let Some(v) = patch.time_slots {
        next.time_slots = v;
    }
    if let Some(v) = patch.lunch_slot {
        next.lunch_slot = v;
    }
    if let Some(v) = patch.max_subjects_per_teacher {
        next.max_subjects_per_teacher = v;
    }
    next.validate()
        .map_err(|m| HandlerErr::new("bad_config", m))?;

    config::save_config(&workspace, &next)
        .map_err(|e| HandlerErr::new("io_failed", format!("{e:#}")))?;
    state.config = next;
    Ok(json!({ "config": state.config }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(respond(req, workspace_select(state, req))),
        "config.get" => Some(ok(&req.id, json!({ "config": state.config }))),
        "config.update" => Some(respond(req, config_update(state, req))),
        _ => None,
    }
}
