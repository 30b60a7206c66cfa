use crate::export;
use crate::ipc::helpers::{required_str, respond, store, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{self, Schedule};
use serde_json::json;
use std::path::PathBuf;

fn parse_seed(req: &Request) -> Result<Option<u64>, HandlerErr> {
    match req.params.get("seed") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params("seed must be a non-negative integer")),
    }
}

fn current(state: &AppState) -> Result<&Schedule, HandlerErr> {
    state
        .schedule
        .as_ref()
        .ok_or_else(|| HandlerErr::new("not_found", "no schedule has been generated yet"))
}

fn schedule_generate(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let seed = parse_seed(req)?;
    let roster = store(state)?.roster();
    let generated = schedule::generate_with_seed(&roster, &state.config, seed)?;
    store_mut(state)?.assign_subjects(&generated.assignments)?;

    let clashes = schedule::double_bookings(&generated.entries).len();
    log::info!(
        "generated {} schedule entries for {} classes (seed {:?}, {} double bookings)",
        generated.entries.len(),
        roster.classes.len(),
        seed,
        clashes
    );

    let result = json!({
        "entryCount": generated.entries.len(),
        "entries": generated.entries,
        "assignments": generated.assignments,
        "seed": generated.seed,
        "doubleBookingCount": clashes,
    });
    state.schedule = Some(generated);
    Ok(result)
}

fn schedule_get(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let s = current(state)?;
    Ok(json!({
        "entryCount": s.entries.len(),
        "entries": s.entries,
        "assignments": s.assignments,
        "seed": s.seed,
    }))
}

fn schedule_double_bookings(
    state: &mut AppState,
    _req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let s = current(state)?;
    let clashes = schedule::double_bookings(&s.entries);
    Ok(json!({ "doubleBookings": clashes }))
}

fn schedule_export_csv(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(required_str(req, "outPath")?);
    let s = current(state)?;
    let csv = export::schedule_csv(&s.entries)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    export::write_export(&out_path, &csv)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    log::info!("schedule CSV written to {}", out_path.to_string_lossy());
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "rowsExported": s.entries.len(),
    }))
}

fn schedule_export_html(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(required_str(req, "outPath")?);
    let s = current(state)?;
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let html = export::schedule_html(s, &state.config, &generated_at);
    export::write_export(&out_path, &html)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    log::info!("schedule HTML written to {}", out_path.to_string_lossy());
    Ok(json!({ "path": out_path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.generate" => Some(respond(req, schedule_generate(state, req))),
        "schedule.get" => Some(respond(req, schedule_get(state, req))),
        "schedule.doubleBookings" => Some(respond(req, schedule_double_bookings(state, req))),
        "schedule.exportCsv" => Some(respond(req, schedule_export_csv(state, req))),
        "schedule.exportHtml" => Some(respond(req, schedule_export_html(state, req))),
        _ => None,
    }
}
