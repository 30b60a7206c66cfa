use crate::attendance;
use crate::export::{self, AttendanceRow};
use crate::ipc::helpers::{db_conn, optional_str, required_str, respond, store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use chrono::NaiveDate;
use serde_json::json;
use std::path::PathBuf;

fn parse_date_param(req: &Request) -> Result<NaiveDate, HandlerErr> {
    let raw = required_str(req, "date")?;
    attendance::parse_date(raw).ok_or_else(|| {
        HandlerErr::bad_params("date must be YYYY-MM-DD").with_details(json!({ "date": raw }))
    })
}

fn db_err(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("db_failed", format!("{e:#}"))
}

fn attendance_mark(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(req, "studentId")?;
    let date = parse_date_param(req)?;
    let raw_status = required_str(req, "status")?;
    let Some(status) = AttendanceStatus::parse(raw_status) else {
        return Err(
            HandlerErr::bad_params("status must be one of: present, absent, late, excused")
                .with_details(json!({ "status": raw_status })),
        );
    };
    if store(state)?.student(student_id).is_none() {
        return Err(HandlerErr::new(
            "not_found",
            format!("student not found: {student_id}"),
        ));
    }
    attendance::mark(db_conn(state)?, student_id, date, status).map_err(db_err)?;
    Ok(json!({
        "studentId": student_id,
        "date": date.to_string(),
        "status": status,
    }))
}

/// Records for one date joined to the roster; rows for students that no
/// longer exist are dropped.
fn day_rows(
    state: &AppState,
    date: NaiveDate,
    class_filter: Option<&str>,
) -> Result<Vec<AttendanceRow>, HandlerErr> {
    let store = store(state)?;
    let records = attendance::records_for_date(db_conn(state)?, date).map_err(db_err)?;
    Ok(records
        .into_iter()
        .filter_map(|(sid, status)| {
            let s = store.student(&sid)?;
            if class_filter.is_some_and(|c| s.class_name != c) {
                return None;
            }
            Some(AttendanceRow {
                student_id: sid,
                student: s.name.clone(),
                class_name: s.class_name.clone(),
                date: date.to_string(),
                status: status.as_str().to_string(),
            })
        })
        .collect())
}

fn attendance_day(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let date = parse_date_param(req)?;
    let rows = day_rows(state, date, optional_str(req, "class"))?;
    Ok(json!({ "date": date.to_string(), "records": rows }))
}

fn attendance_summary(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(req, "studentId")?;
    let Some(student) = store(state)?.student(student_id) else {
        return Err(HandlerErr::new(
            "not_found",
            format!("student not found: {student_id}"),
        ));
    };
    let summary = attendance::summary(db_conn(state)?, student_id).map_err(db_err)?;
    Ok(json!({
        "studentId": student_id,
        "student": student.name,
        "summary": summary,
    }))
}

fn attendance_export_csv(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let date = parse_date_param(req)?;
    let out_path = PathBuf::from(required_str(req, "outPath")?);
    let rows = day_rows(state, date, optional_str(req, "class"))?;
    let csv = export::attendance_csv(&rows)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    export::write_export(&out_path, &csv)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "rowsExported": rows.len(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(respond(req, attendance_mark(state, req))),
        "attendance.day" => Some(respond(req, attendance_day(state, req))),
        "attendance.summary" => Some(respond(req, attendance_summary(state, req))),
        "attendance.exportCsv" => Some(respond(req, attendance_export_csv(state, req))),
        _ => None,
    }
}
