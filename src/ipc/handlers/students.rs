use crate::attendance;
use crate::export;
use crate::ipc::error::ok;
use crate::ipc::helpers::{optional_str, required_str, respond, store, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentPatch};
use serde_json::json;
use std::path::PathBuf;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(store) = store(state) else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let class_filter = optional_str(req, "class");
    let students: Vec<&Student> = store
        .students()
        .iter()
        .filter(|s| class_filter.map(|c| s.class_name == c).unwrap_or(true))
        .collect();
    ok(&req.id, json!({ "students": students }))
}

fn parse_new_student(req: &Request) -> Result<Student, HandlerErr> {
    let name = required_str(req, "name")?;
    let class_name = required_str(req, "class")?;
    let Some(marks) = req.params.get("marks").and_then(|v| v.as_f64()) else {
        return Err(HandlerErr::bad_params("marks must be a number"));
    };
    let Some(year) = req.params.get("year").and_then(|v| v.as_i64()) else {
        return Err(HandlerErr::bad_params("year must be an integer"));
    };
    let enrollment_date = required_str(req, "enrollmentDate")?;
    Ok(Student {
        id: String::new(),
        name: name.to_string(),
        class_name: class_name.to_string(),
        marks,
        year,
        enrollment_date: enrollment_date.to_string(),
    })
}

fn students_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student = parse_new_student(req)?;
    let student = store_mut(state)?.add_student(student)?;
    log::info!("student added: {} ({})", student.name, student.class_name);
    Ok(json!({ "studentId": student.id, "student": student }))
}

fn students_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(req, "studentId")?;
    let Some(raw) = req.params.get("patch") else {
        return Err(HandlerErr::bad_params("missing patch"));
    };
    let patch: StudentPatch = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid patch: {e}")))?;
    let student = store_mut(state)?.update_student(student_id, &patch)?;
    Ok(json!({ "student": student }))
}

fn students_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(req, "studentId")?;
    let removed = store_mut(state)?.remove_student(student_id)?;
    let mut attendance_rows = 0;
    if let Some(conn) = state.db.as_ref() {
        attendance_rows = attendance::delete_student(conn, student_id)
            .map_err(|e| HandlerErr::new("db_failed", format!("{e:#}")))?;
    }
    Ok(json!({ "removed": removed, "attendanceRowsRemoved": attendance_rows }))
}

fn students_export_csv(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(required_str(req, "outPath")?);
    let store = store(state)?;
    let csv = export::students_csv(store.students())
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    export::write_export(&out_path, &csv)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    log::info!(
        "exported {} students to {}",
        store.students().len(),
        out_path.to_string_lossy()
    );
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "rowsExported": store.students().len(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(respond(req, students_create(state, req))),
        "students.update" => Some(respond(req, students_update(state, req))),
        "students.delete" => Some(respond(req, students_delete(state, req))),
        "students.exportCsv" => Some(respond(req, students_export_csv(state, req))),
        _ => None,
    }
}
