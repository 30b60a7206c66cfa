use crate::ipc::error::ok;
use crate::ipc::helpers::{optional_str, required_str, respond, store, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_teachers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(store) = store(state) else {
        return ok(&req.id, json!({ "teachers": [] }));
    };
    ok(&req.id, json!({ "teachers": store.teachers() }))
}

fn teachers_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(req, "name")?;
    let teacher = store_mut(state)?.add_teacher(name)?;
    log::info!("teacher added: {}", teacher.name);
    Ok(json!({ "teacher": teacher }))
}

fn teachers_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = required_str(req, "teacherId")?;
    let removed = store_mut(state)?.remove_teacher(key)?;
    Ok(json!({ "removed": removed }))
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(store) = store(state) else {
        return ok(&req.id, json!({ "subjects": [] }));
    };
    ok(&req.id, json!({ "subjects": store.subjects() }))
}

fn subjects_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(req, "name")?;
    let subject = store_mut(state)?.add_subject(name)?;
    Ok(json!({ "subject": subject }))
}

fn subjects_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = required_str(req, "subjectId")?;
    let removed = store_mut(state)?.remove_subject(key)?;
    Ok(json!({ "removed": removed }))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(store) = store(state) else {
        return ok(&req.id, json!({ "classes": [] }));
    };
    // Student counts give the dashboard something to show per class.
    let classes: Vec<serde_json::Value> = store
        .classes()
        .iter()
        .map(|c| {
            let student_count = store
                .students()
                .iter()
                .filter(|s| s.class_name == c.name)
                .count();
            json!({
                "id": c.id,
                "name": c.name,
                "grade": c.grade,
                "label": c.label(),
                "studentCount": student_count,
            })
        })
        .collect();
    ok(&req.id, json!({ "classes": classes }))
}

fn classes_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(req, "name")?;
    let grade = optional_str(req, "grade").unwrap_or("");
    let class = store_mut(state)?.add_class(name, grade)?;
    Ok(json!({ "class": class }))
}

fn classes_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = required_str(req, "classId")?;
    let removed = store_mut(state)?.remove_class(key)?;
    Ok(json!({ "removed": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(handle_teachers_list(state, req)),
        "teachers.create" => Some(respond(req, teachers_create(state, req))),
        "teachers.delete" => Some(respond(req, teachers_delete(state, req))),
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(respond(req, subjects_create(state, req))),
        "subjects.delete" => Some(respond(req, subjects_delete(state, req))),
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(respond(req, classes_create(state, req))),
        "classes.delete" => Some(respond(req, classes_delete(state, req))),
        _ => None,
    }
}
