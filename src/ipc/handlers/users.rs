use crate::ipc::error::ok;
use crate::ipc::helpers::{required_str, respond, store, store_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::User;
use serde_json::json;

/// Users without their password digest.
fn public_user(u: &User) -> serde_json::Value {
    json!({
        "name": u.name,
        "username": u.username,
        "role": u.role,
    })
}

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(store) = store(state) else {
        return ok(&req.id, json!({ "users": [] }));
    };
    let users: Vec<serde_json::Value> = store.users().iter().map(public_user).collect();
    ok(&req.id, json!({ "users": users }))
}

fn users_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(req, "name")?;
    let username = required_str(req, "username")?;
    let password = required_str(req, "password")?;
    let role = required_str(req, "role")?;
    let user = store_mut(state)?.add_user(name, username, password, role)?;
    log::info!("user added: {}", user.username);
    Ok(json!({ "user": public_user(&user) }))
}

fn users_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let username = required_str(req, "username")?;
    let removed = store_mut(state)?.remove_user(username)?;
    Ok(json!({ "removed": public_user(&removed) }))
}

fn auth_login(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let username = required_str(req, "username")?;
    let password = required_str(req, "password")?;
    let user = store(state)?.login(username, password)?;
    Ok(json!({ "user": public_user(user) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.list" => Some(handle_users_list(state, req)),
        "users.create" => Some(respond(req, users_create(state, req))),
        "users.delete" => Some(respond(req, users_delete(state, req))),
        "auth.login" => Some(respond(req, auth_login(state, req))),
        _ => None,
    }
}
