use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::schedule::ScheduleError;
use crate::store::{RosterStore, StoreError};
use rusqlite::Connection;
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> HandlerErr {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> HandlerErr {
        HandlerErr::new("bad_params", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> HandlerErr {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> HandlerErr {
        // anyhow chains carry the file path in the context; keep it visible.
        let message = match &e {
            StoreError::Io(inner) => format!("{inner:#}"),
            other => other.to_string(),
        };
        HandlerErr::new(e.code(), message)
    }
}

impl From<ScheduleError> for HandlerErr {
    fn from(e: ScheduleError) -> HandlerErr {
        let details = match &e {
            ScheduleError::IncompleteData { missing } => Some(json!({ "missing": missing })),
            ScheduleError::BadConfig(_) => None,
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

pub fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, HandlerErr> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) => Ok(v),
        None => Err(HandlerErr::bad_params(format!("missing {key}"))),
    }
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn store(state: &AppState) -> Result<&RosterStore, HandlerErr> {
    state
        .store
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn store_mut(state: &mut AppState) -> Result<&mut RosterStore, HandlerErr> {
    state
        .store
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn db_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}
