use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::SchoolConfig;
use crate::schedule::Schedule;
use crate::store::RosterStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<RosterStore>,
    pub db: Option<Connection>,
    pub config: SchoolConfig,
    /// Last generated schedule; replaced wholesale by every run.
    pub schedule: Option<Schedule>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            workspace: None,
            store: None,
            db: None,
            config: SchoolConfig::default(),
            schedule: None,
        }
    }
}
