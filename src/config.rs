use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchoolConfig {
    pub days: Vec<String>,
    pub time_slots: Vec<String>,
    pub lunch_slot: String,
    pub max_subjects_per_teacher: usize,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                .into_iter()
                .map(String::from)
                .collect(),
            time_slots: [
                "08:00-09:00",
                "09:00-10:00",
                "10:00-11:00",
                "11:00-12:00",
                "12:00-13:00",
                "13:00-14:00",
                "14:00-15:00",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            lunch_slot: "12:00-13:00".to_string(),
            max_subjects_per_teacher: 3,
        }
    }
}

impl SchoolConfig {
    /// Slots that receive assignments, in configured order.
    pub fn teaching_slots(&self) -> impl Iterator<Item = &str> {
        self.time_slots
            .iter()
            .map(String::as_str)
            .filter(move |s| *s != self.lunch_slot)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.days.is_empty() || self.days.iter().any(|d| d.trim().is_empty()) {
            return Err("days must be a non-empty list of non-empty labels".to_string());
        }
        if self.time_slots.iter().any(|s| s.trim().is_empty()) {
            return Err("time slot labels must not be empty".to_string());
        }
        // Each (day, slot) pair is one timetable cell.
        if let Some(d) = first_repeat(&self.days) {
            return Err(format!("day {d:?} is listed more than once"));
        }
        if let Some(s) = first_repeat(&self.time_slots) {
            return Err(format!("time slot {s:?} is listed more than once"));
        }
        if !self.time_slots.contains(&self.lunch_slot) {
            return Err(format!(
                "lunch slot {:?} is not one of the time slots",
                self.lunch_slot
            ));
        }
        if self.teaching_slots().next().is_none() {
            return Err("at least one non-lunch time slot is required".to_string());
        }
        if self.max_subjects_per_teacher == 0 {
            return Err("maxSubjectsPerTeacher must be at least 1".to_string());
        }
        Ok(())
    }
}

fn first_repeat(labels: &[String]) -> Option<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    labels
        .iter()
        .map(String::as_str)
        .find(|l| !seen.insert(*l))
}

/// Reads `config.json` from the workspace. A missing file yields defaults.
pub fn load_config(workspace: &Path) -> anyhow::Result<SchoolConfig> {
    let path = workspace.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(SchoolConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid config", path.to_string_lossy()))
}

pub fn save_config(workspace: &Path, cfg: &SchoolConfig) -> anyhow::Result<()> {
    let path = workspace.join(CONFIG_FILE);
    let text = serde_json::to_string_pretty(cfg).context("failed to serialize config")?;
    std::fs::write(&path, text)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_skip_lunch() {
        let cfg = SchoolConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        let slots: Vec<&str> = cfg.teaching_slots().collect();
        assert_eq!(slots.len(), cfg.time_slots.len() - 1);
        assert!(!slots.contains(&"12:00-13:00"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SchoolConfig =
            serde_json::from_str(r#"{"days":["Mon","Tue"]}"#).expect("parse config");
        assert_eq!(cfg.days, vec!["Mon", "Tue"]);
        assert_eq!(cfg.lunch_slot, "12:00-13:00");
        assert_eq!(cfg.max_subjects_per_teacher, 3);
    }

    #[test]
    fn lunch_must_be_a_slot() {
        let cfg = SchoolConfig {
            lunch_slot: "noon".into(),
            ..SchoolConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn lunch_only_is_rejected() {
        let cfg = SchoolConfig {
            time_slots: vec!["12:00-13:00".into()],
            ..SchoolConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn repeated_labels_are_rejected() {
        let cfg = SchoolConfig {
            days: vec!["Mon".into(), "Mon".into()],
            time_slots: vec!["A".into(), "L".into()],
            lunch_slot: "L".into(),
            ..SchoolConfig::default()
        };
        let err = cfg.validate().expect_err("repeated day");
        assert!(err.contains("Mon"), "{err}");

        let cfg = SchoolConfig {
            days: vec!["Mon".into()],
            time_slots: vec!["A".into(), "L".into(), "L".into()],
            lunch_slot: "L".into(),
            ..SchoolConfig::default()
        };
        let err = cfg.validate().expect_err("repeated slot");
        assert!(err.contains("\"L\""), "{err}");
    }
}
