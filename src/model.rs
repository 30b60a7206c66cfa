use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub name: String,
    /// Filled in by schedule generation; empty until the first run.
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Teacher {
    pub fn matches_key(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key) || self.name == key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub id: String,
}

impl SchoolClass {
    /// Label used in schedule entries: `"10A (Grade 10)"`, or the bare name
    /// when no grade is recorded.
    pub fn label(&self) -> String {
        if self.grade.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.grade)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub marks: f64,
    #[serde(default = "default_year")]
    pub year: i64,
    #[serde(default)]
    pub enrollment_date: String,
}

fn default_year() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("marks must be between 0 and 100 (got {0})")]
    MarksOutOfRange(String),
    #[error("year must be between 1 and 4 (got {0})")]
    YearOutOfRange(i64),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl Student {
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.name.trim().is_empty() {
            return Err(RecordError::EmptyField("name"));
        }
        if self.class_name.trim().is_empty() {
            return Err(RecordError::EmptyField("class"));
        }
        if self.enrollment_date.trim().is_empty() {
            return Err(RecordError::EmptyField("enrollmentDate"));
        }
        if !(0.0..=100.0).contains(&self.marks) {
            return Err(RecordError::MarksOutOfRange(self.marks.to_string()));
        }
        if !(1..=4).contains(&self.year) {
            return Err(RecordError::YearOutOfRange(self.year));
        }
        Ok(())
    }
}

/// Partial update for a student record. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub marks: Option<f64>,
    pub year: Option<i64>,
    pub enrollment_date: Option<String>,
}

impl StudentPatch {
    pub fn apply_to(&self, s: &mut Student) {
        if let Some(v) = &self.name {
            s.name = v.trim().to_string();
        }
        if let Some(v) = &self.class_name {
            s.class_name = v.trim().to_string();
        }
        if let Some(v) = self.marks {
            s.marks = v;
        }
        if let Some(v) = self.year {
            s.year = v;
        }
        if let Some(v) = &self.enrollment_date {
            s.enrollment_date = v.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Staff,
}

impl Role {
    pub fn parse(s: &str) -> Result<Role, RecordError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "staff" => Ok(Role::Staff),
            other => Err(RecordError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub username: String,
    /// Hex SHA-256 digest, see `auth::hash_password`.
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn parse(s: &str) -> Option<AttendanceStatus> {
        let s = s.trim().to_ascii_lowercase();
        AttendanceStatus::ALL.into_iter().find(|v| v.as_str() == s)
    }
}
