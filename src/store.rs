//! Flat-file roster: one JSON array per record kind, rewritten wholesale on
//! every mutation.

use crate::auth;
use crate::model::{RecordError, Role, SchoolClass, Student, StudentPatch, Subject, Teacher, User};
use crate::schedule::{Roster, TeacherSubjects};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const TEACHERS_FILE: &str = "teachers.json";
pub const SUBJECTS_FILE: &str = "subjects.json";
pub const CLASSES_FILE: &str = "classes.json";
pub const STUDENTS_FILE: &str = "students.json";
pub const USERS_FILE: &str = "users.json";

pub const ROSTER_FILES: [&str; 5] = [
    TEACHERS_FILE,
    SUBJECTS_FILE,
    CLASSES_FILE,
    STUDENTS_FILE,
    USERS_FILE,
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {name:?} already exists")]
    Duplicate { kind: &'static str, name: String },
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error(transparent)]
    Invalid(#[from] RecordError),
    #[error("invalid username or password")]
    AuthFailed,
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Duplicate { .. } => "duplicate",
            StoreError::NotFound { .. } => "not_found",
            StoreError::Invalid(_) => "invalid_record",
            StoreError::AuthFailed => "auth_failed",
            StoreError::Io(_) => "io_failed",
        }
    }
}

fn read_array<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid record array", path.to_string_lossy()))
}

fn write_array<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(items).context("failed to serialize records")?;
    let tmp = path.with_extension("json.saving");
    std::fs::write(&tmp, text)
        .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.to_string_lossy()))
}

fn required(value: &str, field: &'static str) -> Result<String, RecordError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(RecordError::EmptyField(field));
    }
    Ok(v.to_string())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub struct RosterStore {
    dir: PathBuf,
    teachers: Vec<Teacher>,
    subjects: Vec<Subject>,
    classes: Vec<SchoolClass>,
    students: Vec<Student>,
    users: Vec<User>,
}

impl RosterStore {
    pub fn load(dir: &Path) -> anyhow::Result<RosterStore> {
        Ok(RosterStore {
            dir: dir.to_path_buf(),
            teachers: read_array(&dir.join(TEACHERS_FILE))?,
            subjects: read_array(&dir.join(SUBJECTS_FILE))?,
            classes: read_array(&dir.join(CLASSES_FILE))?,
            students: read_array(&dir.join(STUDENTS_FILE))?,
            users: read_array(&dir.join(USERS_FILE))?,
        })
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn classes(&self) -> &[SchoolClass] {
        &self.classes
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn roster(&self) -> Roster {
        Roster {
            teachers: self.teachers.clone(),
            subjects: self.subjects.clone(),
            classes: self.classes.clone(),
        }
    }

    fn save_teachers(&self) -> anyhow::Result<()> {
        write_array(&self.dir.join(TEACHERS_FILE), &self.teachers)
    }

    fn save_subjects(&self) -> anyhow::Result<()> {
        write_array(&self.dir.join(SUBJECTS_FILE), &self.subjects)
    }

    fn save_classes(&self) -> anyhow::Result<()> {
        write_array(&self.dir.join(CLASSES_FILE), &self.classes)
    }

    fn save_students(&self) -> anyhow::Result<()> {
        write_array(&self.dir.join(STUDENTS_FILE), &self.students)
    }

    fn save_users(&self) -> anyhow::Result<()> {
        write_array(&self.dir.join(USERS_FILE), &self.users)
    }

    pub fn add_teacher(&mut self, name: &str) -> Result<Teacher, StoreError> {
        let name = required(name, "name")?;
        if self.teachers.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
            return Err(StoreError::Duplicate {
                kind: "teacher",
                name,
            });
        }
        let teacher = Teacher {
            name,
            subjects: Vec::new(),
            id: Some(new_id()),
        };
        self.teachers.push(teacher.clone());
        self.save_teachers()?;
        Ok(teacher)
    }

    /// Removes by id, or by name for records saved without one.
    pub fn remove_teacher(&mut self, key: &str) -> Result<Teacher, StoreError> {
        let Some(pos) = self.teachers.iter().position(|t| t.matches_key(key)) else {
            return Err(StoreError::NotFound {
                kind: "teacher",
                key: key.to_string(),
            });
        };
        let removed = self.teachers.remove(pos);
        self.save_teachers()?;
        Ok(removed)
    }

    /// Overwrites each teacher's subject list with the draw from the last
    /// generation. Teachers missing from the draw keep what they had.
    pub fn assign_subjects(&mut self, draw: &[TeacherSubjects]) -> Result<(), StoreError> {
        for t in &mut self.teachers {
            if let Some(d) = draw.iter().find(|d| d.teacher == t.name) {
                t.subjects = d.subjects.clone();
            }
        }
        self.save_teachers()?;
        Ok(())
    }

    pub fn add_subject(&mut self, name: &str) -> Result<Subject, StoreError> {
        let name = required(name, "name")?;
        if self.subjects.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
            return Err(StoreError::Duplicate {
                kind: "subject",
                name,
            });
        }
        let subject = Subject { name, id: new_id() };
        self.subjects.push(subject.clone());
        self.save_subjects()?;
        Ok(subject)
    }

    pub fn remove_subject(&mut self, key: &str) -> Result<Subject, StoreError> {
        let Some(pos) = self
            .subjects
            .iter()
            .position(|s| s.id == key || s.name == key)
        else {
            return Err(StoreError::NotFound {
                kind: "subject",
                key: key.to_string(),
            });
        };
        let removed = self.subjects.remove(pos);
        self.save_subjects()?;
        Ok(removed)
    }

    pub fn add_class(&mut self, name: &str, grade: &str) -> Result<SchoolClass, StoreError> {
        let name = required(name, "name")?;
        if self.classes.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
            return Err(StoreError::Duplicate {
                kind: "class",
                name,
            });
        }
        let class = SchoolClass {
            name,
            grade: grade.trim().to_string(),
            id: new_id(),
        };
        self.classes.push(class.clone());
        self.save_classes()?;
        Ok(class)
    }

    pub fn remove_class(&mut self, key: &str) -> Result<SchoolClass, StoreError> {
        let Some(pos) = self
            .classes
            .iter()
            .position(|c| c.id == key || c.name == key)
        else {
            return Err(StoreError::NotFound {
                kind: "class",
                key: key.to_string(),
            });
        };
        let removed = self.classes.remove(pos);
        self.save_classes()?;
        Ok(removed)
    }

    fn student_exists(&self, name: &str, class_name: &str, except_id: Option<&str>) -> bool {
        self.students.iter().any(|s| {
            Some(s.id.as_str()) != except_id
                && s.name.eq_ignore_ascii_case(name)
                && s.class_name.eq_ignore_ascii_case(class_name)
        })
    }

    pub fn add_student(&mut self, mut student: Student) -> Result<Student, StoreError> {
        student.name = student.name.trim().to_string();
        student.class_name = student.class_name.trim().to_string();
        student.enrollment_date = student.enrollment_date.trim().to_string();
        student.validate()?;
        if self.student_exists(&student.name, &student.class_name, None) {
            return Err(StoreError::Duplicate {
                kind: "student",
                name: format!("{} ({})", student.name, student.class_name),
            });
        }
        student.id = new_id();
        self.students.push(student.clone());
        self.save_students()?;
        Ok(student)
    }

    pub fn update_student(&mut self, id: &str, patch: &StudentPatch) -> Result<Student, StoreError> {
        let Some(pos) = self.students.iter().position(|s| s.id == id) else {
            return Err(StoreError::NotFound {
                kind: "student",
                key: id.to_string(),
            });
        };
        let mut updated = self.students[pos].clone();
        patch.apply_to(&mut updated);
        updated.validate()?;
        if self.student_exists(&updated.name, &updated.class_name, Some(id)) {
            return Err(StoreError::Duplicate {
                kind: "student",
                name: format!("{} ({})", updated.name, updated.class_name),
            });
        }
        self.students[pos] = updated.clone();
        self.save_students()?;
        Ok(updated)
    }

    pub fn remove_student(&mut self, id: &str) -> Result<Student, StoreError> {
        let Some(pos) = self.students.iter().position(|s| s.id == id) else {
            return Err(StoreError::NotFound {
                kind: "student",
                key: id.to_string(),
            });
        };
        let removed = self.students.remove(pos);
        self.save_students()?;
        Ok(removed)
    }

    pub fn add_user(
        &mut self,
        name: &str,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<User, StoreError> {
        let name = required(name, "name")?;
        let username = required(username, "username")?;
        if password.is_empty() {
            return Err(RecordError::EmptyField("password").into());
        }
        let role = Role::parse(role)?;
        if self.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Duplicate {
                kind: "user",
                name: username,
            });
        }
        let user = User {
            name,
            username,
            password: auth::hash_password(password),
            role,
        };
        self.users.push(user.clone());
        self.save_users()?;
        Ok(user)
    }

    pub fn remove_user(&mut self, username: &str) -> Result<User, StoreError> {
        let Some(pos) = self.users.iter().position(|u| u.username == username) else {
            return Err(StoreError::NotFound {
                kind: "user",
                key: username.to_string(),
            });
        };
        let removed = self.users.remove(pos);
        self.save_users()?;
        Ok(removed)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<&User, StoreError> {
        self.users
            .iter()
            .find(|u| u.username == username.trim())
            .filter(|u| auth::verify_password(password, &u.password))
            .ok_or(StoreError::AuthFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn student(name: &str, class: &str) -> Student {
        Student {
            id: String::new(),
            name: name.into(),
            class_name: class.into(),
            marks: 71.0,
            year: 3,
            enrollment_date: "2023-09-04".into(),
        }
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = temp_dir("schoold-store-empty");
        let store = RosterStore::load(&dir).expect("load");
        assert!(store.teachers().is_empty());
        assert!(store.users().is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn roster_roundtrips_through_json_files() {
        let dir = temp_dir("schoold-store-roundtrip");
        let mut store = RosterStore::load(&dir).expect("load");
        store.add_teacher("Ms. Rivera").expect("teacher");
        store.add_teacher("Mr. Okafor").expect("teacher");
        store.add_subject("Maths").expect("subject");
        store.add_class("10A", "Grade 10").expect("class");
        store.add_student(student("Ada", "10A")).expect("student");
        store
            .add_user("Admin", "admin", "pw", "admin")
            .expect("user");

        let reloaded = RosterStore::load(&dir).expect("reload");
        assert_eq!(reloaded.teachers(), store.teachers());
        assert_eq!(reloaded.subjects(), store.subjects());
        assert_eq!(reloaded.classes(), store.classes());
        assert_eq!(reloaded.students(), store.students());
        assert_eq!(reloaded.users(), store.users());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn duplicates_are_rejected_by_linear_scan() {
        let dir = temp_dir("schoold-store-dup");
        let mut store = RosterStore::load(&dir).expect("load");
        store.add_teacher("Ms. Rivera").expect("teacher");
        let e = store.add_teacher(" ms. rivera ").expect_err("dup teacher");
        assert_eq!(e.code(), "duplicate");

        store.add_user("A", "amy", "pw", "staff").expect("user");
        let e = store.add_user("B", "amy", "pw2", "teacher").expect_err("dup user");
        assert_eq!(e.code(), "duplicate");

        store.add_student(student("Ada", "10A")).expect("student");
        store.add_student(student("Ada", "10B")).expect("same name other class");
        let e = store.add_student(student("Ada", "10A")).expect_err("dup student");
        assert_eq!(e.code(), "duplicate");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn invalid_records_are_not_saved() {
        let dir = temp_dir("schoold-store-invalid");
        let mut store = RosterStore::load(&dir).expect("load");
        let mut s = student("Ada", "10A");
        s.year = 0;
        assert_eq!(store.add_student(s).expect_err("year").code(), "invalid_record");
        assert_eq!(store.add_teacher("  ").expect_err("blank").code(), "invalid_record");
        assert_eq!(
            store.add_user("A", "a", "pw", "janitor").expect_err("role").code(),
            "invalid_record"
        );
        assert!(!dir.join(STUDENTS_FILE).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn update_student_validates_patch() {
        let dir = temp_dir("schoold-store-update");
        let mut store = RosterStore::load(&dir).expect("load");
        let s = store.add_student(student("Ada", "10A")).expect("student");

        let bad = StudentPatch {
            marks: Some(120.0),
            ..StudentPatch::default()
        };
        assert!(store.update_student(&s.id, &bad).is_err());
        assert_eq!(store.student(&s.id).map(|v| v.marks), Some(71.0));

        let good = StudentPatch {
            marks: Some(95.0),
            year: Some(4),
            ..StudentPatch::default()
        };
        let updated = store.update_student(&s.id, &good).expect("update");
        assert_eq!(updated.marks, 95.0);
        assert_eq!(updated.year, 4);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn passwords_are_stored_hashed() {
        let dir = temp_dir("schoold-store-login");
        let mut store = RosterStore::load(&dir).expect("load");
        store.add_user("Admin", "admin", "hunter2", "admin").expect("user");
        let raw = std::fs::read_to_string(dir.join(USERS_FILE)).expect("read users");
        assert!(!raw.contains("hunter2"));
        assert_eq!(store.login("admin", "hunter2").expect("login").role, Role::Admin);
        assert!(matches!(
            store.login("admin", "nope"),
            Err(StoreError::AuthFailed)
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn generation_draw_is_written_back_to_teachers() {
        let dir = temp_dir("schoold-store-assign");
        let mut store = RosterStore::load(&dir).expect("load");
        store.add_teacher("Ms. Rivera").expect("teacher");
        store
            .assign_subjects(&[TeacherSubjects {
                teacher: "Ms. Rivera".into(),
                subjects: vec!["Maths".into(), "Art".into()],
            }])
            .expect("assign");
        let reloaded = RosterStore::load(&dir).expect("reload");
        assert_eq!(reloaded.teachers()[0].subjects, vec!["Maths", "Art"]);
        let _ = std::fs::remove_dir_all(dir);
    }
}
