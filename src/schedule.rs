//! Randomized timetable generation.
//!
//! Generation is a pure function of the roster, the config and the RNG: every
//! (day, slot, class) outside the lunch slot gets one independently drawn
//! teacher/subject pair. Nothing prevents a teacher from being drawn for two
//! classes in the same slot; `double_bookings` reports those collisions.

use crate::config::SchoolConfig;
use crate::model::{SchoolClass, Subject, Teacher};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Generator input.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub classes: Vec<SchoolClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day: String,
    pub time_slot: String,
    #[serde(rename = "class")]
    pub class_label: String,
    pub teacher: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSubjects {
    pub teacher: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
    pub assignments: Vec<TeacherSubjects>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleBooking {
    pub day: String,
    pub time_slot: String,
    pub teacher: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("incomplete data: no {}", .missing.join(", no "))]
    IncompleteData { missing: Vec<&'static str> },
    #[error("invalid schedule config: {0}")]
    BadConfig(String),
}

impl ScheduleError {
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::IncompleteData { .. } => "incomplete_data",
            ScheduleError::BadConfig(_) => "bad_config",
        }
    }
}

fn check_inputs(roster: &Roster, config: &SchoolConfig) -> Result<(), ScheduleError> {
    let mut missing = Vec::new();
    if roster.teachers.is_empty() {
        missing.push("teachers");
    }
    if roster.subjects.is_empty() {
        missing.push("subjects");
    }
    if roster.classes.is_empty() {
        missing.push("classes");
    }
    if !missing.is_empty() {
        return Err(ScheduleError::IncompleteData { missing });
    }
    config.validate().map_err(ScheduleError::BadConfig)
}

/// Draws each teacher's teachable subjects for one run: a count in
/// `[1, min(max, subjects)]`, then the first `count` of a shuffled copy.
fn draw_teacher_subjects<R: Rng + ?Sized>(
    teachers: &[Teacher],
    subjects: &[Subject],
    max_per_teacher: usize,
    rng: &mut R,
) -> Vec<TeacherSubjects> {
    let upper = max_per_teacher.min(subjects.len());
    teachers
        .iter()
        .map(|t| {
            let count = rng.random_range(1..=upper);
            let mut pool: Vec<&str> = subjects.iter().map(|s| s.name.as_str()).collect();
            pool.shuffle(rng);
            TeacherSubjects {
                teacher: t.name.clone(),
                subjects: pool.into_iter().take(count).map(String::from).collect(),
            }
        })
        .collect()
}

pub fn generate<R: Rng + ?Sized>(
    roster: &Roster,
    config: &SchoolConfig,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    check_inputs(roster, config)?;

    let assignments = draw_teacher_subjects(
        &roster.teachers,
        &roster.subjects,
        config.max_subjects_per_teacher,
        rng,
    );
    let labels: Vec<String> = roster.classes.iter().map(SchoolClass::label).collect();

    let mut entries = Vec::with_capacity(
        config.days.len() * config.teaching_slots().count() * labels.len(),
    );
    for day in &config.days {
        for slot in config.teaching_slots() {
            for label in &labels {
                let pick = &assignments[rng.random_range(0..assignments.len())];
                let subject = &pick.subjects[rng.random_range(0..pick.subjects.len())];
                entries.push(ScheduleEntry {
                    day: day.clone(),
                    time_slot: slot.to_string(),
                    class_label: label.clone(),
                    teacher: pick.teacher.clone(),
                    subject: subject.clone(),
                });
            }
        }
    }

    Ok(Schedule {
        entries,
        assignments,
        seed: None,
    })
}

/// Runs `generate` with a `StdRng`; a fixed seed reproduces the same draw
/// sequence and therefore the same schedule.
pub fn generate_with_seed(
    roster: &Roster,
    config: &SchoolConfig,
    seed: Option<u64>,
) -> Result<Schedule, ScheduleError> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let mut schedule = generate(roster, config, &mut rng)?;
    schedule.seed = seed;
    Ok(schedule)
}

/// Every (day, slot, teacher) placed in more than one class, in order of
/// first appearance.
pub fn double_bookings(entries: &[ScheduleEntry]) -> Vec<DoubleBooking> {
    let mut index: HashMap<(&str, &str, &str), usize> = HashMap::new();
    let mut groups: Vec<DoubleBooking> = Vec::new();
    for e in entries {
        let key = (e.day.as_str(), e.time_slot.as_str(), e.teacher.as_str());
        match index.get(&key) {
            Some(&i) => groups[i].classes.push(e.class_label.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(DoubleBooking {
                    day: e.day.clone(),
                    time_slot: e.time_slot.clone(),
                    teacher: e.teacher.clone(),
                    classes: vec![e.class_label.clone()],
                });
            }
        }
    }
    groups.retain(|g| g.classes.len() > 1);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn roster(teachers: usize, subjects: usize, classes: usize) -> Roster {
        Roster {
            teachers: (0..teachers)
                .map(|i| Teacher {
                    name: format!("Teacher {i}"),
                    subjects: Vec::new(),
                    id: Some(format!("t{i}")),
                })
                .collect(),
            subjects: (0..subjects)
                .map(|i| Subject {
                    name: format!("Subject {i}"),
                    id: format!("s{i}"),
                })
                .collect(),
            classes: (0..classes)
                .map(|i| SchoolClass {
                    name: format!("Class {i}"),
                    grade: if i % 2 == 0 { "Grade 9".into() } else { String::new() },
                    id: format!("c{i}"),
                })
                .collect(),
        }
    }

    #[test]
    fn covers_every_non_lunch_slot() {
        let cfg = SchoolConfig::default();
        for (t, s, c) in [(1, 1, 1), (3, 5, 2), (7, 2, 4), (2, 10, 6)] {
            let r = roster(t, s, c);
            let sched = generate_with_seed(&r, &cfg, Some(42)).expect("generate");
            assert_eq!(
                sched.entries.len(),
                cfg.days.len() * (cfg.time_slots.len() - 1) * c
            );
            assert!(sched.entries.iter().all(|e| e.time_slot != cfg.lunch_slot));

            let mut cells = HashSet::new();
            for e in &sched.entries {
                assert!(cells.insert((&e.day, &e.time_slot, &e.class_label)));
            }
        }
    }

    #[test]
    fn entries_draw_from_teacher_subsets() {
        let cfg = SchoolConfig::default();
        let r = roster(4, 6, 3);
        for seed in 0..20u64 {
            let sched = generate_with_seed(&r, &cfg, Some(seed)).expect("generate");
            let by_teacher: HashMap<&str, &Vec<String>> = sched
                .assignments
                .iter()
                .map(|a| (a.teacher.as_str(), &a.subjects))
                .collect();
            assert_eq!(by_teacher.len(), 4);
            for a in &sched.assignments {
                assert!((1..=3).contains(&a.subjects.len()));
                let unique: HashSet<&String> = a.subjects.iter().collect();
                assert_eq!(unique.len(), a.subjects.len());
            }
            for e in &sched.entries {
                let allowed = by_teacher.get(e.teacher.as_str()).expect("known teacher");
                assert!(allowed.contains(&e.subject));
            }
        }
    }

    #[test]
    fn subset_size_is_capped_by_subject_count() {
        let cfg = SchoolConfig::default();
        let r = roster(5, 1, 1);
        let sched = generate_with_seed(&r, &cfg, Some(3)).expect("generate");
        assert!(sched.assignments.iter().all(|a| a.subjects == vec!["Subject 0"]));
    }

    #[test]
    fn same_seed_same_schedule() {
        let cfg = SchoolConfig::default();
        let r = roster(3, 4, 2);
        let a = generate_with_seed(&r, &cfg, Some(7)).expect("generate");
        let b = generate_with_seed(&r, &cfg, Some(7)).expect("generate");
        assert_eq!(a, b);
        assert_eq!(a.seed, Some(7));
    }

    #[test]
    fn empty_lists_report_incomplete_data() {
        let cfg = SchoolConfig::default();
        let mut r = roster(0, 2, 2);
        let e = generate_with_seed(&r, &cfg, Some(1)).expect_err("no teachers");
        assert_eq!(
            e,
            ScheduleError::IncompleteData {
                missing: vec!["teachers"]
            }
        );
        assert_eq!(e.code(), "incomplete_data");

        r.classes.clear();
        let e = generate_with_seed(&r, &cfg, Some(1)).expect_err("no teachers or classes");
        assert_eq!(e.to_string(), "incomplete data: no teachers, no classes");
    }

    #[test]
    fn bad_config_is_reported() {
        let cfg = SchoolConfig {
            days: Vec::new(),
            ..SchoolConfig::default()
        };
        let e = generate_with_seed(&roster(1, 1, 1), &cfg, None).expect_err("no days");
        assert_eq!(e.code(), "bad_config");
    }

    #[test]
    fn class_labels_carry_grade() {
        let cfg = SchoolConfig::default();
        let sched = generate_with_seed(&roster(1, 1, 2), &cfg, Some(0)).expect("generate");
        let labels: HashSet<&str> = sched.entries.iter().map(|e| e.class_label.as_str()).collect();
        assert!(labels.contains("Class 0 (Grade 9)"));
        assert!(labels.contains("Class 1"));
    }

    #[test]
    fn single_teacher_many_classes_is_double_booked() {
        let cfg = SchoolConfig::default();
        let sched = generate_with_seed(&roster(1, 2, 3), &cfg, Some(11)).expect("generate");
        let clashes = double_bookings(&sched.entries);
        assert_eq!(clashes.len(), cfg.days.len() * (cfg.time_slots.len() - 1));
        assert!(clashes.iter().all(|c| c.classes.len() == 3));
    }

    #[test]
    fn one_class_never_double_books() {
        let cfg = SchoolConfig::default();
        let sched = generate_with_seed(&roster(3, 3, 1), &cfg, Some(5)).expect("generate");
        assert!(double_bookings(&sched.entries).is_empty());
    }
}
