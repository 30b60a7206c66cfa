use crate::config::SchoolConfig;
use crate::model::Student;
use crate::schedule::{Schedule, ScheduleEntry};
use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub student_id: String,
    pub student: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub date: String,
    pub status: String,
}

fn to_csv<I, R>(header: &[&str], rows: I) -> anyhow::Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(header).context("failed to write CSV header")?;
    for row in rows {
        w.write_record(row).context("failed to write CSV row")?;
    }
    let bytes = w.into_inner().context("failed to flush CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

pub fn schedule_csv(entries: &[ScheduleEntry]) -> anyhow::Result<String> {
    to_csv(
        &["Day", "Time", "Class", "Teacher", "Subject"],
        entries.iter().map(|e| {
            [
                e.day.as_str(),
                e.time_slot.as_str(),
                e.class_label.as_str(),
                e.teacher.as_str(),
                e.subject.as_str(),
            ]
        }),
    )
}

pub fn students_csv(students: &[Student]) -> anyhow::Result<String> {
    to_csv(
        &["Name", "Class", "Marks", "Year", "Enrollment Date"],
        students.iter().map(|s| {
            [
                s.name.clone(),
                s.class_name.clone(),
                s.marks.to_string(),
                s.year.to_string(),
                s.enrollment_date.clone(),
            ]
        }),
    )
}

pub fn attendance_csv(rows: &[AttendanceRow]) -> anyhow::Result<String> {
    to_csv(
        &["Student", "Class", "Date", "Status"],
        rows.iter().map(|r| {
            [
                r.student.as_str(),
                r.class_name.as_str(),
                r.date.as_str(),
                r.status.as_str(),
            ]
        }),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Printable timetable: one table per class, slots down, days across.
pub fn schedule_html(schedule: &Schedule, config: &SchoolConfig, generated_at: &str) -> String {
    let mut classes: Vec<&str> = Vec::new();
    let mut cells: HashMap<(&str, &str, &str), &ScheduleEntry> = HashMap::new();
    for e in &schedule.entries {
        if !classes.contains(&e.class_label.as_str()) {
            classes.push(e.class_label.as_str());
        }
        cells.insert((e.day.as_str(), e.time_slot.as_str(), e.class_label.as_str()), e);
    }

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>School Timetable</title>\n<style>\n");
    html.push_str("body { font-family: sans-serif; }\n");
    html.push_str("table { border-collapse: collapse; margin-bottom: 24px; }\n");
    html.push_str("th, td { border: 1px solid #444; padding: 4px 8px; text-align: center; }\n");
    html.push_str("td.lunch { background: #eee; font-style: italic; }\n");
    html.push_str("</style>\n</head>\n<body>\n<h1>School Timetable</h1>\n");
    let _ = writeln!(html, "<p>Generated {}</p>", escape_html(generated_at));

    for class in classes {
        let _ = writeln!(html, "<h2>{}</h2>\n<table>\n<tr><th>Time</th>", escape_html(class));
        for day in &config.days {
            let _ = write!(html, "<th>{}</th>", escape_html(day));
        }
        html.push_str("</tr>\n");

        for slot in &config.time_slots {
            let _ = write!(html, "<tr><th>{}</th>", escape_html(slot));
            if *slot == config.lunch_slot {
                let _ = write!(
                    html,
                    "<td class=\"lunch\" colspan=\"{}\">Lunch</td>",
                    config.days.len()
                );
            } else {
                for day in &config.days {
                    match cells.get(&(day.as_str(), slot.as_str(), class)) {
                        Some(e) => {
                            let _ = write!(
                                html,
                                "<td>{}<br>{}</td>",
                                escape_html(&e.subject),
                                escape_html(&e.teacher)
                            );
                        }
                        None => html.push_str("<td></td>"),
                    }
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub fn write_export(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: &str, slot: &str, class: &str, teacher: &str, subject: &str) -> ScheduleEntry {
        ScheduleEntry {
            day: day.into(),
            time_slot: slot.into(),
            class_label: class.into(),
            teacher: teacher.into(),
            subject: subject.into(),
        }
    }

    #[test]
    fn schedule_csv_has_literal_header_and_quotes_commas() {
        let csv = schedule_csv(&[
            entry("Monday", "08:00-09:00", "10A", "Rivera, M.", "Maths"),
            entry("Monday", "09:00-10:00", "10A", "Okafor", "Art"),
        ])
        .expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Day,Time,Class,Teacher,Subject");
        assert_eq!(lines[1], "Monday,08:00-09:00,10A,\"Rivera, M.\",Maths");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn students_csv_rows() {
        let csv = students_csv(&[Student {
            id: "x".into(),
            name: "Ada".into(),
            class_name: "10A".into(),
            marks: 91.5,
            year: 2,
            enrollment_date: "2024-09-01".into(),
        }])
        .expect("csv");
        assert_eq!(
            csv,
            "Name,Class,Marks,Year,Enrollment Date\nAda,10A,91.5,2,2024-09-01\n"
        );
    }

    #[test]
    fn html_has_one_table_per_class_and_lunch_row() {
        let config = SchoolConfig {
            days: vec!["Mon".into(), "Tue".into()],
            time_slots: vec!["A".into(), "L".into()],
            lunch_slot: "L".into(),
            max_subjects_per_teacher: 3,
        };
        let schedule = Schedule {
            entries: vec![
                entry("Mon", "A", "10A", "Rivera", "Maths"),
                entry("Tue", "A", "10A", "Rivera", "Maths"),
                entry("Mon", "A", "<9B>", "Okafor", "Art & Design"),
                entry("Tue", "A", "<9B>", "Okafor", "Art & Design"),
            ],
            assignments: Vec::new(),
            seed: None,
        };
        let html = schedule_html(&schedule, &config, "2025-01-01 08:00");
        assert_eq!(html.matches("<table>").count(), 2);
        assert_eq!(html.matches(">Lunch</td>").count(), 2);
        assert!(html.contains("<h2>&lt;9B&gt;</h2>"));
        assert!(html.contains("<td>Art &amp; Design<br>Okafor</td>"));
        assert!(!html.contains("<9B>"));
    }
}
