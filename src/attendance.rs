use crate::model::AttendanceStatus;
use anyhow::anyhow;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn mark(
    conn: &Connection,
    student_id: &str,
    date: NaiveDate,
    status: AttendanceStatus,
) -> anyhow::Result<()> {
    let now = chrono::Local::now().to_rfc3339();
    conn.execute(
        "INSERT INTO attendance(student_id, date, status, updated_at)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_id, date) DO UPDATE SET
           status = excluded.status,
           updated_at = excluded.updated_at",
        (student_id, date.to_string(), status.as_str(), now),
    )?;
    Ok(())
}

/// `(student_id, status)` pairs recorded for one date.
pub fn records_for_date(
    conn: &Connection,
    date: NaiveDate,
) -> anyhow::Result<Vec<(String, AttendanceStatus)>> {
    let mut stmt = conn.prepare(
        "SELECT student_id, status FROM attendance WHERE date = ? ORDER BY student_id",
    )?;
    let rows = stmt
        .query_map([date.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(sid, raw)| {
            AttendanceStatus::parse(&raw)
                .map(|st| (sid, st))
                .ok_or_else(|| anyhow!("unknown attendance status in database: {raw}"))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub excused: u32,
    pub total: u32,
    /// Present and late days over all recorded days; 0 with no records.
    pub rate: f64,
}

pub fn summary(conn: &Connection, student_id: &str) -> anyhow::Result<AttendanceSummary> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM attendance WHERE student_id = ? GROUP BY status",
    )?;
    let counts = stmt
        .query_map([student_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = AttendanceSummary::default();
    for (raw, n) in counts {
        let n = u32::try_from(n).unwrap_or(u32::MAX);
        match AttendanceStatus::parse(&raw) {
            Some(AttendanceStatus::Present) => out.present += n,
            Some(AttendanceStatus::Absent) => out.absent += n,
            Some(AttendanceStatus::Late) => out.late += n,
            Some(AttendanceStatus::Excused) => out.excused += n,
            None => continue,
        }
        out.total += n;
    }
    if out.total > 0 {
        out.rate = f64::from(out.present + out.late) / f64::from(out.total);
    }
    Ok(out)
}

pub fn delete_student(conn: &Connection, student_id: &str) -> anyhow::Result<usize> {
    Ok(conn.execute("DELETE FROM attendance WHERE student_id = ?", [student_id])?)
}
