//! Per-student progress reports built from notes and attendance.

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::Date;

use crate::error::{CenterError, CenterResult};
use crate::models::note::QUICK_RATING_SENTINEL;

/// How far back the report looks, in days.
pub const REPORT_WINDOW_DAYS: i32 = 30;
/// Longest note excerpt kept in a digest line, in characters.
pub const DIGEST_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub group_id: i64,
    pub group_name: String,
    pub note_date: Date,
    pub note_text: String,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupAttendanceRow {
    pub group_id: i64,
    pub group_name: String,
    pub present_count: i64,
    pub late_count: i64,
    pub absent_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub group_id: i64,
    pub group_name: String,
    pub ratings_count: i64,
    /// `None` when no rating was given in the window
    pub avg_rating: Option<f64>,
    /// One `YYYY-MM-DD : text` line per note, newest first
    pub notes: String,
    pub present_count: i64,
    pub late_count: i64,
    pub absent_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student_id: i64,
    pub overall_rating: f64,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub name: String,
    pub presence_days: i64,
    pub absence_days: i64,
    pub late_days: i64,
    pub total_notes: i64,
}

impl GroupReport {
    fn empty(group_id: i64, group_name: &str) -> Self {
        Self {
            group_id,
            group_name: group_name.to_owned(),
            ratings_count: 0,
            avg_rating: None,
            notes: String::new(),
            present_count: 0,
            late_count: 0,
            absent_count: 0,
        }
    }
}

impl StudentReport {
    pub async fn for_student(student_id: i64, pool: &PgPool) -> CenterResult<Self> {
        let notes = sqlx::query_as::<_, NoteRow>(
            "SELECT g.group_id, g.name AS group_name, sn.note_date, sn.note_text, sn.rating
             FROM student_notes sn
             JOIN schedule s ON sn.schedule_id = s.schedule_id
             JOIN study_groups g ON s.group_id = g.group_id
             WHERE sn.student_id = $1 AND sn.note_date >= CURRENT_DATE - $2
             ORDER BY sn.note_date DESC",
        )
        .bind(student_id)
        .bind(REPORT_WINDOW_DAYS)
        .fetch_all(pool)
        .await?;

        let attendance = sqlx::query_as::<_, GroupAttendanceRow>(
            "SELECT g.group_id, g.name AS group_name,
                    COUNT(*) FILTER (WHERE a.status = 'present') AS present_count,
                    COUNT(*) FILTER (WHERE a.status = 'late') AS late_count,
                    COUNT(*) FILTER (WHERE a.status = 'absent') AS absent_count
             FROM attendance a
             JOIN schedule s ON a.schedule_id = s.schedule_id
             JOIN study_groups g ON s.group_id = g.group_id
             WHERE a.student_id = $1 AND a.attendance_date >= CURRENT_DATE - $2
             GROUP BY g.group_id, g.name",
        )
        .bind(student_id)
        .bind(REPORT_WINDOW_DAYS)
        .fetch_all(pool)
        .await?;

        Ok(Self::assemble(student_id, notes, attendance))
    }

    /// Folds the raw rows into per-group entries, ordered by group name.
    ///
    /// Digest lines carrying the quick-rating tag are left out, but their
    /// ratings still count toward the averages. The overall rating is the plain mean of the group
    /// averages, over the groups that have one.
    pub fn assemble(
        student_id: i64,
        mut notes: Vec<NoteRow>,
        attendance: Vec<GroupAttendanceRow>,
    ) -> Self {
        notes.sort_by(|a, b| b.note_date.cmp(&a.note_date));

        let mut groups: BTreeMap<i64, GroupReport> = BTreeMap::new();
        let mut ratings: BTreeMap<i64, Vec<i32>> = BTreeMap::new();
        let mut digests: BTreeMap<i64, Vec<String>> = BTreeMap::new();

        for note in notes {
            groups
                .entry(note.group_id)
                .or_insert_with(|| GroupReport::empty(note.group_id, &note.group_name));
            if let Some(rating) = note.rating {
                ratings.entry(note.group_id).or_default().push(rating);
            }
            let digest = digest_line(note.note_date, &note.note_text);
            digests.entry(note.group_id).or_default().extend(
                digest
                    .split('\n')
                    .filter(|line| !line.contains(QUICK_RATING_SENTINEL))
                    .map(str::to_owned),
            );
        }

        for row in attendance {
            let group = groups
                .entry(row.group_id)
                .or_insert_with(|| GroupReport::empty(row.group_id, &row.group_name));
            group.present_count = row.present_count;
            group.late_count = row.late_count;
            group.absent_count = row.absent_count;
        }

        for (group_id, group) in groups.iter_mut() {
            if let Some(values) = ratings.get(group_id) {
                group.ratings_count = values.len() as i64;
                group.avg_rating = mean(values.iter().map(|&rating| f64::from(rating)));
            }
            if let Some(lines) = digests.get(group_id) {
                group.notes = lines.join("\n");
            }
        }

        let mut groups: Vec<GroupReport> = groups.into_values().collect();
        groups.sort_by(|a, b| a.group_name.cmp(&b.group_name));

        let overall_rating = mean(groups.iter().filter_map(|group| group.avg_rating)).unwrap_or(0.0);

        Self {
            student_id,
            overall_rating,
            groups,
        }
    }

    pub async fn summary(student_id: i64, pool: &PgPool) -> CenterResult<ReportSummary> {
        sqlx::query_as::<_, ReportSummary>(
            "SELECT st.name,
                    (SELECT COUNT(*) FROM attendance
                     WHERE student_id = st.student_id AND status = 'present') AS presence_days,
                    (SELECT COUNT(*) FROM attendance
                     WHERE student_id = st.student_id AND status = 'absent') AS absence_days,
                    (SELECT COUNT(*) FROM attendance
                     WHERE student_id = st.student_id AND status = 'late') AS late_days,
                    (SELECT COUNT(*) FROM student_notes
                     WHERE student_id = st.student_id) AS total_notes
             FROM students st
             WHERE st.student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No student with id {}", student_id)))
    }
}

fn digest_line(date: Date, text: &str) -> String {
    let excerpt: String = text.chars().take(DIGEST_EXCERPT_CHARS).collect();
    format!(
        "{:04}-{:02}-{:02} : {}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        excerpt
    )
}

/// Mean rounded to two decimals, `None` for an empty input.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(round_to_cents(sum / f64::from(count)))
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
