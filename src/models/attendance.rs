use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::Date;

use crate::error::{CenterError, CenterResult};
use crate::util::{require_date, require_number, require_text, LooseNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = CenterError;

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status.trim().to_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "late" => Ok(AttendanceStatus::Late),
            "absent" => Ok(AttendanceStatus::Absent),
            other => Err(CenterError::Validation(format!(
                "status must be present, late or absent, not `{}`",
                other
            ))),
        }
    }
}

/// A student's status in one slot on one date.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub status: String,
}

/// Status counts over some window.
#[derive(Debug, Default, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCounts {
    pub present_count: i64,
    pub absent_count: i64,
    pub late_count: i64,
}

/// The body for marking attendance.
///
/// ## Expected Format:
///
/// |     Field      |       Type       | Required? |
/// |----------------|------------------|:---------:|
/// | scheduleId     | number or string |     ✓     |
/// | studentId      | number or string |     ✓     |
/// | status         | string           |     ✓     |
/// | attendanceDate | `YYYY-MM-DD`     |     ✓     |
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub schedule_id: Option<LooseNumber>,
    pub student_id: Option<LooseNumber>,
    pub status: Option<String>,
    pub attendance_date: Option<String>,
}

/// A mark that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidMark {
    pub schedule_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub date: Date,
}

impl AttendanceMark {
    pub fn validate(&self) -> CenterResult<ValidMark> {
        Ok(ValidMark {
            schedule_id: require_number(self.schedule_id.as_ref(), "scheduleId")?,
            student_id: require_number(self.student_id.as_ref(), "studentId")?,
            status: require_text(self.status.as_deref(), "status")?.parse()?,
            date: require_date(self.attendance_date.as_deref(), "attendanceDate")?,
        })
    }
}

pub struct Attendance;

impl Attendance {
    /// Writes the status for `(slot, student, date)`, replacing any status
    /// already recorded for that key.
    pub async fn record(mark: ValidMark, pool: &PgPool) -> CenterResult<()> {
        sqlx::query(
            "INSERT INTO attendance (schedule_id, student_id, attendance_date, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (schedule_id, student_id, attendance_date)
             DO UPDATE SET status = EXCLUDED.status",
        )
        .bind(mark.schedule_id)
        .bind(mark.student_id)
        .bind(mark.date)
        .bind(mark.status.as_str())
        .execute(pool)
        .await
        .map_err(CenterError::conflict(format!(
            "Slot {} or student {} doesn't exist",
            mark.schedule_id, mark.student_id
        )))?;

        tracing::debug!(
            schedule_id = mark.schedule_id,
            student_id = mark.student_id,
            status = %mark.status,
            "recorded attendance"
        );
        Ok(())
    }

    pub async fn for_slot_on(
        schedule_id: i64,
        date: Date,
        pool: &PgPool,
    ) -> CenterResult<Vec<AttendanceEntry>> {
        sqlx::query_as::<_, AttendanceEntry>(
            "SELECT student_id, status FROM attendance
             WHERE schedule_id = $1 AND attendance_date = $2
             ORDER BY student_id",
        )
        .bind(schedule_id)
        .bind(date)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// The student's counts over the last 30 days.
    pub async fn recent_counts(student_id: i64, pool: &PgPool) -> CenterResult<AttendanceCounts> {
        sqlx::query_as::<_, AttendanceCounts>(
            "SELECT
                 COUNT(*) FILTER (WHERE status = 'present') AS present_count,
                 COUNT(*) FILTER (WHERE status = 'absent') AS absent_count,
                 COUNT(*) FILTER (WHERE status = 'late') AS late_count
             FROM attendance
             WHERE student_id = $1 AND attendance_date >= CURRENT_DATE - 30",
        )
        .bind(student_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("Present".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert_eq!(" late ".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Late);
        assert!("excused".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn marks_accept_string_ids() {
        let mark: AttendanceMark = serde_json::from_str(
            r#"{"scheduleId": "5", "studentId": 8, "status": "absent",
                "attendanceDate": "2026-10-18"}"#,
        )
        .unwrap();

        assert_eq!(
            mark.validate().unwrap(),
            ValidMark {
                schedule_id: 5,
                student_id: 8,
                status: AttendanceStatus::Absent,
                date: date!(2026 - 10 - 18),
            }
        );
    }

    #[test]
    fn non_numeric_ids_are_invalid_input() {
        let mark: AttendanceMark = serde_json::from_str(
            r#"{"scheduleId": "abc", "studentId": 8, "status": "present",
                "attendanceDate": "2026-10-18"}"#,
        )
        .unwrap();

        assert!(matches!(mark.validate(), Err(CenterError::Validation(_))));
    }

    #[test]
    fn marks_need_a_real_date() {
        let mark = AttendanceMark {
            schedule_id: Some(LooseNumber::Number(1)),
            student_id: Some(LooseNumber::Number(2)),
            status: Some("present".to_owned()),
            attendance_date: Some("18/10/2026".to_owned()),
        };

        assert!(matches!(mark.validate(), Err(CenterError::Validation(_))));
    }
}
