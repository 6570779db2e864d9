//! Attendance, notes and student reports.

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

use super::basic_success;
use crate::error::CenterResult;
use crate::extract::ApiJson;
use crate::models::attendance::{Attendance, AttendanceCounts, AttendanceEntry, AttendanceMark};
use crate::models::note::{NoteInput, StudentNote};
use crate::models::report::{ReportSummary, StudentReport};
use crate::util::{parse_id, require_date, require_id};

/// Mark a student's attendance in a slot.
///
/// ## Input Format:
///
/// Expects an [AttendanceMark](crate::models::attendance::AttendanceMark).
/// Marking the same student, slot and date again replaces the status.
pub async fn mark_attendance(
    Extension(pool): Extension<PgPool>,
    ApiJson(mark): ApiJson<AttendanceMark>,
) -> CenterResult<Json<Value>> {
    let mark = mark.validate()?;
    Attendance::record(mark, &pool).await?;

    Ok(Json(basic_success()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    schedule_id: Option<String>,
    attendance_date: Option<String>,
}

pub async fn get_attendance(
    Query(query): Query<AttendanceQuery>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<AttendanceEntry>>> {
    let schedule_id = require_id(query.schedule_id.as_deref(), "scheduleId")?;
    let date = require_date(query.attendance_date.as_deref(), "attendanceDate")?;

    Attendance::for_slot_on(schedule_id, date, &pool)
        .await
        .map(Json)
}

/// Record a note about a student.
///
/// ## Path Parameters:
///   * studentId: integer (*required*)
///
/// ## Input Format:
///
/// Expects a [NoteInput](crate::models::note::NoteInput). A second note for
/// the same slot and date replaces the first.
pub async fn record_note(
    Path(student_id): Path<String>,
    Extension(pool): Extension<PgPool>,
    ApiJson(input): ApiJson<NoteInput>,
) -> CenterResult<Json<Value>> {
    let student_id = parse_id(&student_id, "studentId")?;
    StudentNote::record(input.validate(student_id)?, &pool).await?;

    Ok(Json(basic_success()))
}

pub async fn student_report(
    Path(student_id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<StudentReport>> {
    let student_id = parse_id(&student_id, "studentId")?;
    StudentReport::for_student(student_id, &pool).await.map(Json)
}

pub async fn report_summary(
    Path(student_id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<ReportSummary>> {
    let student_id = parse_id(&student_id, "studentId")?;
    StudentReport::summary(student_id, &pool).await.map(Json)
}

pub async fn attendance_summary(
    Path(student_id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<AttendanceCounts>> {
    let student_id = parse_id(&student_id, "studentId")?;
    Attendance::recent_counts(student_id, &pool).await.map(Json)
}
