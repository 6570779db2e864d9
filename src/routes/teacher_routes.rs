//! Teacher management and the teacher's own views.

use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use super::basic_success;
use crate::config::Config;
use crate::error::{CenterError, CenterResult};
use crate::extract::ApiJson;
use crate::models::schedule::{ScheduleSlot, TeacherSlot};
use crate::models::teacher::{DaySummary, NewTeacher, ProvisionedTeacher, Teacher};
use crate::util::{parse_id, require_date, require_id, require_number, require_text, LooseNumber};

pub async fn get_teachers(Extension(pool): Extension<PgPool>) -> CenterResult<Json<Vec<Teacher>>> {
    Teacher::all(&pool).await.map(Json)
}

pub async fn get_teacher(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Teacher>> {
    let id = parse_id(&id, "id")?;
    Teacher::with_id(id, &pool).await.map(Json)
}

/// Create a teacher along with their login account.
///
/// ## Input Format:
///
/// Expects a [NewTeacher](crate::models::teacher::NewTeacher).
///
/// ## Return Format:
///
/// Returns a [ProvisionedTeacher](crate::models::teacher::ProvisionedTeacher)
/// with a 201 status.
pub async fn new_teacher(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    ApiJson(new_teacher): ApiJson<NewTeacher>,
) -> CenterResult<(StatusCode, Json<ProvisionedTeacher>)> {
    let teacher = Teacher::create(new_teacher, &config, &pool).await?;

    Ok((StatusCode::CREATED, Json(teacher)))
}

pub async fn update_teacher(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
    ApiJson(update): ApiJson<NewTeacher>,
) -> CenterResult<Json<Teacher>> {
    let id = parse_id(&id, "id")?;
    Teacher::update(id, update, &pool).await.map(Json)
}

/// Delete a teacher, their groups and everything recorded in them.
///
/// ## Path Parameters:
///   * id: integer (*required*) - The ID of the teacher
pub async fn delete_teacher(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Value>> {
    let id = parse_id(&id, "id")?;
    Teacher::delete(id, &pool).await?;
    tracing::info!(teacher_id = id, "deleted teacher");

    Ok(Json(basic_success()))
}

#[derive(Deserialize)]
pub struct ImageChange {
    #[serde(rename = "TEACHER_ID", alias = "teacherId")]
    teacher_id: Option<LooseNumber>,
    #[serde(rename = "IMAGE_URL", alias = "imageUrl")]
    image_url: Option<String>,
}

pub async fn change_teacher_image(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    ApiJson(change): ApiJson<ImageChange>,
) -> CenterResult<Json<Value>> {
    let teacher_id = require_number(change.teacher_id.as_ref(), "TEACHER_ID")?;
    let image_url = require_text(change.image_url.as_deref(), "IMAGE_URL")?;
    Teacher::set_image(teacher_id, image_url, &config.image_host_prefix, &pool).await?;

    Ok(Json(json!({ "message": "Teacher image updated" })))
}

#[derive(Deserialize)]
pub struct DayQuery {
    date: Option<String>,
}

/// Attendance totals over a teacher's slots on one day.
///
/// ## Path Parameters:
///   * teacherId: integer (*required*)
///
/// ## Query Parameters:
///   * date: `YYYY-MM-DD` (*required*)
pub async fn day_summary(
    Path(teacher_id): Path<String>,
    Query(query): Query<DayQuery>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<DaySummary>> {
    let teacher_id = parse_id(&teacher_id, "teacherId")?;
    let date = require_date(query.date.as_deref(), "date")?;

    Teacher::day_summary(teacher_id, date, &pool).await.map(Json)
}

pub async fn student_count(
    Path(teacher_id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Value>> {
    let teacher_id = parse_id(&teacher_id, "teacherId")?;
    let total = Teacher::student_count(teacher_id, &pool).await?;

    Ok(Json(json!({ "totalStudents": total })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherQuery {
    teacher_id: Option<String>,
}

/// The slots of a teacher's groups, ordered by start time.
///
/// Served at `/api/teacher/schedule`, which shares its segment with the
/// `/api/teacher/:id/...` routes, so any other segment is a 404.
///
/// ## Query Parameters:
///   * teacherId: integer (*required*)
pub async fn teacher_schedule(
    Path(view): Path<String>,
    Query(query): Query<TeacherQuery>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<TeacherSlot>>> {
    if view != "schedule" {
        return Err(CenterError::NotFound(format!("No teacher view named {}", view)));
    }

    let teacher_id = require_id(query.teacher_id.as_deref(), "teacherId")?;
    ScheduleSlot::for_teacher(teacher_id, &pool).await.map(Json)
}
