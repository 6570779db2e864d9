//! Student management and lookup.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

use super::basic_success;
use crate::error::CenterResult;
use crate::extract::ApiJson;
use crate::models::student::{NewStudent, Student, StudentMatch};
use crate::util::parse_id;

pub async fn get_students(Extension(pool): Extension<PgPool>) -> CenterResult<Json<Vec<Student>>> {
    Student::all(&pool).await.map(Json)
}

#[derive(Deserialize)]
pub struct SearchQuery {
    name: Option<String>,
}

/// Find students by part of their name.
///
/// ## Query Parameters:
///   * name: string - Matched case-insensitively anywhere in the name
///
/// ## Return Format:
///
/// ```json
/// [
///     {
///         "id": integer,
///         "name": string
///     },
///     ...
/// ]
/// ```
pub async fn search_students(
    Query(query): Query<SearchQuery>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<StudentMatch>>> {
    Student::search(query.name.as_deref().unwrap_or_default(), &pool)
        .await
        .map(Json)
}

pub async fn new_student(
    Extension(pool): Extension<PgPool>,
    ApiJson(new_student): ApiJson<NewStudent>,
) -> CenterResult<(StatusCode, Json<Student>)> {
    let student = Student::create(new_student, &pool).await?;

    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn update_student(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
    ApiJson(update): ApiJson<NewStudent>,
) -> CenterResult<Json<Student>> {
    let id = parse_id(&id, "id")?;
    Student::update(id, update, &pool).await.map(Json)
}

pub async fn delete_student(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Value>> {
    let id = parse_id(&id, "id")?;
    Student::delete(id, &pool).await?;
    tracing::info!(student_id = id, "deleted student");

    Ok(Json(basic_success()))
}
