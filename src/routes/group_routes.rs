//! Groups and their members.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::Value;
use sqlx::PgPool;

use super::basic_success;
use crate::error::CenterResult;
use crate::extract::ApiJson;
use crate::models::group::{Group, GroupListing, NewGroup};
use crate::models::membership::{Membership, NewMember};
use crate::models::student::Student;
use crate::util::parse_id;

pub async fn get_groups(
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<GroupListing>>> {
    Group::all(&pool).await.map(Json)
}

/// Create a group.
///
/// ## Input Format:
///
/// Expects a [NewGroup](crate::models::group::NewGroup). A name that is
/// already taken is a conflict.
pub async fn new_group(
    Extension(pool): Extension<PgPool>,
    ApiJson(new_group): ApiJson<NewGroup>,
) -> CenterResult<(StatusCode, Json<Group>)> {
    let group = Group::create(new_group, &pool).await?;

    Ok((StatusCode::CREATED, Json(group)))
}

/// Update a group.
///
/// Moving the group to another grade removes all of its members.
pub async fn update_group(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
    ApiJson(update): ApiJson<NewGroup>,
) -> CenterResult<Json<Group>> {
    let id = parse_id(&id, "id")?;
    Group::update(id, update, &pool).await.map(Json)
}

pub async fn delete_group(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Value>> {
    let id = parse_id(&id, "id")?;
    Group::delete(id, &pool).await?;
    tracing::info!(group_id = id, "deleted group");

    Ok(Json(basic_success()))
}

pub async fn group_members(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<Student>>> {
    let id = parse_id(&id, "id")?;
    Membership::members(id, &pool).await.map(Json)
}

pub async fn eligible_students(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<Student>>> {
    let id = parse_id(&id, "id")?;
    Membership::eligible(id, &pool).await.map(Json)
}

/// Add a student to a group.
///
/// ## Input Format:
///
/// ```json
/// {
///     "studentId": integer
/// }
/// ```
///
/// The student must be in the group's grade and not already a member.
pub async fn add_member(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
    ApiJson(member): ApiJson<NewMember>,
) -> CenterResult<(StatusCode, Json<Value>)> {
    let group_id = parse_id(&id, "id")?;
    let student_id = member.student_id()?;
    Membership::add(group_id, student_id, &pool).await?;

    Ok((StatusCode::CREATED, Json(basic_success())))
}

pub async fn remove_member(
    Path((group_id, student_id)): Path<(String, String)>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Value>> {
    let group_id = parse_id(&group_id, "groupId")?;
    let student_id = parse_id(&student_id, "studentId")?;
    Membership::remove(group_id, student_id, &pool).await?;

    Ok(Json(basic_success()))
}
