//! The timetable.

use axum::extract::Path;
use axum::{Extension, Json};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::CenterResult;
use crate::extract::ApiJson;
use crate::models::note::{SlotNote, StudentNote};
use crate::models::schedule::{BatchOutcome, ScheduleBatch, ScheduleSlot, SlotStudent};
use crate::util::parse_id;

pub async fn get_schedules(
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<ScheduleSlot>>> {
    ScheduleSlot::all(&pool).await.map(Json)
}

/// Apply a batch of timetable edits.
///
/// ## Input Format:
///
/// A list of [ScheduleEdit](crate::models::schedule::ScheduleEdit)s, each
/// tagged with `_state`. Rows that can't be applied, including rows with
/// the wrong shape or field types, are skipped; the rest
/// are written together or not at all.
///
/// ## Return Format:
///
/// ```json
/// {
///     "success": true,
///     "applied": integer,
///     "skipped": integer
/// }
/// ```
pub async fn save_schedules(
    Extension(pool): Extension<PgPool>,
    ApiJson(rows): ApiJson<Vec<Value>>,
) -> CenterResult<Json<BatchOutcome>> {
    ScheduleBatch::from_json(rows).apply(&pool).await.map(Json)
}

pub async fn slot_students(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<SlotStudent>>> {
    let id = parse_id(&id, "id")?;
    ScheduleSlot::students(id, &pool).await.map(Json)
}

pub async fn slot_notes(
    Path(id): Path<String>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<SlotNote>>> {
    let id = parse_id(&id, "scheduleId")?;
    StudentNote::for_slot(id, &pool).await.map(Json)
}
