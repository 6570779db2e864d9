//! All other miscellaneous routes.

use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::CenterResult;
use crate::models::grade::Grade;
use crate::models::room::Room;

/// Liveness check; fails if the database can't be reached.
pub async fn health(Extension(pool): Extension<PgPool>) -> CenterResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(Json(json!({ "status": "ok" })))
}

pub async fn get_grades(Extension(pool): Extension<PgPool>) -> CenterResult<Json<Vec<Grade>>> {
    Grade::all(&pool).await.map(Json)
}

/// Every room, with whether a class is running in it right now.
pub async fn get_rooms(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
) -> CenterResult<Json<Vec<Room>>> {
    Room::all_with_occupancy(&config.civil_timezone, &pool)
        .await
        .map(Json)
}
