use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::CenterResult;

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: i64,
    pub name: String,
    pub capacity: Option<i32>,
    pub note: Option<String>,
    pub is_active: bool,
    /// Whether a class is running in the room right now
    pub is_occupied: bool,
}

impl Room {
    /// Every room, flagged as occupied when the current time of day in
    /// `timezone` falls inside `[start, end)` of one of its slots held on
    /// today's weekday.
    pub async fn all_with_occupancy(timezone: &str, pool: &PgPool) -> CenterResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT r.room_id, r.name, r.capacity, r.note, r.is_active,
                    EXISTS (
                        SELECT 1 FROM schedule s
                        WHERE s.room_id = r.room_id
                          AND trim(s.day) = to_char(now() AT TIME ZONE $1, 'FMDay')
                          AND (now() AT TIME ZONE $1)::time >= s.start_time::time
                          AND (now() AT TIME ZONE $1)::time < s.end_time::time
                    ) AS is_occupied
             FROM rooms r
             ORDER BY r.room_id",
        )
        .bind(timezone)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
