use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::CenterResult;

/// A school year, e.g. "Third Secondary".
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub grade_id: i64,
    pub name: String,
}

impl Grade {
    pub async fn all(pool: &PgPool) -> CenterResult<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT grade_id, name FROM grades ORDER BY grade_id")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
