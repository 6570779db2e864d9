//! Fees and cash reporting.

use axum::extract::Query;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

use super::basic_success;
use crate::error::{CenterError, CenterResult};
use crate::extract::ApiJson;
use crate::models::fee::{CashEntry, CashReportQuery, FeePayment, FeeStatus, StudentGroupFee};
use crate::util::require_id;

#[derive(Deserialize)]
pub struct FinanceQuery {
    #[serde(rename = "STUDENT_ID", alias = "studentId")]
    student_id: Option<String>,
    #[serde(rename = "YEAR", alias = "year")]
    year: Option<String>,
}

/// A student's fees for one year, per group.
///
/// ## Query Parameters:
///   * STUDENT_ID: integer (*required*)
///   * YEAR: integer (*required*)
pub async fn student_finance(
    Query(query): Query<FinanceQuery>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<FeeStatus>>> {
    let student_id = require_id(query.student_id.as_deref(), "STUDENT_ID")?;
    let year = i32::try_from(require_id(query.year.as_deref(), "YEAR")?)
        .map_err(|_| CenterError::Validation("YEAR is out of range".to_owned()))?;

    StudentGroupFee::for_student(student_id, year, &pool)
        .await
        .map(Json)
}

pub async fn update_finance(
    Extension(pool): Extension<PgPool>,
    ApiJson(payment): ApiJson<FeePayment>,
) -> CenterResult<Json<Value>> {
    StudentGroupFee::record(payment.validate()?, &pool).await?;

    Ok(Json(basic_success()))
}

/// Paid fees over a day, month or year.
///
/// ## Query Parameters:
///   * type: `daily` | `monthly` | `yearly` (*required*)
///   * day: `YYYY-MM-DD` - required for `daily`
///   * month: integer - required for `monthly`
///   * year: integer - required for `monthly` and `yearly`
///
/// ## Return Format:
///
/// Returns a list of [CashEntry](crate::models::fee::CashEntry)s.
pub async fn cash_report(
    Query(query): Query<CashReportQuery>,
    Extension(pool): Extension<PgPool>,
) -> CenterResult<Json<Vec<CashEntry>>> {
    let period = query.period()?;
    StudentGroupFee::cash_report(period, &pool).await.map(Json)
}
