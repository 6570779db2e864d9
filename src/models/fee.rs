use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, PrimitiveDateTime};

use crate::error::{CenterError, CenterResult};
use crate::util::{datetime_format, parse_datetime, require_date, require_number, LooseNumber};

/// A student's fee status for one month of one group.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeeStatus {
    pub group_id: i64,
    pub group_name: String,
    pub fee_month: Option<i32>,
    pub fee_year: Option<i32>,
    pub is_paid: bool,
    pub amount_paid: i32,
}

/// One payment line of the cash report.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CashEntry {
    #[serde(with = "datetime_format")]
    pub created_at: PrimitiveDateTime,
    pub student_name: String,
    pub group_name: String,
    #[serde(rename = "amount")]
    pub amount_paid: i32,
    #[serde(rename = "paidMonth")]
    pub fee_month: i32,
}

/// The body for recording a monthly payment.
///
/// ## Expected Format:
///
/// |   Field    |          Type           | Required? |
/// |------------|-------------------------|:---------:|
/// | studentId  | number                  |     ✓     |
/// | groupId    | number                  |     ✓     |
/// | year       | number                  |     ✓     |
/// | month      | number (1-12)           |     ✓     |
/// | amountPaid | number                  |           |
/// | isPaid     | boolean or 0/1          |           |
/// | createdAt  | `YYYY-MM-DD HH:MM:SS`   |     ✓     |
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayment {
    pub student_id: Option<LooseNumber>,
    pub group_id: Option<LooseNumber>,
    pub year: Option<LooseNumber>,
    pub month: Option<LooseNumber>,
    pub amount_paid: Option<LooseNumber>,
    pub is_paid: Option<PaidFlag>,
    pub created_at: Option<String>,
}

/// Older clients send the paid flag as `0`/`1`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum PaidFlag {
    Bool(bool),
    Number(i64),
}

impl PaidFlag {
    fn is_paid(self) -> bool {
        match self {
            PaidFlag::Bool(paid) => paid,
            PaidFlag::Number(paid) => paid != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPayment {
    pub student_id: i64,
    pub group_id: i64,
    pub year: i32,
    pub month: i32,
    pub amount_paid: i32,
    pub is_paid: bool,
    pub created_at: PrimitiveDateTime,
}

impl FeePayment {
    pub fn validate(&self) -> CenterResult<ValidPayment> {
        let month = small_number(require_number(self.month.as_ref(), "month")?, "month")?;
        if !(1..=12).contains(&month) {
            return Err(CenterError::Validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        let created_at = self
            .created_at
            .as_deref()
            .ok_or_else(|| CenterError::Validation("createdAt is required".to_owned()))
            .and_then(|text| {
                parse_datetime(text).ok_or_else(|| {
                    CenterError::Validation(format!(
                        "createdAt must look like YYYY-MM-DD HH:MM:SS, got `{}`",
                        text
                    ))
                })
            })?;
        let amount_paid = match &self.amount_paid {
            Some(amount) => small_number(amount.parse("amountPaid")?, "amountPaid")?,
            None => 0,
        };

        Ok(ValidPayment {
            student_id: require_number(self.student_id.as_ref(), "studentId")?,
            group_id: require_number(self.group_id.as_ref(), "groupId")?,
            year: small_number(require_number(self.year.as_ref(), "year")?, "year")?,
            month,
            amount_paid,
            is_paid: self.is_paid.map(PaidFlag::is_paid).unwrap_or(false),
            created_at,
        })
    }
}

fn small_number(value: i64, field: &str) -> CenterResult<i32> {
    i32::try_from(value)
        .map_err(|_| CenterError::Validation(format!("{} is out of range", field)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashPeriodKind {
    Daily,
    Monthly,
    Yearly,
}

impl FromStr for CashPeriodKind {
    type Err = CenterError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "daily" => Ok(CashPeriodKind::Daily),
            "monthly" => Ok(CashPeriodKind::Monthly),
            "yearly" => Ok(CashPeriodKind::Yearly),
            _ => Err(CenterError::InvalidQuery(
                "type must be daily | monthly | yearly".to_owned(),
            )),
        }
    }
}

/// The window a cash report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashPeriod {
    Day(Date),
    Month { year: i32, month: i32 },
    Year(i32),
}

#[derive(Debug, Default, Deserialize)]
pub struct CashReportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub day: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

impl CashReportQuery {
    pub fn period(&self) -> CenterResult<CashPeriod> {
        let kind: CashPeriodKind = self.kind.as_deref().unwrap_or_default().parse()?;

        match kind {
            CashPeriodKind::Daily => Ok(CashPeriod::Day(
                require_date(self.day.as_deref(), "day")
                    .map_err(|_| CenterError::InvalidQuery("day is required (YYYY-MM-DD)".to_owned()))?,
            )),
            CashPeriodKind::Monthly => match (self.month(), self.year()) {
                (Some(month), Some(year)) => Ok(CashPeriod::Month { year, month }),
                _ => Err(CenterError::InvalidQuery(
                    "month & year are required".to_owned(),
                )),
            },
            CashPeriodKind::Yearly => self
                .year()
                .map(CashPeriod::Year)
                .ok_or_else(|| CenterError::InvalidQuery("year is required".to_owned())),
        }
    }

    fn month(&self) -> Option<i32> {
        self.month.as_deref()?.trim().parse().ok()
    }

    fn year(&self) -> Option<i32> {
        self.year.as_deref()?.trim().parse().ok()
    }
}

pub struct StudentGroupFee;

impl StudentGroupFee {
    /// The student's groups, each joined with whatever fee rows exist for
    /// `year`. Groups with no payments yet appear once with empty months.
    pub async fn for_student(
        student_id: i64,
        year: i32,
        pool: &PgPool,
    ) -> CenterResult<Vec<FeeStatus>> {
        sqlx::query_as::<_, FeeStatus>(
            "SELECT g.group_id, g.name AS group_name, f.fee_month, f.fee_year,
                    COALESCE(f.is_paid, FALSE) AS is_paid,
                    COALESCE(f.amount_paid, 0) AS amount_paid
             FROM group_students gs
             JOIN study_groups g ON g.group_id = gs.group_id
             LEFT JOIN student_group_fees f
                 ON f.student_id = gs.student_id
                AND f.group_id = gs.group_id
                AND f.fee_year = $2
             WHERE gs.student_id = $1
             ORDER BY g.group_id, f.fee_month",
        )
        .bind(student_id)
        .bind(year)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Records the payment for `(student, group, year, month)`, replacing
    /// any earlier record for the same month.
    pub async fn record(payment: ValidPayment, pool: &PgPool) -> CenterResult<()> {
        sqlx::query(
            "INSERT INTO student_group_fees
             (student_id, group_id, fee_year, fee_month, is_paid, amount_paid, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (student_id, group_id, fee_year, fee_month)
             DO UPDATE SET amount_paid = EXCLUDED.amount_paid,
                           is_paid = EXCLUDED.is_paid,
                           created_at = EXCLUDED.created_at",
        )
        .bind(payment.student_id)
        .bind(payment.group_id)
        .bind(payment.year)
        .bind(payment.month)
        .bind(payment.is_paid)
        .bind(payment.amount_paid)
        .bind(payment.created_at)
        .execute(pool)
        .await
        .map_err(CenterError::conflict(format!(
            "Student {} or group {} doesn't exist",
            payment.student_id, payment.group_id
        )))?;

        tracing::info!(
            student_id = payment.student_id,
            group_id = payment.group_id,
            year = payment.year,
            month = payment.month,
            "recorded fee payment"
        );
        Ok(())
    }

    /// Paid fees recorded in the period, newest first.
    pub async fn cash_report(period: CashPeriod, pool: &PgPool) -> CenterResult<Vec<CashEntry>> {
        const SELECT: &str = "SELECT f.created_at, s.name AS student_name,
                    g.name AS group_name, f.amount_paid, f.fee_month
             FROM student_group_fees f
             JOIN students s ON s.student_id = f.student_id
             JOIN study_groups g ON g.group_id = f.group_id
             WHERE f.is_paid AND f.created_at IS NOT NULL";
        const ORDER: &str = "ORDER BY f.created_at DESC";

        let entries = match period {
            CashPeriod::Day(day) => {
                sqlx::query_as::<_, CashEntry>(&format!(
                    "{} AND f.created_at::date = $1 {}",
                    SELECT, ORDER
                ))
                .bind(day)
                .fetch_all(pool)
                .await?
            }
            CashPeriod::Month { year, month } => {
                sqlx::query_as::<_, CashEntry>(&format!(
                    "{} AND EXTRACT(YEAR FROM f.created_at)::int = $1
                        AND EXTRACT(MONTH FROM f.created_at)::int = $2 {}",
                    SELECT, ORDER
                ))
                .bind(year)
                .bind(month)
                .fetch_all(pool)
                .await?
            }
            CashPeriod::Year(year) => {
                sqlx::query_as::<_, CashEntry>(&format!(
                    "{} AND EXTRACT(YEAR FROM f.created_at)::int = $1 {}",
                    SELECT, ORDER
                ))
                .bind(year)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(entries)
    }
}
