//! Schedule slots and the batch editor used by the timetable screen.
//!
//! The client keeps a local copy of the timetable, tags every row it touched
//! with `_state` (`new`, `updated` or `deleted`) and posts the tagged rows
//! back in one request. [ScheduleBatch::from_json] filters out rows that
//! can't be applied, then [ScheduleBatch::apply] writes the rest in order inside a
//! single transaction.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use time::{Date, PrimitiveDateTime};

use crate::error::{CenterError, CenterResult};
use crate::util::{
    anchor_clock, clock_format, date_format, parse_clock, parse_date, weekday_label, LooseNumber,
};

/// A slot as listed on the timetable, in the same shape the batch editor
/// accepts back.
#[derive(Debug, Serialize, FromRow)]
pub struct ScheduleSlot {
    pub schedule_id: i64,
    pub group_id: i64,
    pub group_name: Option<String>,
    pub room_id: i64,
    pub room_name: Option<String>,
    #[serde(with = "date_format")]
    pub class_date: Date,
    #[serde(with = "clock_format")]
    pub start_time: PrimitiveDateTime,
    #[serde(with = "clock_format")]
    pub end_time: PrimitiveDateTime,
    pub day: String,
    pub teacher: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSlot {
    pub schedule_id: i64,
    pub group_name: String,
    pub room_name: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SlotStudent {
    pub student_id: i64,
    pub name: String,
}

impl ScheduleSlot {
    pub async fn all(pool: &PgPool) -> CenterResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT s.schedule_id, s.group_id, g.name AS group_name,
                    s.room_id, r.name AS room_name,
                    s.class_date, s.start_time, s.end_time, s.day,
                    t.first_name || ' ' || t.last_name AS teacher
             FROM schedule s
             LEFT JOIN study_groups g ON s.group_id = g.group_id
             LEFT JOIN rooms r ON s.room_id = r.room_id
             LEFT JOIN teachers t ON g.teacher_id = t.teacher_id
             ORDER BY s.schedule_id",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn for_teacher(teacher_id: i64, pool: &PgPool) -> CenterResult<Vec<TeacherSlot>> {
        sqlx::query_as::<_, TeacherSlot>(
            "SELECT s.schedule_id, g.name AS group_name, r.name AS room_name, s.day,
                    to_char(s.start_time, 'HH24:MI') AS start_time,
                    to_char(s.end_time, 'HH24:MI') AS end_time
             FROM schedule s
             JOIN study_groups g ON g.group_id = s.group_id
             JOIN rooms r ON r.room_id = s.room_id
             WHERE g.teacher_id = $1
             ORDER BY s.start_time",
        )
        .bind(teacher_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// The members of the group that meets in the slot.
    pub async fn students(schedule_id: i64, pool: &PgPool) -> CenterResult<Vec<SlotStudent>> {
        sqlx::query_as::<_, SlotStudent>(
            "SELECT st.student_id, st.name
             FROM schedule s
             JOIN group_students gs ON gs.group_id = s.group_id
             JOIN students st ON st.student_id = gs.student_id
             WHERE s.schedule_id = $1
             ORDER BY st.name",
        )
        .bind(schedule_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

/// One row posted by the timetable editor.
///
/// Times are `HH:MM` (or `HH:MM:SS`) and the date is `YYYY-MM-DD`; the ids
/// may be numbers or numeric strings. Any `days` label sent along is
/// ignored, the weekday is always derived from `class_date`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleEdit {
    pub schedule_id: Option<LooseNumber>,
    pub group_id: Option<LooseNumber>,
    pub room_id: Option<LooseNumber>,
    pub class_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "_state")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditIntent {
    New,
    Updated,
    Deleted,
}

/// Why an edit was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing start time")]
    MissingStart,
    #[error("start time `{0}` is not a time of day")]
    InvalidStart(String),
    #[error("missing end time")]
    MissingEnd,
    #[error("end time `{0}` is not a time of day")]
    InvalidEnd(String),
    #[error("end time is not after start time")]
    EndNotAfterStart,
    #[error("missing class date")]
    MissingDate,
    #[error("class date `{0}` is not a YYYY-MM-DD date")]
    InvalidDate(String),
    #[error("missing {0}")]
    MissingId(&'static str),
    #[error("{0} is not numeric")]
    InvalidId(&'static str),
    #[error("missing _state")]
    MissingIntent,
    #[error("unknown _state `{0}`")]
    UnknownIntent(String),
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// The columns written for a new or updated slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFields {
    pub group_id: i64,
    pub room_id: i64,
    pub class_date: Date,
    pub start_time: PrimitiveDateTime,
    pub end_time: PrimitiveDateTime,
    pub day: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedEdit {
    Insert(SlotFields),
    Update { schedule_id: i64, fields: SlotFields },
    Delete { schedule_id: i64 },
}

impl ScheduleEdit {
    pub fn intent(&self) -> Result<EditIntent, SkipReason> {
        match self.state.as_deref().map(str::trim) {
            None | Some("") => Err(SkipReason::MissingIntent),
            Some("new") => Ok(EditIntent::New),
            Some("updated") => Ok(EditIntent::Updated),
            Some("deleted") => Ok(EditIntent::Deleted),
            Some(other) => Err(SkipReason::UnknownIntent(other.to_owned())),
        }
    }

    /// Checks the row and turns it into the statement it stands for.
    ///
    /// Every row needs a valid start time, whatever its intent.
    pub fn prepare(&self) -> Result<PreparedEdit, SkipReason> {
        let start = match self.start_time.as_deref().map(str::trim) {
            None | Some("") => return Err(SkipReason::MissingStart),
            Some(text) => {
                parse_clock(text).ok_or_else(|| SkipReason::InvalidStart(text.to_owned()))?
            }
        };

        match self.intent()? {
            EditIntent::Deleted => Ok(PreparedEdit::Delete {
                schedule_id: required_id(self.schedule_id.as_ref(), "schedule_id")?,
            }),
            EditIntent::New => Ok(PreparedEdit::Insert(self.slot_fields(start)?)),
            EditIntent::Updated => Ok(PreparedEdit::Update {
                schedule_id: required_id(self.schedule_id.as_ref(), "schedule_id")?,
                fields: self.slot_fields(start)?,
            }),
        }
    }

    fn slot_fields(&self, start: time::Time) -> Result<SlotFields, SkipReason> {
        let end = match self.end_time.as_deref().map(str::trim) {
            None | Some("") => return Err(SkipReason::MissingEnd),
            Some(text) => {
                parse_clock(text).ok_or_else(|| SkipReason::InvalidEnd(text.to_owned()))?
            }
        };
        if end <= start {
            return Err(SkipReason::EndNotAfterStart);
        }

        let class_date = match self.class_date.as_deref().map(str::trim) {
            None | Some("") => return Err(SkipReason::MissingDate),
            Some(text) => {
                parse_class_date(text).ok_or_else(|| SkipReason::InvalidDate(text.to_owned()))?
            }
        };

        Ok(SlotFields {
            group_id: required_id(self.group_id.as_ref(), "group_id")?,
            room_id: required_id(self.room_id.as_ref(), "room_id")?,
            class_date,
            start_time: anchor_clock(start),
            end_time: anchor_clock(end),
            day: weekday_label(class_date),
        })
    }
}

/// Accepts a bare date or a full ISO timestamp starting with one.
fn parse_class_date(text: &str) -> Option<Date> {
    parse_date(text).or_else(|| text.get(..10).and_then(parse_date))
}

fn required_id(value: Option<&LooseNumber>, field: &'static str) -> Result<i64, SkipReason> {
    value
        .ok_or(SkipReason::MissingId(field))?
        .parse(field)
        .map_err(|_| SkipReason::InvalidId(field))
}

impl PreparedEdit {
    /// Runs the edit and returns how many slots it touched.
    async fn execute(&self, transaction: &mut Transaction<'_, Postgres>) -> CenterResult<u64> {
        let result = match self {
            PreparedEdit::Insert(fields) => sqlx::query(
                "INSERT INTO schedule (group_id, room_id, class_date, start_time, end_time, day)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(fields.group_id)
            .bind(fields.room_id)
            .bind(fields.class_date)
            .bind(fields.start_time)
            .bind(fields.end_time)
            .bind(&fields.day)
            .execute(&mut *transaction)
            .await
            .map_err(CenterError::conflict(format!(
                "Group {} or room {} doesn't exist",
                fields.group_id, fields.room_id
            )))?,
            PreparedEdit::Update {
                schedule_id,
                fields,
            } => sqlx::query(
                "UPDATE schedule SET
                 group_id = $1, room_id = $2, class_date = $3,
                 start_time = $4, end_time = $5, day = $6
                 WHERE schedule_id = $7",
            )
            .bind(fields.group_id)
            .bind(fields.room_id)
            .bind(fields.class_date)
            .bind(fields.start_time)
            .bind(fields.end_time)
            .bind(&fields.day)
            .bind(schedule_id)
            .execute(&mut *transaction)
            .await
            .map_err(CenterError::conflict(format!(
                "Group {} or room {} doesn't exist",
                fields.group_id, fields.room_id
            )))?,
            PreparedEdit::Delete { schedule_id } => {
                sqlx::query("DELETE FROM schedule WHERE schedule_id = $1")
                    .bind(schedule_id)
                    .execute(&mut *transaction)
                    .await
                    .map_err(CenterError::conflict(format!(
                        "Slot {} still has attendance or notes",
                        schedule_id
                    )))?
            }
        };

        Ok(result.rows_affected())
    }
}

#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct ScheduleBatch {
    edits: Vec<PreparedEdit>,
    skipped: usize,
}

impl ScheduleBatch {
    pub fn prepare(items: &[ScheduleEdit]) -> Self {
        Self::collect(items.iter().map(ScheduleEdit::prepare))
    }

    /// Prepares rows straight from the request body. A row that doesn't
    /// even have the shape of a [ScheduleEdit] is skipped like any other
    /// unusable row.
    pub fn from_json(items: Vec<Value>) -> Self {
        Self::collect(items.into_iter().map(|item| {
            serde_json::from_value::<ScheduleEdit>(item)
                .map_err(|error| SkipReason::Malformed(error.to_string()))
                .and_then(|edit| edit.prepare())
        }))
    }

    fn collect(rows: impl Iterator<Item = Result<PreparedEdit, SkipReason>>) -> Self {
        let mut edits = Vec::new();
        let mut skipped = 0;

        for (index, row) in rows.enumerate() {
            match row {
                Ok(edit) => edits.push(edit),
                Err(reason) => {
                    skipped += 1;
                    tracing::warn!(index, %reason, "skipping schedule edit");
                }
            }
        }

        Self { edits, skipped }
    }

    pub fn edits(&self) -> &[PreparedEdit] {
        &self.edits
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Writes every prepared edit in order. Nothing is kept if any of them
    /// fails; edits that match no slot are only logged.
    pub async fn apply(self, pool: &PgPool) -> CenterResult<BatchOutcome> {
        if self.edits.is_empty() {
            return Ok(BatchOutcome {
                success: true,
                applied: 0,
                skipped: self.skipped,
            });
        }

        let mut transaction = pool.begin().await?;
        let mut applied = 0;

        for edit in &self.edits {
            if edit.execute(&mut transaction).await? == 0 {
                tracing::warn!(?edit, "schedule edit matched no slot");
            } else {
                applied += 1;
            }
        }

        transaction.commit().await?;
        tracing::info!(applied, skipped = self.skipped, "applied schedule batch");

        Ok(BatchOutcome {
            success: true,
            applied,
            skipped: self.skipped,
        })
    }
}
