use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::Date;

use crate::error::{CenterError, CenterResult};
use crate::util::{date_format, require_date, require_number, LooseNumber};

/// Text carried by the notes the app writes for one-tap ratings. Those
/// notes count toward the average rating but are kept out of digests.
pub const QUICK_RATING_SENTINEL: &str = "تقييم سريع";

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SlotNote {
    pub note_text: String,
    pub rating: Option<i32>,
    pub student_id: i64,
    #[serde(with = "date_format")]
    pub note_date: Date,
    pub student_name: String,
}

/// The body for recording a note about a student.
///
/// ## Expected Format:
///
/// |   Field    |       Type       | Required? |
/// |------------|------------------|:---------:|
/// | scheduleId | number or string |     ✓     |
/// | noteDate   | `YYYY-MM-DD`     |     ✓     |
/// | note       | string           |           |
/// | rating     | number or string |           |
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInput {
    pub schedule_id: Option<LooseNumber>,
    pub note: Option<String>,
    pub note_date: Option<String>,
    pub rating: Option<LooseNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNote {
    pub student_id: i64,
    pub schedule_id: i64,
    pub date: Date,
    pub text: String,
    pub rating: Option<i32>,
}

impl NoteInput {
    pub fn validate(self, student_id: i64) -> CenterResult<ValidNote> {
        let rating = match &self.rating {
            Some(rating) => Some(i32::try_from(rating.parse("rating")?).map_err(|_| {
                CenterError::Validation("rating is out of range".to_owned())
            })?),
            None => None,
        };

        Ok(ValidNote {
            student_id,
            schedule_id: require_number(self.schedule_id.as_ref(), "scheduleId")?,
            date: require_date(self.note_date.as_deref(), "noteDate")?,
            text: self.note.unwrap_or_default(),
            rating,
        })
    }
}

pub struct StudentNote;

impl StudentNote {
    /// Writes the note for `(student, slot, date)`, replacing the text and
    /// rating of any note already recorded for that key.
    pub async fn record(note: ValidNote, pool: &PgPool) -> CenterResult<()> {
        sqlx::query(
            "INSERT INTO student_notes (student_id, schedule_id, note_date, note_text, rating)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (student_id, schedule_id, note_date)
             DO UPDATE SET rating = EXCLUDED.rating, note_text = EXCLUDED.note_text",
        )
        .bind(note.student_id)
        .bind(note.schedule_id)
        .bind(note.date)
        .bind(&note.text)
        .bind(note.rating)
        .execute(pool)
        .await
        .map_err(CenterError::conflict(format!(
            "Slot {} or student {} doesn't exist",
            note.schedule_id, note.student_id
        )))?;

        Ok(())
    }

    /// Every note taken in the slot, newest first.
    pub async fn for_slot(schedule_id: i64, pool: &PgPool) -> CenterResult<Vec<SlotNote>> {
        sqlx::query_as::<_, SlotNote>(
            "SELECT sn.note_text, sn.rating, sn.student_id, sn.note_date,
                    s.name AS student_name
             FROM student_notes sn
             JOIN students s ON sn.student_id = s.student_id
             WHERE sn.schedule_id = $1
             ORDER BY sn.note_date DESC",
        )
        .bind(schedule_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
