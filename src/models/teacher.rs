use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::config::Config;
use crate::error::{CenterError, CenterResult};
use crate::models::account::UserAccount;
use crate::notify::CredentialsMessage;
use crate::util::require_text;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub teacher_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    /// A link to the teacher's picture
    pub image: Option<String>,
    pub subject: Option<String>,
    /// Promotional marker, no behaviour attached
    pub golden: bool,
    pub youtube_url: Option<String>,
}

/// A teacher together with the login account provisioned for them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedTeacher {
    #[serde(flatten)]
    pub teacher: Teacher,
    pub username: String,
    /// Link that delivers the generated credentials, when a phone is known
    pub whatsapp_link: Option<String>,
}

/// Where a teacher's day went: students who showed up (present or late)
/// versus students marked absent.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub present_count: i64,
    pub absent_count: i64,
}

impl Teacher {
    const COLUMNS: &'static str = "teacher_id, first_name, last_name, phone_number, gender, \
         image, subject, golden, youtube_url";

    pub async fn with_id(id: i64, pool: &PgPool) -> CenterResult<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| CenterError::NotFound(format!("No teacher with id {}", id)))
    }

    pub async fn with_id_opt(id: i64, pool: &PgPool) -> CenterResult<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM teachers WHERE teacher_id = $1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Every teacher without an admin login.
    pub async fn all(pool: &PgPool) -> CenterResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM teachers WHERE teacher_id NOT IN
                 (SELECT teacher_id FROM users WHERE role = 'admin' AND teacher_id IS NOT NULL)
             ORDER BY teacher_id",
            Self::COLUMNS
        ))
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Creates the teacher and their login account in one transaction.
    pub async fn create(
        new_teacher: NewTeacher,
        config: &Config,
        pool: &PgPool,
    ) -> CenterResult<ProvisionedTeacher> {
        let (first_name, last_name) = new_teacher.names()?;
        let pass_hash = bcrypt::hash(&config.default_teacher_password, 10)?;

        let mut transaction = pool.begin().await?;
        let teacher = sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO teachers
             (first_name, last_name, phone_number, gender, image, subject, golden, youtube_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            Self::COLUMNS
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(&new_teacher.phone_number)
        .bind(&new_teacher.gender)
        .bind(&new_teacher.image)
        .bind(&new_teacher.subject)
        .bind(new_teacher.golden.unwrap_or(false))
        .bind(&new_teacher.youtube_url)
        .fetch_one(&mut transaction)
        .await?;

        let username = build_username(&teacher.first_name, &teacher.last_name, teacher.teacher_id);
        UserAccount::create_for_teacher(&username, &pass_hash, teacher.teacher_id, &mut transaction)
            .await?;
        transaction.commit().await?;

        tracing::info!(teacher_id = teacher.teacher_id, %username, "provisioned teacher");

        let whatsapp_link = match teacher.phone_number.as_deref() {
            Some(phone) => CredentialsMessage {
                username: &username,
                password: &config.default_teacher_password,
                login_url: &config.login_url,
            }
            .whatsapp_link(phone)?,
            None => None,
        };

        Ok(ProvisionedTeacher {
            teacher,
            username,
            whatsapp_link,
        })
    }

    pub async fn update(id: i64, update: NewTeacher, pool: &PgPool) -> CenterResult<Self> {
        let (first_name, last_name) = update.names()?;

        sqlx::query_as::<_, Self>(&format!(
            "UPDATE teachers SET
             first_name = $1, last_name = $2, phone_number = $3, gender = $4,
             image = $5, subject = $6, golden = $7, youtube_url = $8
             WHERE teacher_id = $9
             RETURNING {}",
            Self::COLUMNS
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(&update.phone_number)
        .bind(&update.gender)
        .bind(&update.image)
        .bind(&update.subject)
        .bind(update.golden.unwrap_or(false))
        .bind(&update.youtube_url)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No teacher with id {}", id)))
    }

    pub async fn set_image(
        id: i64,
        image_url: &str,
        allowed_prefix: &str,
        pool: &PgPool,
    ) -> CenterResult<()> {
        if !image_url.starts_with(allowed_prefix) {
            return Err(CenterError::Validation(format!(
                "Teacher images must be hosted under {}",
                allowed_prefix
            )));
        }

        let result = sqlx::query("UPDATE teachers SET image = $1 WHERE teacher_id = $2")
            .bind(image_url)
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CenterError::NotFound(format!("No teacher with id {}", id)));
        }

        Ok(())
    }

    /// Deletes the teacher with everything hanging off their groups, then
    /// their login accounts. Nothing is kept if the teacher doesn't exist.
    pub async fn delete(id: i64, pool: &PgPool) -> CenterResult<()> {
        let mut transaction = pool.begin().await?;

        sqlx::query(
            "DELETE FROM attendance WHERE schedule_id IN
                 (SELECT schedule_id FROM schedule WHERE group_id IN
                     (SELECT group_id FROM study_groups WHERE teacher_id = $1))",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        sqlx::query(
            "DELETE FROM student_notes WHERE schedule_id IN
                 (SELECT schedule_id FROM schedule WHERE group_id IN
                     (SELECT group_id FROM study_groups WHERE teacher_id = $1))",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        sqlx::query(
            "DELETE FROM student_group_fees WHERE group_id IN
                 (SELECT group_id FROM study_groups WHERE teacher_id = $1)",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        sqlx::query(
            "DELETE FROM group_students WHERE group_id IN
                 (SELECT group_id FROM study_groups WHERE teacher_id = $1)",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        sqlx::query(
            "DELETE FROM schedule WHERE group_id IN
                 (SELECT group_id FROM study_groups WHERE teacher_id = $1)",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        sqlx::query("DELETE FROM study_groups WHERE teacher_id = $1")
            .bind(id)
            .execute(&mut transaction)
            .await?;
        sqlx::query("DELETE FROM users WHERE teacher_id = $1")
            .bind(id)
            .execute(&mut transaction)
            .await?;

        let result = sqlx::query("DELETE FROM teachers WHERE teacher_id = $1")
            .bind(id)
            .execute(&mut transaction)
            .await
            .map_err(CenterError::conflict(format!(
                "Teacher {} is still referenced elsewhere",
                id
            )))?;
        if result.rows_affected() == 0 {
            return Err(CenterError::NotFound(format!("No teacher with id {}", id)));
        }

        transaction.commit().await?;
        Ok(())
    }

    /// Attendance totals across the teacher's slots for one day.
    pub async fn day_summary(
        id: i64,
        date: time::Date,
        pool: &PgPool,
    ) -> CenterResult<DaySummary> {
        sqlx::query_as::<_, DaySummary>(
            "SELECT
                 COUNT(*) FILTER (WHERE a.status IN ('present', 'late')) AS present_count,
                 COUNT(*) FILTER (WHERE a.status = 'absent') AS absent_count
             FROM attendance a
             JOIN schedule s ON a.schedule_id = s.schedule_id
             JOIN study_groups g ON s.group_id = g.group_id
             WHERE g.teacher_id = $1 AND a.attendance_date = $2",
        )
        .bind(id)
        .bind(date)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// How many distinct students sit in any of the teacher's groups.
    pub async fn student_count(id: i64, pool: &PgPool) -> CenterResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT gs.student_id)
             FROM group_students gs
             JOIN study_groups g ON g.group_id = gs.group_id
             WHERE g.teacher_id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}

/// The body for creating or updating a teacher.
///
/// ## Expected Format:
///
/// |    Field    |  Type  | Required? |
/// |-------------|--------|:---------:|
/// | firstName   | string |     ✓     |
/// | lastName    | string |     ✓     |
/// | phoneNumber | string |           |
/// | gender      | string |           |
/// | image       | string |           |
/// | subject     | string |           |
/// | golden      | bool   |           |
/// | youtubeUrl  | string |           |
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    #[serde(alias = "FIRST_NAME")]
    pub first_name: Option<String>,
    #[serde(alias = "LAST_NAME")]
    pub last_name: Option<String>,
    #[serde(alias = "PHONE_NUMBER")]
    pub phone_number: Option<String>,
    #[serde(alias = "GENDER")]
    pub gender: Option<String>,
    #[serde(alias = "IMAGE")]
    pub image: Option<String>,
    #[serde(alias = "SUBJECT")]
    pub subject: Option<String>,
    #[serde(alias = "GOLDEN")]
    pub golden: Option<bool>,
    #[serde(alias = "YOUTUBE_URL")]
    pub youtube_url: Option<String>,
}

impl NewTeacher {
    fn names(&self) -> CenterResult<(&str, &str)> {
        Ok((
            require_text(self.first_name.as_deref(), "firstName")?,
            require_text(self.last_name.as_deref(), "lastName")?,
        ))
    }
}

/// `first_last_<id>`, lower-cased with all whitespace removed.
pub fn build_username(first_name: &str, last_name: &str, teacher_id: i64) -> String {
    let clean = |name: &str| {
        name.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };

    format!("{}_{}_{}", clean(first_name), clean(last_name), teacher_id)
}
