use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{CenterError, CenterResult};
use crate::util::{require_number, require_text, LooseNumber};

/// A class of students of one grade, taught by one teacher.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: i64,
    pub name: String,
    pub grade_id: i64,
    pub teacher_id: i64,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupListing {
    pub group_id: i64,
    pub name: String,
    pub grade_id: i64,
    pub teacher_id: i64,
    pub teacher_name: Option<String>,
}

impl Group {
    pub async fn with_id(id: i64, pool: &PgPool) -> CenterResult<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| CenterError::NotFound(format!("No group with id {}", id)))
    }

    pub async fn with_id_opt(id: i64, pool: &PgPool) -> CenterResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT group_id, name, grade_id, teacher_id FROM study_groups WHERE group_id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// All groups, newest first, with their teacher's full name.
    pub async fn all(pool: &PgPool) -> CenterResult<Vec<GroupListing>> {
        sqlx::query_as::<_, GroupListing>(
            "SELECT g.group_id, g.name, g.grade_id, g.teacher_id,
                    t.first_name || ' ' || t.last_name AS teacher_name
             FROM study_groups g
             LEFT JOIN teachers t ON t.teacher_id = g.teacher_id
             ORDER BY g.group_id DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create(new_group: NewGroup, pool: &PgPool) -> CenterResult<Self> {
        let fields = new_group.validate()?;

        let group = sqlx::query_as::<_, Self>(
            "INSERT INTO study_groups (name, grade_id, teacher_id) VALUES ($1, $2, $3)
             RETURNING group_id, name, grade_id, teacher_id",
        )
        .bind(fields.name)
        .bind(fields.grade_id)
        .bind(fields.teacher_id)
        .fetch_one(pool)
        .await
        .map_err(CenterError::conflict(format!(
            "A group named {} already exists, or its grade or teacher is unknown",
            fields.name
        )))?;

        tracing::info!(group_id = group.group_id, name = %group.name, "created group");
        Ok(group)
    }

    /// Updates the group. A grade change drops every membership of the
    /// group; a teacher or name change leaves them alone.
    pub async fn update(id: i64, update: NewGroup, pool: &PgPool) -> CenterResult<Self> {
        let fields = update.validate()?;

        let mut transaction = pool.begin().await?;
        let current_grade = sqlx::query_scalar::<_, i64>(
            "SELECT grade_id FROM study_groups WHERE group_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut transaction)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No group with id {}", id)))?;

        if current_grade != fields.grade_id {
            let dropped = sqlx::query("DELETE FROM group_students WHERE group_id = $1")
                .bind(id)
                .execute(&mut transaction)
                .await?;
            tracing::info!(
                group_id = id,
                memberships = dropped.rows_affected(),
                "group changed grade, memberships dropped"
            );
        }

        let group = sqlx::query_as::<_, Self>(
            "UPDATE study_groups SET name = $1, grade_id = $2, teacher_id = $3
             WHERE group_id = $4
             RETURNING group_id, name, grade_id, teacher_id",
        )
        .bind(fields.name)
        .bind(fields.grade_id)
        .bind(fields.teacher_id)
        .bind(id)
        .fetch_one(&mut transaction)
        .await
        .map_err(CenterError::conflict(format!(
            "A group named {} already exists, or its grade or teacher is unknown",
            fields.name
        )))?;

        transaction.commit().await?;
        Ok(group)
    }

    pub async fn delete(id: i64, pool: &PgPool) -> CenterResult<()> {
        let mut transaction = pool.begin().await?;

        sqlx::query(
            "DELETE FROM attendance WHERE schedule_id IN
                 (SELECT schedule_id FROM schedule WHERE group_id = $1)",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        sqlx::query(
            "DELETE FROM student_notes WHERE schedule_id IN
                 (SELECT schedule_id FROM schedule WHERE group_id = $1)",
        )
        .bind(id)
        .execute(&mut transaction)
        .await?;
        for table in ["student_group_fees", "group_students", "schedule"] {
            sqlx::query(&format!("DELETE FROM {} WHERE group_id = $1", table))
                .bind(id)
                .execute(&mut transaction)
                .await?;
        }

        let result = sqlx::query("DELETE FROM study_groups WHERE group_id = $1")
            .bind(id)
            .execute(&mut transaction)
            .await
            .map_err(CenterError::conflict(format!(
                "Group {} still has dependent data",
                id
            )))?;
        if result.rows_affected() == 0 {
            return Err(CenterError::NotFound(format!("No group with id {}", id)));
        }

        transaction.commit().await?;
        Ok(())
    }
}

/// The body for creating or updating a group.
///
/// ## Expected Format:
///
/// |   Field   |  Type  | Required? |
/// |-----------|--------|:---------:|
/// | name      | string |     ✓     |
/// | gradeId   | number |     ✓     |
/// | teacherId | number |     ✓     |
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    #[serde(alias = "NAME", alias = "GROUP_NAME")]
    pub name: Option<String>,
    #[serde(alias = "GRADE_ID")]
    pub grade_id: Option<LooseNumber>,
    #[serde(alias = "TEACHER_ID")]
    pub teacher_id: Option<LooseNumber>,
}

struct GroupFields<'a> {
    name: &'a str,
    grade_id: i64,
    teacher_id: i64,
}

impl NewGroup {
    fn validate(&self) -> CenterResult<GroupFields<'_>> {
        Ok(GroupFields {
            name: require_text(self.name.as_deref(), "name")?,
            grade_id: require_number(self.grade_id.as_ref(), "gradeId")?,
            teacher_id: require_number(self.teacher_id.as_ref(), "teacherId")?,
        })
    }
}
