use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{CenterError, CenterResult};
use crate::models::student::Student;
use crate::util::{require_number, LooseNumber};

/// A student's seat in a group. Members always share the group's grade.
pub struct Membership;

impl Membership {
    pub async fn members(group_id: i64, pool: &PgPool) -> CenterResult<Vec<Student>> {
        sqlx::query_as::<_, Student>(
            "SELECT s.student_id, s.name, s.phone, s.grade_id
             FROM group_students gs
             JOIN students s ON s.student_id = gs.student_id
             WHERE gs.group_id = $1
             ORDER BY s.name",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Students of the group's grade who aren't in the group yet.
    pub async fn eligible(group_id: i64, pool: &PgPool) -> CenterResult<Vec<Student>> {
        let grade_id = sqlx::query_scalar::<_, i64>(
            "SELECT grade_id FROM study_groups WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No group with id {}", group_id)))?;

        sqlx::query_as::<_, Student>(
            "SELECT s.student_id, s.name, s.phone, s.grade_id
             FROM students s
             WHERE s.grade_id = $1
               AND NOT EXISTS (
                   SELECT 1 FROM group_students gs
                   WHERE gs.group_id = $2 AND gs.student_id = s.student_id)
             ORDER BY s.name",
        )
        .bind(grade_id)
        .bind(group_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Admits the student to the group. The grades are locked while the
    /// membership is written so a concurrent grade change can't slip in.
    pub async fn add(group_id: i64, student_id: i64, pool: &PgPool) -> CenterResult<()> {
        let mut transaction = pool.begin().await?;

        let group_grade = sqlx::query_scalar::<_, i64>(
            "SELECT grade_id FROM study_groups WHERE group_id = $1 FOR SHARE",
        )
        .bind(group_id)
        .fetch_optional(&mut transaction)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No group with id {}", group_id)))?;
        let student_grade = sqlx::query_scalar::<_, i64>(
            "SELECT grade_id FROM students WHERE student_id = $1 FOR SHARE",
        )
        .bind(student_id)
        .fetch_optional(&mut transaction)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No student with id {}", student_id)))?;

        if group_grade != student_grade {
            return Err(CenterError::Conflict(format!(
                "Student {} is in grade {} but group {} is for grade {}",
                student_id, student_grade, group_id, group_grade
            )));
        }

        sqlx::query("INSERT INTO group_students (group_id, student_id) VALUES ($1, $2)")
            .bind(group_id)
            .bind(student_id)
            .execute(&mut transaction)
            .await
            .map_err(CenterError::conflict(format!(
                "Student {} is already in group {}",
                student_id, group_id
            )))?;

        transaction.commit().await?;
        tracing::info!(group_id, student_id, "student joined group");
        Ok(())
    }

    pub async fn remove(group_id: i64, student_id: i64, pool: &PgPool) -> CenterResult<()> {
        let result =
            sqlx::query("DELETE FROM group_students WHERE group_id = $1 AND student_id = $2")
                .bind(group_id)
                .bind(student_id)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            Err(CenterError::NotFound(format!(
                "Student {} is not in group {}",
                student_id, group_id
            )))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    #[serde(alias = "STUDENT_ID")]
    pub student_id: Option<LooseNumber>,
}

impl NewMember {
    pub fn student_id(&self) -> CenterResult<i64> {
        require_number(self.student_id.as_ref(), "studentId")
    }
}
