use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{CenterError, CenterResult};
use crate::util::{require_number, require_text, LooseNumber};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub grade_id: i64,
}

/// A search hit: just enough to pick the student from a list.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentMatch {
    #[serde(rename = "id")]
    pub student_id: i64,
    pub name: String,
}

impl Student {
    pub async fn with_id_opt(id: i64, pool: &PgPool) -> CenterResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT student_id, name, phone, grade_id FROM students WHERE student_id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn all(pool: &PgPool) -> CenterResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT student_id, name, phone, grade_id FROM students ORDER BY student_id",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Case-insensitive substring match on the name.
    pub async fn search(name: &str, pool: &PgPool) -> CenterResult<Vec<StudentMatch>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, StudentMatch>(
            "SELECT student_id, name FROM students
             WHERE name ILIKE '%' || $1 || '%'
             ORDER BY name",
        )
        .bind(name)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create(new_student: NewStudent, pool: &PgPool) -> CenterResult<Self> {
        let (name, grade_id) = new_student.required()?;

        sqlx::query_as::<_, Self>(
            "INSERT INTO students (name, phone, grade_id) VALUES ($1, $2, $3)
             RETURNING student_id, name, phone, grade_id",
        )
        .bind(name)
        .bind(&new_student.phone)
        .bind(grade_id)
        .fetch_one(pool)
        .await
        .map_err(CenterError::conflict(format!("No grade with id {}", grade_id)))
    }

    /// Updates the student. Moving to another grade drops every group
    /// membership, since members must share their group's grade.
    pub async fn update(id: i64, update: NewStudent, pool: &PgPool) -> CenterResult<Self> {
        let (name, grade_id) = update.required()?;

        let mut transaction = pool.begin().await?;
        let current_grade = sqlx::query_scalar::<_, i64>(
            "SELECT grade_id FROM students WHERE student_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut transaction)
        .await?
        .ok_or_else(|| CenterError::NotFound(format!("No student with id {}", id)))?;

        if current_grade != grade_id {
            let dropped = sqlx::query("DELETE FROM group_students WHERE student_id = $1")
                .bind(id)
                .execute(&mut transaction)
                .await?;
            tracing::info!(
                student_id = id,
                memberships = dropped.rows_affected(),
                "student changed grade, memberships dropped"
            );
        }

        let student = sqlx::query_as::<_, Self>(
            "UPDATE students SET name = $1, phone = $2, grade_id = $3 WHERE student_id = $4
             RETURNING student_id, name, phone, grade_id",
        )
        .bind(name)
        .bind(&update.phone)
        .bind(grade_id)
        .bind(id)
        .fetch_one(&mut transaction)
        .await
        .map_err(CenterError::conflict(format!("No grade with id {}", grade_id)))?;

        transaction.commit().await?;
        Ok(student)
    }

    pub async fn delete(id: i64, pool: &PgPool) -> CenterResult<()> {
        let mut transaction = pool.begin().await?;

        for table in [
            "attendance",
            "student_notes",
            "student_group_fees",
            "group_students",
        ] {
            sqlx::query(&format!("DELETE FROM {} WHERE student_id = $1", table))
                .bind(id)
                .execute(&mut transaction)
                .await?;
        }

        let result = sqlx::query("DELETE FROM students WHERE student_id = $1")
            .bind(id)
            .execute(&mut transaction)
            .await
            .map_err(CenterError::conflict(format!(
                "Student {} is still referenced elsewhere",
                id
            )))?;
        if result.rows_affected() == 0 {
            return Err(CenterError::NotFound(format!("No student with id {}", id)));
        }

        transaction.commit().await?;
        Ok(())
    }
}

/// The body for creating or updating a student.
///
/// ## Expected Format:
///
/// |  Field  |  Type  | Required? |
/// |---------|--------|:---------:|
/// | name    | string |     ✓     |
/// | phone   | string |           |
/// | gradeId | number |     ✓     |
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[serde(alias = "NAME")]
    pub name: Option<String>,
    #[serde(alias = "PHONE")]
    pub phone: Option<String>,
    #[serde(alias = "GRADE_ID")]
    pub grade_id: Option<LooseNumber>,
}

impl NewStudent {
    fn required(&self) -> CenterResult<(&str, i64)> {
        Ok((
            require_text(self.name.as_deref(), "name")?,
            require_number(self.grade_id.as_ref(), "gradeId")?,
        ))
    }
}
