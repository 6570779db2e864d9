use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::config::ProfilePolicy;
use crate::error::{AuthFailure, CenterError, CenterResult};
use crate::util::{require_number, require_text, LooseNumber};

pub const TEACHER_ROLE: &str = "teacher";
pub const ADMIN_ROLE: &str = "admin";

/// A login account. Teachers get one when they are created.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub user_id: i64,
    pub username: String,
    pub pass_hash: String,
    pub role: String,
    pub teacher_id: Option<i64>,
}

/// What a successful login returns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginProfile {
    pub id: i64,
    pub username: String,
    #[serde(rename = "Role")]
    pub role: String,
    pub teacher_id: Option<i64>,
    #[serde(flatten)]
    pub teacher: Option<TeacherProfile>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeacherProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "phone")]
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub image: Option<String>,
    pub subject: Option<String>,
    pub golden: bool,
}

impl UserAccount {
    pub async fn with_username_opt(username: &str, pool: &PgPool) -> CenterResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT user_id, username, password AS pass_hash, role, teacher_id
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn with_id_opt(id: i64, pool: &PgPool) -> CenterResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT user_id, username, password AS pass_hash, role, teacher_id
             FROM users WHERE user_id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create_for_teacher(
        username: &str,
        pass_hash: &str,
        teacher_id: i64,
        transaction: &mut Transaction<'_, Postgres>,
    ) -> CenterResult<()> {
        sqlx::query(
            "INSERT INTO users (username, password, role, teacher_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(username)
        .bind(pass_hash)
        .bind(TEACHER_ROLE)
        .bind(teacher_id)
        .execute(&mut *transaction)
        .await
        .map_err(CenterError::conflict(format!(
            "The username {} is already taken",
            username
        )))?;

        Ok(())
    }

    /// Checks the credentials and builds the login response.
    ///
    /// The teacher profile is merged in when the account references a
    /// teacher and the policy includes the account's role.
    pub async fn login(
        form: LoginForm,
        policy: ProfilePolicy,
        pool: &PgPool,
    ) -> CenterResult<LoginProfile> {
        let username = require_text(form.username.as_deref(), "username")?;
        let password = require_text(form.password.as_deref(), "password")?;

        let account = Self::with_username_opt(username, pool)
            .await?
            .ok_or(CenterError::Auth(AuthFailure::UnknownUser))?;
        if !bcrypt::verify(password, &account.pass_hash)? {
            return Err(CenterError::Auth(AuthFailure::WrongPassword));
        }

        let teacher = match account.teacher_id {
            Some(teacher_id) if policy.includes(&account.role) => {
                sqlx::query_as::<_, TeacherProfile>(
                    "SELECT first_name, last_name, phone_number, gender, image, subject, golden
                     FROM teachers WHERE teacher_id = $1",
                )
                .bind(teacher_id)
                .fetch_optional(pool)
                .await?
            }
            _ => None,
        };

        Ok(LoginProfile {
            id: account.user_id,
            username: account.username,
            role: account.role,
            teacher_id: account.teacher_id,
            teacher,
        })
    }

    pub async fn change_password(form: PasswordChange, pool: &PgPool) -> CenterResult<()> {
        let user_id = require_number(form.user_id.as_ref(), "USER_ID")?;
        let current = require_text(form.current_password.as_deref(), "CURRENT_PASSWORD")?;
        let new_password = form
            .new_password
            .as_deref()
            .filter(|password| !password.is_empty())
            .ok_or_else(|| CenterError::Validation("NEW_PASSWORD is required".to_owned()))?;
        if !is_strong_password(new_password) {
            return Err(CenterError::Validation(
                "The new password must be at least 8 characters and mix lower case, \
                 upper case, digits and one of @$!%*?&"
                    .to_owned(),
            ));
        }

        let account = Self::with_id_opt(user_id, pool)
            .await?
            .ok_or_else(|| CenterError::NotFound(format!("No user with id {}", user_id)))?;
        if !bcrypt::verify(current, &account.pass_hash)? {
            return Err(CenterError::Auth(AuthFailure::WrongPassword));
        }

        let new_hash = bcrypt::hash(new_password, 10)?;
        sqlx::query("UPDATE users SET password = $1 WHERE user_id = $2")
            .bind(new_hash)
            .bind(user_id)
            .execute(pool)
            .await?;

        tracing::info!(user_id, "password changed");
        Ok(())
    }
}

/// At least 8 characters from `[A-Za-z0-9@$!%*?&]`, with at least one of
/// each: lower case, upper case, digit, special character.
pub fn is_strong_password(password: &str) -> bool {
    let allowed = Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$").unwrap();
    let required = [r"[a-z]", r"[A-Z]", r"\d", r"[@$!%*?&]"];

    allowed.is_match(password)
        && required
            .iter()
            .all(|class| Regex::new(class).unwrap().is_match(password))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(alias = "Username")]
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    #[serde(rename = "USER_ID", alias = "userId")]
    pub user_id: Option<LooseNumber>,
    #[serde(rename = "CURRENT_PASSWORD", alias = "currentPassword")]
    pub current_password: Option<String>,
    #[serde(rename = "NEW_PASSWORD", alias = "newPassword")]
    pub new_password: Option<String>,
}
