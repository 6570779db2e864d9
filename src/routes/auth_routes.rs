//! Login and password routes.

use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::CenterResult;
use crate::extract::ApiJson;
use crate::models::account::{LoginForm, PasswordChange, UserAccount};

/// Log in.
///
/// ## Input Format:
///
/// ```json
/// {
///     "username": string,
///     "password": string
/// }
/// ```
///
/// ## Return Format:
///
/// ```json
/// {
///     "message": string,
///     "user": LoginProfile
/// }
/// ```
///
/// See [LoginProfile](crate::models::account::LoginProfile). Unknown users
/// and wrong passwords both get the same 401.
pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Arc<Config>>,
    ApiJson(form): ApiJson<LoginForm>,
) -> CenterResult<Json<Value>> {
    let profile = UserAccount::login(form, config.profile_policy, &pool).await?;
    tracing::info!(user_id = profile.id, role = %profile.role, "logged in");

    Ok(Json(json!({
        "message": "Login successful",
        "user": profile,
    })))
}

/// Change a password.
///
/// ## Input Format:
///
/// Expects a [PasswordChange](crate::models::account::PasswordChange).
pub async fn change_password(
    Extension(pool): Extension<PgPool>,
    ApiJson(form): ApiJson<PasswordChange>,
) -> CenterResult<Json<Value>> {
    UserAccount::change_password(form, &pool).await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}
