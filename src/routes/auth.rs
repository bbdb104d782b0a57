use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use diesel::prelude::*;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    models::{NewUser, Role, User},
    schema::users,
    state::AppState,
    utils::validation::{is_strong_password, is_valid_email},
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Session payload returned by register and login: the public user fields
/// plus a freshly signed bearer token.
#[derive(Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub token: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub reset_token: String,
    pub reset_link: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    let mut errors = Vec::new();
    if username.chars().count() < 3 {
        errors.push("username must be at least 3 characters long".to_string());
    }
    if !is_valid_email(&email) {
        errors.push("a valid email address is required".to_string());
    }
    if !is_strong_password(&payload.password) {
        errors.push(
            "password must be at least 8 characters and contain an upper-case letter, \
             a lower-case letter, and a digit"
                .to_string(),
        );
    }
    let role = match Role::parse(&payload.role) {
        Some(role) => role,
        None => {
            errors.push("role must be either job_seeker or employer".to_string());
            Role::JobSeeker
        }
    };
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    let mut conn = state.db()?;

    let existing: Option<User> = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(AppError::conflict("user already exists"));
    }

    let new_user = NewUser {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash: password::hash_password(&payload.password)?,
        role: role.as_str().to_string(),
    };

    // The email pre-check races with concurrent registrations; the unique
    // constraint is the authority.
    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::conflict("user already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    tracing::info!(user_id = %new_user.id, role = %new_user.role, "registered new user");

    let token = state.jwt.generate_token(new_user.id, &new_user.role)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            id: new_user.id,
            username: new_user.username,
            email: new_user.email,
            role: new_user.role,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let email = payload.email.trim().to_lowercase();
    let mut conn = state.db()?;

    let user: Option<User> = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?;

    let Some(user) = user else {
        return Err(AppError::unauthorized("invalid credentials"));
    };

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized("invalid credentials"))?;
    if !valid {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let token = state.jwt.generate_token(user.id, &user.role)?;
    Ok(Json(SessionResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let mut conn = state.db()?;

    let record: Option<User> = users::table
        .find(user.user_id)
        .first(&mut conn)
        .optional()?;
    let Some(record) = record else {
        return Err(AppError::not_found("user not found"));
    };

    Ok(Json(ProfileResponse {
        id: record.id,
        username: record.username,
        email: record.email,
        role: record.role,
    }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ForgotPasswordResponse>> {
    let email = payload.email.trim().to_lowercase();
    let mut conn = state.db()?;

    let user: Option<User> = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?;
    let Some(user) = user else {
        return Err(AppError::not_found("no account with that email"));
    };

    let reset_token = generate_reset_token();
    let expiry = Utc::now()
        + ChronoDuration::minutes(state.config.reset_token_expiry_minutes);

    diesel::update(users::table.find(user.id))
        .set((
            users::reset_token.eq(Some(reset_token.as_str())),
            users::reset_token_expiry.eq(Some(expiry.naive_utc())),
        ))
        .execute(&mut conn)?;

    let reset_link = state.config.reset_link(&reset_token);
    state
        .mailer
        .send_reset_link(&user.email, &reset_link)
        .await?;

    Ok(Json(ForgotPasswordResponse {
        message: "password reset token generated".to_string(),
        reset_token,
        reset_link,
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if !is_strong_password(&payload.password) {
        return Err(AppError::validation(vec![
            "password must be at least 8 characters and contain an upper-case letter, \
             a lower-case letter, and a digit"
                .to_string(),
        ]));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let now = Utc::now().naive_utc();
    let mut conn = state.db()?;

    // Single conditional write: the token is consumed and the password
    // replaced only if the token is still current.
    let updated = diesel::update(
        users::table
            .filter(users::reset_token.eq(&token))
            .filter(users::reset_token_expiry.gt(now)),
    )
    .set((
        users::password_hash.eq(&password_hash),
        users::reset_token.eq(None::<String>),
        users::reset_token_expiry.eq(None::<NaiveDateTime>),
    ))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::bad_request("invalid or expired reset token"));
    }

    Ok(Json(
        serde_json::json!({ "message": "password reset successfully" }),
    ))
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
