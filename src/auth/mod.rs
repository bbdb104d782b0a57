pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::{error::AppError, models::Role, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized("authentication required"))?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized("invalid or expired token"))?;

        let role = Role::parse(&claims.role)
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role,
        })
    }
}

/// Caller proven to hold the employer role. Wrong role rejects with 403.
pub struct Employer(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for Employer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if user.role != Role::Employer {
            return Err(AppError::forbidden("employers only"));
        }
        Ok(Employer(user))
    }
}

/// Caller proven to hold the job-seeker role. Wrong role rejects with 403.
pub struct JobSeeker(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for JobSeeker {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if user.role != Role::JobSeeker {
            return Err(AppError::forbidden("job seekers only"));
        }
        Ok(JobSeeker(user))
    }
}
