use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{Employer, JobSeeker},
    error::{AppError, AppResult},
    models::{Application, NewApplication},
    schema::{applications, jobs, users},
    state::AppState,
    workflow::{apply_transition, ApplicationStatus, TransitionOutcome},
};

use super::jobs::to_iso;

const MIN_COVER_LETTER_CHARS: usize = 100;

#[derive(Deserialize)]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    pub cover_letter: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cover_letter: String,
    pub status: String,
    pub created_at: String,
    pub job_title: String,
    pub company: String,
    pub applicant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_email: Option<String>,
}

/// Application plus the joined job title, company, applicant username, and
/// applicant email.
type ApplicationRow = (Application, String, String, String, String);

pub async fn submit_application(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Json(payload): Json<CreateApplicationRequest>,
) -> AppResult<(StatusCode, Json<ApplicationResponse>)> {
    if payload.cover_letter.trim().chars().count() < MIN_COVER_LETTER_CHARS {
        return Err(AppError::validation(vec![format!(
            "cover letter must be at least {MIN_COVER_LETTER_CHARS} characters long"
        )]));
    }

    let mut conn = state.db()?;

    let job_exists: bool = diesel::select(diesel::dsl::exists(
        jobs::table.filter(jobs::id.eq(payload.job_id)),
    ))
    .get_result(&mut conn)?;
    if !job_exists {
        return Err(AppError::not_found("job not found"));
    }

    let new_application = NewApplication {
        id: Uuid::new_v4(),
        job_id: payload.job_id,
        applicant_id: user.user_id,
        cover_letter: payload.cover_letter.trim().to_string(),
        status: ApplicationStatus::Pending.as_str().to_string(),
    };

    // One application per seeker per job; the unique constraint closes the
    // race between the existence check and the insert.
    match diesel::insert_into(applications::table)
        .values(&new_application)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::conflict("you have already applied for this job"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    tracing::info!(
        application_id = %new_application.id,
        job_id = %payload.job_id,
        "application submitted"
    );

    let row = load_application(&mut conn, new_application.id)?;
    Ok((
        StatusCode::CREATED,
        Json(to_application_response(row, false)),
    ))
}

pub async fn my_applications(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> AppResult<Json<Vec<ApplicationResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<ApplicationRow> = applications::table
        .inner_join(jobs::table)
        .inner_join(users::table)
        .filter(applications::applicant_id.eq(user.user_id))
        .order(applications::created_at.desc())
        .select((
            applications::all_columns,
            jobs::title,
            jobs::company,
            users::username,
            users::email,
        ))
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|row| to_application_response(row, false))
            .collect(),
    ))
}

/// Every application across all of the caller's job postings.
pub async fn employer_applications(
    State(state): State<AppState>,
    Employer(user): Employer,
) -> AppResult<Json<Vec<ApplicationResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<ApplicationRow> = applications::table
        .inner_join(jobs::table)
        .inner_join(users::table)
        .filter(jobs::employer_id.eq(user.user_id))
        .order(applications::created_at.desc())
        .select((
            applications::all_columns,
            jobs::title,
            jobs::company,
            users::username,
            users::email,
        ))
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|row| to_application_response(row, true))
            .collect(),
    ))
}

pub async fn job_applications(
    State(state): State<AppState>,
    Employer(user): Employer,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<Vec<ApplicationResponse>>> {
    let mut conn = state.db()?;

    // A job owned by another employer reads the same as a missing one.
    let owns_job: bool = diesel::select(diesel::dsl::exists(
        jobs::table
            .filter(jobs::id.eq(job_id))
            .filter(jobs::employer_id.eq(user.user_id)),
    ))
    .get_result(&mut conn)?;
    if !owns_job {
        return Err(AppError::not_found("job not found"));
    }

    let rows: Vec<ApplicationRow> = applications::table
        .inner_join(jobs::table)
        .inner_join(users::table)
        .filter(applications::job_id.eq(job_id))
        .order(applications::created_at.desc())
        .select((
            applications::all_columns,
            jobs::title,
            jobs::company,
            users::username,
            users::email,
        ))
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|row| to_application_response(row, true))
            .collect(),
    ))
}

pub async fn update_status(
    State(state): State<AppState>,
    Employer(user): Employer,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApplicationResponse>> {
    let requested = ApplicationStatus::parse(payload.status.trim()).ok_or_else(|| {
        AppError::bad_request(
            "status must be one of pending, reviewing, interview, accepted, or rejected",
        )
    })?;

    let mut conn = state.db()?;

    let row: Option<(Application, Uuid)> = applications::table
        .inner_join(jobs::table)
        .filter(applications::id.eq(application_id))
        .select((applications::all_columns, jobs::employer_id))
        .first(&mut conn)
        .optional()?;
    let Some((application, employer_id)) = row else {
        return Err(AppError::not_found("application not found"));
    };
    if employer_id != user.user_id {
        return Err(AppError::not_found("application not found"));
    }

    let current = ApplicationStatus::parse(&application.status)
        .ok_or_else(|| AppError::internal("application has an unknown stored status"))?;

    match apply_transition(current, requested) {
        Ok(TransitionOutcome::Unchanged) => {}
        Ok(TransitionOutcome::Changed(next)) => {
            // Conditional write: qualified by current status and by job
            // ownership so a concurrent transition or takeover cannot slip
            // through between the read above and this update.
            let updated = diesel::update(
                applications::table
                    .filter(applications::id.eq(application_id))
                    .filter(applications::status.eq(current.as_str()))
                    .filter(
                        applications::job_id.eq_any(
                            jobs::table
                                .select(jobs::id)
                                .filter(jobs::employer_id.eq(user.user_id)),
                        ),
                    ),
            )
            .set(applications::status.eq(next.as_str()))
            .execute(&mut conn)?;

            if updated == 0 {
                return Err(AppError::conflict(
                    "application was modified concurrently",
                ));
            }

            tracing::info!(
                application_id = %application_id,
                from = %current,
                to = %next,
                "application status updated"
            );
        }
        Err(err) => return Err(AppError::invalid_transition(err.to_string())),
    }

    let row = load_application(&mut conn, application_id)?;
    Ok(Json(to_application_response(row, true)))
}

fn load_application(conn: &mut PgConnection, application_id: Uuid) -> AppResult<ApplicationRow> {
    Ok(applications::table
        .inner_join(jobs::table)
        .inner_join(users::table)
        .filter(applications::id.eq(application_id))
        .select((
            applications::all_columns,
            jobs::title,
            jobs::company,
            users::username,
            users::email,
        ))
        .first(conn)?)
}

fn to_application_response(row: ApplicationRow, include_email: bool) -> ApplicationResponse {
    let (application, job_title, company, applicant_name, applicant_email) = row;
    ApplicationResponse {
        id: application.id,
        job_id: application.job_id,
        applicant_id: application.applicant_id,
        cover_letter: application.cover_letter,
        status: application.status,
        created_at: to_iso(application.created_at),
        job_title,
        company,
        applicant_name,
        applicant_email: include_email.then_some(applicant_email),
    }
}
