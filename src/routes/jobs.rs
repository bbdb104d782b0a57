use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Employer,
    error::{AppError, AppResult},
    models::{Job, JobType, NewJob},
    schema::{jobs, users},
    state::AppState,
};

#[derive(Deserialize)]
pub struct JobPayload {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub description: String,
    pub requirements: String,
    pub salary: i64,
}

#[derive(Deserialize)]
pub struct JobListQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub description: String,
    pub requirements: String,
    pub salary: i64,
    pub employer_name: String,
    pub created_at: String,
}

struct ValidatedJob {
    title: String,
    company: String,
    location: String,
    job_type: JobType,
    description: String,
    requirements: String,
    salary: i64,
}

fn validate_job_payload(payload: &JobPayload) -> Result<ValidatedJob, AppError> {
    let mut errors = Vec::new();

    let title = payload.title.trim();
    if title.chars().count() < 3 {
        errors.push("job title must be at least 3 characters long".to_string());
    }
    let company = payload.company.trim();
    if company.chars().count() < 2 {
        errors.push("company name must be at least 2 characters long".to_string());
    }
    let location = payload.location.trim();
    if location.chars().count() < 2 {
        errors.push("location must be at least 2 characters long".to_string());
    }
    let job_type = JobType::parse(&payload.job_type);
    if job_type.is_none() {
        errors.push(
            "type must be one of full-time, part-time, contract, or remote".to_string(),
        );
    }
    let description = payload.description.trim();
    if description.chars().count() < 50 {
        errors.push("job description must be at least 50 characters long".to_string());
    }
    let requirements = payload.requirements.trim();
    if requirements.is_empty() {
        errors.push("requirements must not be empty".to_string());
    }
    if payload.salary < 0 {
        errors.push("salary must be a positive number".to_string());
    }

    match (errors.is_empty(), job_type) {
        (true, Some(job_type)) => Ok(ValidatedJob {
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            job_type,
            description: description.to_string(),
            requirements: requirements.to_string(),
            salary: payload.salary,
        }),
        _ => Err(AppError::validation(errors)),
    }
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<Json<Vec<JobResponse>>> {
    let mut query = jobs::table
        .inner_join(users::table)
        .select((jobs::all_columns, users::username))
        .order(jobs::created_at.desc())
        .into_boxed();

    if let Some(search) = trimmed(params.search.as_deref()) {
        let pattern = format!("%{search}%");
        query = query.filter(
            jobs::title
                .ilike(pattern.clone())
                .or(jobs::company.ilike(pattern.clone()))
                .or(jobs::description.ilike(pattern)),
        );
    }

    if let Some(location) = trimmed(params.location.as_deref()) {
        query = query.filter(jobs::location.ilike(format!("%{location}%")));
    }

    if let Some(ty) = trimmed(params.job_type.as_deref()) {
        if ty != "all" {
            let parsed = JobType::parse(ty).ok_or_else(|| {
                AppError::bad_request(
                    "type must be one of full-time, part-time, contract, or remote",
                )
            })?;
            query = query.filter(jobs::job_type.eq(parsed.as_str()));
        }
    }

    let mut conn = state.db()?;
    let rows: Vec<(Job, String)> = query.load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|(job, employer_name)| to_job_response(job, employer_name))
            .collect(),
    ))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<JobResponse>> {
    let mut conn = state.db()?;
    let row: Option<(Job, String)> = jobs::table
        .inner_join(users::table)
        .filter(jobs::id.eq(job_id))
        .select((jobs::all_columns, users::username))
        .first(&mut conn)
        .optional()?;

    let Some((job, employer_name)) = row else {
        return Err(AppError::not_found("job not found"));
    };
    Ok(Json(to_job_response(job, employer_name)))
}

pub async fn create_job(
    State(state): State<AppState>,
    Employer(user): Employer,
    Json(payload): Json<JobPayload>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let validated = validate_job_payload(&payload)?;
    let mut conn = state.db()?;

    let new_job = NewJob {
        id: Uuid::new_v4(),
        employer_id: user.user_id,
        title: validated.title,
        company: validated.company,
        location: validated.location,
        job_type: validated.job_type.as_str().to_string(),
        description: validated.description,
        requirements: validated.requirements,
        salary: validated.salary,
    };

    diesel::insert_into(jobs::table)
        .values(&new_job)
        .execute(&mut conn)?;

    tracing::info!(job_id = %new_job.id, employer_id = %user.user_id, "job posted");

    let (job, employer_name) = load_job(&mut conn, new_job.id)?;
    Ok((StatusCode::CREATED, Json(to_job_response(job, employer_name))))
}

pub async fn update_job(
    State(state): State<AppState>,
    Employer(user): Employer,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<JobPayload>,
) -> AppResult<Json<JobResponse>> {
    let validated = validate_job_payload(&payload)?;
    let mut conn = state.db()?;

    // Ownership-qualified write. A job owned by someone else is
    // indistinguishable from a missing one.
    let updated = diesel::update(
        jobs::table
            .filter(jobs::id.eq(job_id))
            .filter(jobs::employer_id.eq(user.user_id)),
    )
    .set((
        jobs::title.eq(&validated.title),
        jobs::company.eq(&validated.company),
        jobs::location.eq(&validated.location),
        jobs::job_type.eq(validated.job_type.as_str()),
        jobs::description.eq(&validated.description),
        jobs::requirements.eq(&validated.requirements),
        jobs::salary.eq(validated.salary),
    ))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found("job not found"));
    }

    let (job, employer_name) = load_job(&mut conn, job_id)?;
    Ok(Json(to_job_response(job, employer_name)))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Employer(user): Employer,
    Path(job_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    let deleted = diesel::delete(
        jobs::table
            .filter(jobs::id.eq(job_id))
            .filter(jobs::employer_id.eq(user.user_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::not_found("job not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn employer_listings(
    State(state): State<AppState>,
    Employer(user): Employer,
) -> AppResult<Json<Vec<JobResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<(Job, String)> = jobs::table
        .inner_join(users::table)
        .filter(jobs::employer_id.eq(user.user_id))
        .order(jobs::created_at.desc())
        .select((jobs::all_columns, users::username))
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|(job, employer_name)| to_job_response(job, employer_name))
            .collect(),
    ))
}

fn load_job(conn: &mut PgConnection, job_id: Uuid) -> AppResult<(Job, String)> {
    Ok(jobs::table
        .inner_join(users::table)
        .filter(jobs::id.eq(job_id))
        .select((jobs::all_columns, users::username))
        .first(conn)?)
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(super) fn to_iso(timestamp: NaiveDateTime) -> String {
    timestamp.and_utc().to_rfc3339()
}

fn to_job_response(job: Job, employer_name: String) -> JobResponse {
    JobResponse {
        id: job.id,
        employer_id: job.employer_id,
        title: job.title,
        company: job.company,
        location: job.location,
        job_type: job.job_type,
        description: job.description,
        requirements: job.requirements,
        salary: job.salary,
        employer_name,
        created_at: to_iso(job.created_at),
    }
}
