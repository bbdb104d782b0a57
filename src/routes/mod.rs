use axum::http::HeaderValue;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/:token", post(auth::reset_password))
        .route("/profile", get(auth::profile));

    // Listing and detail are public; everything else carries role and
    // ownership checks in the handlers' extractors.
    let jobs_routes = Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::create_job))
        .route("/employer/listings", get(jobs::employer_listings))
        .route(
            "/:id",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        );

    let applications_routes = Router::new()
        .route("/", post(applications::submit_application))
        .route("/mine", get(applications::my_applications))
        .route("/employer", get(applications::employer_applications))
        .route("/job/:id", get(applications::job_applications))
        .route("/:id/status", put(applications::update_status));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/jobs", jobs_routes)
        .nest("/api/applications", applications_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
