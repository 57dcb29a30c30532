use axum::http::{HeaderValue, StatusCode};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

pub mod attachments;
pub mod auth;
pub mod backup;
pub mod health;
pub mod records;
pub mod reports;
pub mod users;
pub mod violations;

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

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
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
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let records_routes = Router::new()
        .route(
            "/",
            get(records::list_records).post(records::create_record),
        )
        .route("/search", post(records::search_records))
        .route(
            "/:id",
            get(records::get_record)
                .patch(records::update_record)
                .delete(records::delete_record),
        )
        .route("/:id/print", get(records::print_record))
        .route(
            "/:id/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachments),
        )
        .route("/:id/attachments/bundle", get(attachments::download_bundle))
        .route(
            "/:id/attachments/:attachment_id/link",
            get(attachments::attachment_link),
        );

    let attachments_routes = Router::new().route("/reindex", post(attachments::reindex));

    let users_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/inspectors", get(users::available_inspectors))
        .route("/workplaces", get(users::available_work_places))
        .route(
            "/:id",
            patch(users::update_user).delete(users::delete_user),
        );

    let violations_routes = Router::new()
        .route(
            "/",
            get(violations::list_violations).post(violations::create_violation),
        )
        .route(
            "/:section/:id",
            patch(violations::update_violation).delete(violations::delete_violation),
        );

    let reports_routes = Router::new()
        .route("/search", post(reports::search_report))
        .route("/export/csv", post(reports::export_csv))
        .route("/export/report", post(reports::export_report))
        .route("/export/table", post(reports::export_table));

    let backup_routes = Router::new()
        .route("/", get(backup::create_backup))
        .route("/restore", post(backup::restore_backup));

    let download_routes =
        Router::new().route("/download/:token", get(attachments::download_with_token));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/records", records_routes)
        .nest("/api/attachments", attachments_routes)
        .nest("/api/users", users_routes)
        .nest("/api/violations", violations_routes)
        .nest("/api/reports", reports_routes)
        .nest("/api/backup", backup_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(download_routes)
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 64))
}

/// Loads the caller's full stored profile; the token only carries the
/// identity fields, not the workplace scoping.
pub(crate) async fn require_current_user(
    state: &AppState,
    auth: &AuthenticatedUser,
) -> AppResult<User> {
    state
        .users()
        .find(&auth.user_id)
        .await?
        .ok_or_else(AppError::unauthorized)
}

/// Content-Disposition for file downloads. The plain `filename` fallback
/// must stay visible-ASCII to be a legal header value; the original name is
/// carried percent-encoded in the `filename*` variant.
pub(crate) fn attachment_disposition(filename: &str) -> AppResult<HeaderValue> {
    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch.is_ascii_graphic() || ch == ' ' => ch,
            _ => '_',
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(filename, percent_encoding::NON_ALPHANUMERIC);
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    );

    HeaderValue::from_str(&value)
        .map_err(|_| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "invalid download filename"))
}
