use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{is_known_category, ViolationItem};
use crate::repo::violations::ViolationsBySection;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateViolationRequest {
    pub section: String,
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateViolationRequest {
    pub title: String,
}

pub async fn list_violations(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
) -> AppResult<Json<ViolationsBySection>> {
    Ok(Json(state.violations().all().await?))
}

pub async fn create_violation(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Json(payload): Json<CreateViolationRequest>,
) -> AppResult<(StatusCode, Json<ViolationItem>)> {
    if !is_known_category(&payload.section) {
        return Err(AppError::bad_request("unknown violation category"));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let item = state
        .violations()
        .add(&payload.section, &payload.title)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_violation(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path((section, id)): Path<(String, String)>,
    Json(payload): Json<UpdateViolationRequest>,
) -> AppResult<Json<ViolationItem>> {
    if !is_known_category(&section) {
        return Err(AppError::bad_request("unknown violation category"));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    state
        .violations()
        .update(&section, &id, &payload.title)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn delete_violation(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path((section, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    if !is_known_category(&section) {
        return Err(AppError::bad_request("unknown violation category"));
    }

    if !state.violations().delete(&section, &id).await? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
