use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::filters::ALL_INSPECTORS;
use crate::models::{NewUser, Role, UpdateUser, User, PREDEFINED_SUPERVISORY_WORKPLACES};
use crate::repo::users::inspectors_by_workplaces;
use crate::routes::require_current_user;
use crate::state::AppState;

/// Management endpoints return the stored user entries as-is; the whole
/// surface is manager-only.
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    auth.require_manager()?;
    Ok(Json(state.users().list().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(payload): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    auth.require_manager()?;

    if payload.username.trim().is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if state
        .users()
        .find_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("username already exists"));
    }

    let user = state.users().create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(updates): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    auth.require_manager()?;

    if let Some(username) = &updates.username {
        if username.trim().is_empty() {
            return Err(AppError::bad_request("username must not be empty"));
        }
        if let Some(existing) = state.users().find_by_username(username).await? {
            if existing.id != id {
                return Err(AppError::bad_request("username already exists"));
            }
        }
    }

    state
        .users()
        .update(&id, updates)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    auth.require_manager()?;

    if id == auth.user_id {
        return Err(AppError::bad_request("cannot delete your own account"));
    }

    if !state.users().delete(&id).await? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct InspectorsQuery {
    /// Comma-separated workplace selection.
    #[serde(rename = "workPlaces")]
    pub work_places: Option<String>,
}

/// Inspector pick-list for the selected workplaces. Supervisors and managers
/// get the "everyone" sentinel prepended so they can opt out of inspector
/// filtering.
pub async fn available_inspectors(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<InspectorsQuery>,
) -> AppResult<Json<Vec<String>>> {
    let selected: Vec<String> = query
        .work_places
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();

    if selected.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let users = state.users().list().await?;
    let mut inspectors = inspectors_by_workplaces(&users, &selected);

    if matches!(auth.role, Role::Manager | Role::Supervisor) && !inspectors.is_empty() {
        inspectors.insert(0, ALL_INSPECTORS.to_string());
    }

    Ok(Json(inspectors))
}

/// The workplaces the caller may filter by: the configured administrative
/// list, falling back to the predefined catalog for managers and the home
/// workplace for supervisors. Inspectors get none.
pub async fn available_work_places(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    let user = require_current_user(&state, &auth).await?;

    let administrative = user
        .administrative_work_places
        .clone()
        .unwrap_or_default();

    let work_places = match user.role {
        Role::Manager => {
            if administrative.is_empty() {
                PREDEFINED_SUPERVISORY_WORKPLACES
                    .iter()
                    .map(|place| place.to_string())
                    .collect()
            } else {
                administrative
            }
        }
        Role::Supervisor => {
            if !administrative.is_empty() {
                administrative
            } else if let Some(work_place) = user.work_place {
                vec![work_place]
            } else {
                Vec::new()
            }
        }
        Role::Inspector => Vec::new(),
    };

    Ok(Json(work_places))
}
