use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::export::html::record_report_document;
use crate::filters::SearchFilters;
use crate::models::{InspectionRecord, NewInspectionRecord, UpdateInspectionRecord};
use crate::routes::require_current_user;
use crate::state::AppState;
use crate::validate::validate_basic_data;

#[derive(Deserialize)]
pub struct RecordListQuery {
    /// `my` restricts the list to the caller's own records regardless of role.
    pub view: Option<String>,
}

#[derive(Serialize)]
pub struct RecordListItem {
    #[serde(flatten)]
    pub record: InspectionRecord,
    /// Derived from attachment resolution at read time; no counter is stored.
    #[serde(rename = "attachmentsCount")]
    pub attachments_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub filters: SearchFilters,
    pub view: Option<String>,
}

fn is_my_view(view: &Option<String>) -> bool {
    view.as_deref() == Some("my")
}

async fn with_attachment_counts(
    state: &AppState,
    records: Vec<InspectionRecord>,
) -> AppResult<Vec<RecordListItem>> {
    let attachments = state.attachments();
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let attachments_count = attachments.resolve(&record.id).await?.len();
        items.push(RecordListItem {
            record,
            attachments_count,
        });
    }
    Ok(items)
}

pub async fn list_records(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<RecordListQuery>,
) -> AppResult<Json<Vec<RecordListItem>>> {
    let user = require_current_user(&state, &auth).await?;
    let records = state
        .records()
        .search(&user, is_my_view(&query.view), &SearchFilters::default())
        .await?;
    Ok(Json(with_attachment_counts(&state, records).await?))
}

pub async fn search_records(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<Vec<RecordListItem>>> {
    let user = require_current_user(&state, &auth).await?;
    let records = state
        .records()
        .search(&user, is_my_view(&request.view), &request.filters)
        .await?;
    Ok(Json(with_attachment_counts(&state, records).await?))
}

pub async fn create_record(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(payload): Json<NewInspectionRecord>,
) -> AppResult<(StatusCode, Json<InspectionRecord>)> {
    let missing = validate_basic_data(&payload.basic_data);
    if !missing.is_empty() {
        return Err(AppError::validation(missing));
    }

    let record = state.records().create(payload, &auth.name).await?;
    info!(record_id = %record.id, serial = %record.serial_number, "inspection record created");

    // Resolution step 2 finds any attachments embedded in the submitted
    // items and materializes the canonical key right away.
    state.attachments().resolve(&record.id).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<RecordListItem>> {
    let record = state
        .records()
        .find(&id)
        .await?
        .ok_or_else(AppError::not_found)?;
    let attachments_count = state.attachments().resolve(&id).await?.len();
    Ok(Json(RecordListItem {
        record,
        attachments_count,
    }))
}

pub async fn update_record(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(updates): Json<UpdateInspectionRecord>,
) -> AppResult<Json<InspectionRecord>> {
    state
        .records()
        .update(&id, updates)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn delete_record(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !state.records().delete(&id).await? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn print_record(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let record = state
        .records()
        .find(&id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Html(record_report_document(&[record])))
}
