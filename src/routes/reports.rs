use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::export::csv::records_to_csv;
use crate::export::html::{record_report_document, table_report_document};
use crate::export::{statistics, ReportStatistics};
use crate::filters::{should_show_data, SearchFilters};
use crate::models::{InspectionRecord, User};
use crate::routes::{attachment_disposition, require_current_user};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRequest {
    pub filters: SearchFilters,
    /// `my` scopes the report to the caller's own records.
    pub view: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub should_show_data: bool,
    pub statistics: ReportStatistics,
    pub records: Vec<InspectionRecord>,
}

/// The supervisor/manager gate plus the shared filter pipeline. Returns the
/// caller and the visible record set.
async fn resolve_report(
    state: &AppState,
    auth: &AuthenticatedUser,
    request: &ReportRequest,
) -> AppResult<(User, bool, Vec<InspectionRecord>)> {
    let user = require_current_user(state, auth).await?;
    let my_view = request.view.as_deref() == Some("my");
    let show = should_show_data(&user, my_view, &request.filters);

    let records = if show {
        state
            .records()
            .search(&user, my_view, &request.filters)
            .await?
    } else {
        Vec::new()
    };

    Ok((user, show, records))
}

pub async fn search_report(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<ReportRequest>,
) -> AppResult<Json<ReportResponse>> {
    let (_, should_show, records) = resolve_report(&state, &auth, &request).await?;

    Ok(Json(ReportResponse {
        should_show_data: should_show,
        statistics: statistics(&records),
        records,
    }))
}

fn file_download(
    content_type: &'static str,
    filename: &str,
    body: String,
) -> AppResult<(HeaderMap, String)> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_DISPOSITION, attachment_disposition(filename)?);
    Ok((headers, body))
}

fn base_name(request: &ReportRequest) -> String {
    request
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("inspection_records")
        .to_string()
}

pub async fn export_csv(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<ReportRequest>,
) -> AppResult<(HeaderMap, String)> {
    let (_, _, records) = resolve_report(&state, &auth, &request).await?;
    file_download(
        "text/csv; charset=utf-8",
        &format!("{}.csv", base_name(&request)),
        records_to_csv(&records),
    )
}

/// The print/PDF-oriented document: one page per record.
pub async fn export_report(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<ReportRequest>,
) -> AppResult<(HeaderMap, String)> {
    let (_, _, records) = resolve_report(&state, &auth, &request).await?;
    file_download(
        "text/html; charset=utf-8",
        &format!("{}.html", base_name(&request)),
        record_report_document(&records),
    )
}

/// The rowspan-grouped table document.
pub async fn export_table(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<ReportRequest>,
) -> AppResult<(HeaderMap, String)> {
    let (_, _, records) = resolve_report(&state, &auth, &request).await?;
    let generated_at = Utc::now().format("%Y-%m-%d %H:%M").to_string();
    file_download(
        "text/html; charset=utf-8",
        &format!("{}_جدول.html", base_name(&request)),
        table_report_document(&records, &generated_at),
    )
}
