use axum::extract::State;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{InspectionRecord, NewInspectionRecord};
use crate::routes::attachment_disposition;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub total_records: usize,
    pub exported_by: String,
    pub exported_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub timestamp: String,
    pub version: String,
    pub records: Vec<InspectionRecord>,
    pub metadata: BackupMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub restored: usize,
    pub skipped: usize,
}

pub async fn create_backup(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(HeaderMap, Json<BackupDocument>)> {
    auth.require_manager()?;

    let records = state.records().list().await?;
    let now = Utc::now();
    let document = BackupDocument {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        version: "1.0".to_string(),
        metadata: BackupMetadata {
            total_records: records.len(),
            exported_by: auth.name.clone(),
            exported_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
        records,
    };

    let filename = format!("backup_inspection_records_{}.json", now.format("%Y-%m-%d"));
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_DISPOSITION, attachment_disposition(&filename)?);

    Ok((headers, Json(document)))
}

/// Restores records from a backup document. Each entry is re-added through
/// the normal create path (fresh id/serial/createdAt); entries that do not
/// parse as records are skipped, the rest of the batch continues.
pub async fn restore_backup(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(document): Json<Value>,
) -> AppResult<Json<RestoreResponse>> {
    auth.require_manager()?;

    let Some(entries) = document.get("records").and_then(Value::as_array) else {
        return Err(AppError::bad_request(
            "backup document is missing a records list",
        ));
    };

    let records = state.records();
    let attachments = state.attachments();
    let mut restored = 0;
    let mut skipped = 0;

    for entry in entries {
        let parsed: InspectionRecord = match serde_json::from_value(entry.clone()) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "skipping unreadable backup entry");
                skipped += 1;
                continue;
            }
        };

        let created_by = if parsed.created_by.is_empty() {
            auth.name.clone()
        } else {
            parsed.created_by.clone()
        };

        let new_record = NewInspectionRecord {
            basic_data: parsed.basic_data,
            inspection_results: parsed.inspection_results,
            recommendations: parsed.recommendations,
        };

        let created = records.create(new_record, &created_by).await?;
        attachments.resolve(&created.id).await?;
        restored += 1;
    }

    info!(restored, skipped, "backup restore finished");
    Ok(Json(RestoreResponse { restored, skipped }))
}
