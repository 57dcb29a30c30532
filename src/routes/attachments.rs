use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::Attachment;
use crate::routes::attachment_disposition;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

impl From<&Attachment> for AttachmentSummary {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id.clone(),
            name: attachment.name.clone(),
            mime_type: attachment.mime_type.clone(),
            size: attachment.size,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentListResponse {
    pub attachments: Vec<AttachmentSummary>,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileResult {
    pub name: String,
    pub ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub files: Vec<UploadedFileResult>,
    pub uploaded: usize,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentLinkResponse {
    pub url: String,
    pub filename: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    pub ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResponse {
    pub attachments: Vec<BundleEntry>,
    pub count: usize,
    pub succeeded: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexResponse {
    pub reindexed_records: usize,
    pub total_attachments: usize,
}

fn infer_mime(name: &str, stored: &str) -> String {
    if !stored.trim().is_empty() {
        return stored.to_string();
    }
    mime_guess::from_path(name)
        .first_raw()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Decodes a stored attachment into raw bytes and a MIME type. Content is
/// either a full data URL or a bare base64 string.
fn decode_content(attachment: &Attachment) -> AppResult<(Vec<u8>, String)> {
    if let Some(rest) = attachment.content.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::bad_request("attachment content is not a valid data URL"))?;
        let mime = header.split(';').next().unwrap_or_default();
        let mime = if mime.is_empty() {
            infer_mime(&attachment.name, &attachment.mime_type)
        } else {
            mime.to_string()
        };
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|_| AppError::bad_request("attachment content is not valid base64"))?;
        Ok((bytes, mime))
    } else {
        let bytes = BASE64
            .decode(attachment.content.trim())
            .map_err(|_| AppError::bad_request("attachment content is not valid base64"))?;
        Ok((bytes, infer_mime(&attachment.name, &attachment.mime_type)))
    }
}

/// Data-URL form of a stored attachment, used by the bundle download.
fn to_data_url(attachment: &Attachment) -> Option<String> {
    if attachment.content.starts_with("data:") {
        return Some(attachment.content.clone());
    }
    if BASE64.decode(attachment.content.trim()).is_err() {
        return None;
    }
    let mime = infer_mime(&attachment.name, &attachment.mime_type);
    Some(format!("data:{mime};base64,{}", attachment.content.trim()))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<AttachmentListResponse>> {
    let attachments = state.attachments().resolve(&id).await?;
    Ok(Json(AttachmentListResponse {
        count: attachments.len(),
        attachments: attachments.iter().map(AttachmentSummary::from).collect(),
    }))
}

/// Multipart upload. Files are converted to base64 one at a time; a file
/// that fails to read is skipped and the rest of the batch continues.
pub async fn upload_attachments(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    state
        .records()
        .find(&id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let mut files = Vec::new();
    let mut accepted = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart payload: {err}")))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string).unwrap_or_default();

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                warn!(record_id = %id, file = %name, error = %err, "skipping unreadable upload");
                files.push(UploadedFileResult { name, ok: false });
                continue;
            }
        };

        if data.is_empty() {
            warn!(record_id = %id, file = %name, "skipping empty upload");
            files.push(UploadedFileResult { name, ok: false });
            continue;
        }

        accepted.push(Attachment {
            id: Uuid::new_v4().to_string(),
            name: name.clone(),
            content: BASE64.encode(&data),
            mime_type: infer_mime(&name, &content_type),
            size: data.len() as u64,
        });
        files.push(UploadedFileResult { name, ok: true });
    }

    let uploaded = accepted.len();
    let stored = state.attachments().append(&id, accepted).await?;
    info!(record_id = %id, uploaded, total = stored.len(), "attachments uploaded");

    Ok(Json(UploadResponse {
        files,
        uploaded,
        count: stored.len(),
    }))
}

/// Issues a short-lived tokenized link for a single attachment, since plain
/// anchor downloads cannot send an Authorization header.
pub async fn attachment_link(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((id, attachment_id)): Path<(String, String)>,
) -> AppResult<Json<AttachmentLinkResponse>> {
    let attachment = state
        .attachments()
        .find(&id, &attachment_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let token = state
        .jwt
        .generate_download_token(&id, &attachment.id, &auth.user_id)
        .map_err(AppError::from)?;

    Ok(Json(AttachmentLinkResponse {
        url: format!("/download/{token}"),
        filename: attachment.name,
        expires_in: state.jwt.download_expiry_seconds(),
    }))
}

pub async fn download_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let claims = state
        .jwt
        .verify_download_token(&token)
        .map_err(|_| AppError::unauthorized())?;

    let attachment = state
        .attachments()
        .find(&claims.record_id, &claims.attachment_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let (bytes, mime) = decode_content(&attachment)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&mime)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(CONTENT_DISPOSITION, attachment_disposition(&attachment.name)?);

    Ok((headers, bytes))
}

/// All attachments of a record as data URLs, so a client can save them one
/// by one at its own pace. Per-file validity is reported alongside.
pub async fn download_bundle(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BundleResponse>> {
    let attachments = state.attachments().resolve(&id).await?;

    let entries: Vec<BundleEntry> = attachments
        .iter()
        .map(|attachment| {
            let data_url = to_data_url(attachment);
            BundleEntry {
                name: attachment.name.clone(),
                ok: data_url.is_some(),
                data_url,
            }
        })
        .collect();

    let succeeded = entries.iter().filter(|entry| entry.ok).count();
    Ok(Json(BundleResponse {
        count: entries.len(),
        succeeded,
        attachments: entries,
    }))
}

/// One-time migration of legacy attachment layouts onto the canonical keys.
pub async fn reindex(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<ReindexResponse>> {
    auth.require_manager()?;

    let (reindexed_records, total_attachments) = state.attachments().reindex().await?;
    info!(reindexed_records, total_attachments, "attachment reindex finished");

    Ok(Json(ReindexResponse {
        reindexed_records,
        total_attachments,
    }))
}
