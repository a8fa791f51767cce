use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::models::{
    CertificationDetail, CertificationListResponse, CertificationSummary, FileBlob, InfoResponse,
    ListQuery, RenameRequest, Stats, TypeFilter, UploadResponse,
};
use crate::store::CertificationStore;

/// Shown to users only; uploads are not checked against it.
pub const ADVERTISED_MAX_UPLOAD_MB: u64 = 10;
pub const SUPPORTED_FORMATS: [&str; 3] = ["JPG", "PNG", "PDF"];

const UPLOAD_FIELD: &str = "file";

type ApiError = (StatusCode, String);

struct AppState {
    store: CertificationStore,
}

pub fn router(store: CertificationStore) -> Router {
    let app_state = Arc::new(AppState { store });

    Router::new()
        .route(
            "/certifications",
            get(list_certifications)
                .post(upload_certifications)
                .delete(clear_certifications),
        )
        .route("/certifications/stats", get(get_stats))
        .route(
            "/certifications/:id",
            get(get_certification)
                .patch(rename_certification)
                .delete(delete_certification),
        )
        .route("/certifications/:id/download", get(download_certification))
        .route("/info", get(get_info))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn upload_certifications(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("certification").to_string();
        let media_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read uploaded file {}: {}", file_name, e),
            )
        })?;

        files.push(FileBlob::new(file_name, media_type, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("No files uploaded. Send one or more '{}' parts", UPLOAD_FIELD),
        ));
    }

    let batch = state.store.add(files).await;
    let submitted = batch.submitted();
    let certifications = batch
        .settled()
        .await
        .iter()
        .map(CertificationSummary::from)
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            submitted,
            certifications,
        }),
    ))
}

async fn list_certifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CertificationListResponse>, ApiError> {
    let filter = match query.kind.as_deref() {
        Some(kind) => kind
            .parse::<TypeFilter>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => TypeFilter::All,
    };
    let search = query.search.unwrap_or_default();

    let certifications = state
        .store
        .query(&search, filter)
        .await
        .iter()
        .map(CertificationSummary::from)
        .collect();

    Ok(Json(CertificationListResponse { certifications }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<Stats> {
    Json(state.store.stats().await)
}

async fn get_certification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CertificationDetail>, ApiError> {
    state
        .store
        .get(&id)
        .await
        .map(|cert| Json(CertificationDetail::from(&cert)))
        .ok_or_else(|| not_found(&id))
}

async fn download_certification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.store.download(&id).await.ok_or_else(|| not_found(&id))?;

    let disposition = attachment_disposition(&download.file_name);
    let disposition = HeaderValue::from_bytes(disposition.as_bytes()).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Cannot build download header: {}", e),
        )
    })?;
    let content_type = HeaderValue::from_str(&download.media_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

async fn rename_certification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Name cannot be empty".to_string(),
        ));
    }

    state.store.rename(&id, name).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_certification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    state.store.remove(&id).await;
    StatusCode::NO_CONTENT
}

async fn clear_certifications(State(state): State<Arc<AppState>>) -> StatusCode {
    state.store.clear().await;
    StatusCode::NO_CONTENT
}

async fn get_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        supported_formats: SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect(),
        max_upload_mb: ADVERTISED_MAX_UPLOAD_MB,
    })
}

/// Names may hold anything a rename or an upload put there; control
/// characters are not allowed in header values.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' => '\'',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        format!("Certification {} not found", id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_replaces_quotes_and_control_characters() {
        assert_eq!(
            attachment_disposition("AWS\nArchitect\t\"v2\".pdf"),
            "attachment; filename=\"AWS_Architect_'v2'.pdf\""
        );
        assert_eq!(
            attachment_disposition("Zertifikat für Ärzte.jpg"),
            "attachment; filename=\"Zertifikat für Ärzte.jpg\""
        );
        assert!(HeaderValue::from_bytes(attachment_disposition("a\r\n\u{7f}.pdf").as_bytes()).is_ok());
    }
}
