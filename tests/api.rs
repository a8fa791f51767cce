use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cert_vault::models::{CertificationDetail, CertificationListResponse, Stats, UploadResponse};
use cert_vault::{api, CertificationStore, LogNotifier, MemorySlot};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

const BOUNDARY: &str = "cert-vault-test-boundary";

fn app() -> (Router, MemorySlot) {
    let slot = MemorySlot::default();
    let store = CertificationStore::open(slot.clone(), LogNotifier);
    (api::router(store), slot)
}

fn multipart_body(files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, media_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                name, media_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(app: &Router, files: &[(&str, &str, &[u8])]) -> UploadResponse {
    let request = Request::post("/certifications")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json(response).await
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_then_list_and_filter() {
    let (app, slot) = app();

    let uploaded = upload(
        &app,
        &[
            ("diploma.png", "image/png", b"png-bytes"),
            ("license.pdf", "application/pdf", b"pdf-bytes"),
        ],
    )
    .await;
    assert_eq!(uploaded.submitted, 2);
    assert_eq!(uploaded.certifications.len(), 2);
    assert!(slot.contents().is_some());

    let all: CertificationListResponse = json(get(&app, "/certifications").await).await;
    assert_eq!(all.certifications.len(), 2);

    let images: CertificationListResponse =
        json(get(&app, "/certifications?type=image").await).await;
    assert_eq!(images.certifications.len(), 1);
    assert_eq!(images.certifications[0].name, "diploma");
    assert!(images.certifications[0].has_preview);

    let searched: CertificationListResponse =
        json(get(&app, "/certifications?search=LICENSE").await).await;
    assert_eq!(searched.certifications.len(), 1);
    assert_eq!(searched.certifications[0].name, "license");
}

#[tokio::test]
async fn rejects_unknown_type_filter() {
    let (app, _slot) = app();
    let response = get(&app, "/certifications?type=docx").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_without_file_parts_is_rejected() {
    let (app, _slot) = app();
    let request = Request::post("/certifications")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(&[])))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detail_download_rename_delete() {
    let (app, slot) = app();
    let uploaded = upload(&app, &[("scan.png", "image/png", b"hi")]).await;
    let id = uploaded.certifications[0].id.clone();

    let detail: CertificationDetail = json(get(&app, &format!("/certifications/{}", id)).await).await;
    assert_eq!(detail.file_name, "scan.png");
    assert_eq!(detail.preview.as_deref(), Some("data:image/png;base64,aGk="));

    let download = get(&app, &format!("/certifications/{}/download", id)).await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(
        download.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"scan.jpg\""
    );
    assert_eq!(download.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = body::to_bytes(download.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hi");

    let rename = Request::patch(format!("/certifications/{}", id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Scanned Diploma"}"#))
        .unwrap();
    let response = app.clone().oneshot(rename).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let detail: CertificationDetail = json(get(&app, &format!("/certifications/{}", id)).await).await;
    assert_eq!(detail.name, "Scanned Diploma");

    let delete = Request::delete(format!("/certifications/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        get(&app, &format!("/certifications/{}", id)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(slot.contents(), None);
}

#[tokio::test]
async fn blank_rename_is_rejected() {
    let (app, _slot) = app();
    let request = Request::patch("/certifications/whatever")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"   "}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_and_clear() {
    let (app, slot) = app();
    upload(
        &app,
        &[
            ("a.png", "image/png", b"1"),
            ("b.pdf", "application/pdf", b"2"),
            ("c.pdf", "application/pdf", b"3"),
        ],
    )
    .await;

    let stats: Stats = json(get(&app, "/certifications/stats").await).await;
    assert_eq!(stats.count, 3);
    assert_eq!(stats.image_count, 1);
    assert_eq!(stats.pdf_count, 2);
    assert_eq!(stats.total_size_mb, "0.00");

    let clear = Request::delete("/certifications").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(clear).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stats: Stats = json(get(&app, "/certifications/stats").await).await;
    assert_eq!(stats.count, 0);
    assert_eq!(slot.contents(), None);
}

#[tokio::test]
async fn unknown_ids_are_not_found_for_reads() {
    let (app, _slot) = app();
    assert_eq!(get(&app, "/certifications/nope").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        get(&app, "/certifications/nope/download").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn multi_line_name_still_downloads() {
    let (app, _slot) = app();
    let uploaded = upload(&app, &[("aws.pdf", "application/pdf", b"%PDF")]).await;
    let id = uploaded.certifications[0].id.clone();

    let rename = Request::patch(format!("/certifications/{}", id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"AWS\nArchitect"}"#))
        .unwrap();
    let response = app.clone().oneshot(rename).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let download = get(&app, &format!("/certifications/{}/download", id)).await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(
        download.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"AWS_Architect.pdf\""
    );
    let bytes = body::to_bytes(download.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF");
}
