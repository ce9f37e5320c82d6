mod common;

use common::{body, TestApp};
use reqwest::{multipart, StatusCode};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

async fn upload(app: &TestApp, bytes: Vec<u8>, mime: &str) -> reqwest::Response {
    let part = multipart::Part::bytes(bytes)
        .file_name("picture")
        .mime_str(mime)
        .unwrap();
    app.client
        .post(app.url("/admin/upload"))
        .bearer_auth(&app.token)
        .multipart(multipart::Form::new().part("file", part))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn test_upload_and_serve_image() {
    let app = TestApp::spawn().await;

    let response = upload(&app, PNG.to_vec(), "image/png").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let path = body(response).await["path"].as_str().unwrap().to_owned();
    assert!(path.starts_with("/media/") && path.ends_with(".png"));

    let response = app.get(&path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.bytes().await.unwrap().as_ref(), PNG);
}

#[tokio::test]
async fn test_upload_rejects_other_content() {
    let app = TestApp::spawn().await;

    let response = upload(&app, b"plain".to_vec(), "text/plain").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_big = vec![0u8; app.config.file_size_limit + 1];
    let response = upload(&app, too_big, "image/png").await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_media_names_are_checked() {
    let app = TestApp::spawn().await;

    let response = app.get("/media/missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/media/..%2Fstore.db").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
