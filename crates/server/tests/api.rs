use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use deck_pptx::fixture::TemplateBuilder;
use deck_pptx::{Deck, Package};
use deck_server::{build_app, AppState, FetchError, PackageFetcher, ServerConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt;

const TEMPLATE_URL: &str = "https://files.test/template.pptx";
const DECK_URL: &str = "https://files.test/deck.pptx";
const BOUNDARY: &str = "----pptx-service-test";

/// Serves fixed bytes per URL; anything else is a 404.
struct StubFetcher {
    files: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl PackageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.files.get(url).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

fn state_with_limit(max_upload_bytes: usize) -> AppState {
    let mut files = HashMap::new();
    files.insert(TEMPLATE_URL.to_string(), TemplateBuilder::default().with_slides(2).build());
    files.insert(DECK_URL.to_string(), TemplateBuilder::default().with_slides(1).build());

    let config = ServerConfig {
        max_upload_bytes,
        ..ServerConfig::default()
    };
    AppState::new(config, Arc::new(StubFetcher { files }))
}

fn state() -> AppState {
    state_with_limit(ServerConfig::default().max_upload_bytes)
}

async fn send(state: AppState, request: Request<Body>) -> Response {
    build_app(state).oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn multipart_request(uri: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, value: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = send(state(), get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pptx-service");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_root_and_trailing_slash() {
    let response = send(state(), get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = send(state(), get("/health/")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://planner.example")
        .body(Body::empty())
        .unwrap();
    let response = send(state(), request).await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let response = send(state(), get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analyze_template() {
    let template = TemplateBuilder::default()
        .with_slides(2)
        .with_slide_size(12192000, 6858000)
        .build();
    let response = send(
        state(),
        multipart_request("/template/analyze", "file", "brand.pptx", &template),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let profile = &body["styleProfile"];
    assert_eq!(profile["slideSize"]["width"], 12192000);
    assert_eq!(profile["slideSize"]["height"], 6858000);
    assert_eq!(profile["slideCount"], 2);
    assert_eq!(profile["layouts"].as_array().unwrap().len(), 3);
    assert_eq!(profile["layouts"][0]["name"], "Title Slide");
    assert_eq!(profile["layouts"][0]["placeholders"][0]["type"], "ctrTitle");
    assert_eq!(profile["themeColors"].as_array().unwrap().len(), 12);
    assert_eq!(profile["fonts"][0]["role"], "major");
}

#[tokio::test]
async fn test_analyze_with_trailing_slash() {
    let template = TemplateBuilder::default().build();
    let response = send(
        state(),
        multipart_request("/template/analyze/", "file", "brand.pptx", &template),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_analyze_missing_file_field() {
    let template = TemplateBuilder::default().build();
    let response = send(
        state(),
        multipart_request("/template/analyze", "upload", "brand.pptx", &template),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_analyze_rejects_legacy_ppt() {
    let mut ole = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    ole.extend_from_slice(&[0u8; 64]);
    let response = send(
        state(),
        multipart_request("/template/analyze", "file", "old.ppt", &ole),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_rejects_empty_upload() {
    let response = send(
        state(),
        multipart_request("/template/analyze", "file", "empty.pptx", b""),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_corrupt_package() {
    let mut corrupt = b"PK\x03\x04".to_vec();
    corrupt.extend_from_slice(&[0u8; 32]);
    let response = send(
        state(),
        multipart_request("/template/analyze", "file", "broken.pptx", &corrupt),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_analyze_not_multipart() {
    let response = send(state(), json_request("/template/analyze", json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_upload_too_large() {
    let template = TemplateBuilder::default().build();
    let response = send(
        state_with_limit(512),
        multipart_request("/template/analyze", "file", "brand.pptx", &template),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_generate_deck() {
    let request = json_request(
        "/deck/generate",
        json!({
            "templateUrl": TEMPLATE_URL,
            "deckSpec": {
                "title": "Przegląd",
                "slides": [
                    {"layoutName": "Title Slide", "title": "Kick-off"},
                    {"layoutName": "Title and Content", "title": "Agenda", "bullets": ["One", "Two"]},
                    {"layoutName": "Title Only", "chart": {"type": "pie", "data": [["A", 1], ["B", 3]]}}
                ]
            }
        }),
    );
    let response = send(state(), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(
        headers[header::CONTENT_TYPE],
        deck_core::PPTX_MIME_TYPE
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"generated.pptx\""
    );
    assert_eq!(headers["x-thumbnails"], "[]");

    let spec: Value = serde_json::from_str(headers["x-spec-json"].to_str().unwrap()).unwrap();
    assert_eq!(spec["title"], "Przegląd");
    assert_eq!(spec["slides"].as_array().unwrap().len(), 3);

    let bytes = body_bytes(response).await;
    let deck = Deck::from_bytes(&bytes).unwrap();
    assert_eq!(deck.slide_count(), 3);
    let package = Package::from_bytes(&bytes).unwrap();
    assert!(package.contains("ppt/charts/chart1.xml"));
}

#[tokio::test]
async fn test_generate_unreachable_template() {
    let request = json_request(
        "/deck/generate",
        json!({"templateUrl": "https://files.test/missing.pptx", "deckSpec": {"slides": []}}),
    );
    let response = send(state(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_generate_invalid_body() {
    let request = json_request("/deck/generate", json!({"deckSpec": {"slides": []}}));
    let response = send(state(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_patch_deck() {
    let request = json_request(
        "/deck/patch",
        json!({
            "pptxUrl": DECK_URL,
            "patchOps": {"ops": [
                {"type": "replace_text", "slideIndex": 0, "placeholder": "Title 1", "newText": "Updated"},
                {"type": "add_slide", "layout": "Title Only", "placeholders": {"Title 1": "Appendix"}}
            ]},
            "currentSpec": {"slides": []}
        }),
    );
    let response = send(state(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"patched.pptx\""
    );

    let bytes = body_bytes(response).await;
    let deck = Deck::from_bytes(&bytes).unwrap();
    let parts = deck.slide_parts();
    assert_eq!(parts.len(), 2);

    let package = Package::from_bytes(&bytes).unwrap();
    let first = String::from_utf8(package.part(&parts[0]).unwrap().to_vec()).unwrap();
    assert!(first.contains("<a:t>Updated</a:t>"));
    let second = String::from_utf8(package.part(&parts[1]).unwrap().to_vec()).unwrap();
    assert!(second.contains("<a:t>Appendix</a:t>"));
}

#[tokio::test]
async fn test_generate_echoes_deck_spec_verbatim() {
    let deck_spec = json!({
        "slides": [{"bullets": [1, "two"], "notes": "speaker", "title": "One"}]
    });
    let request = json_request(
        "/deck/generate",
        json!({"templateUrl": TEMPLATE_URL, "deckSpec": deck_spec.clone()}),
    );
    let response = send(state(), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let echoed: Value =
        serde_json::from_str(response.headers()["x-spec-json"].to_str().unwrap()).unwrap();
    assert_eq!(echoed, deck_spec);
}

#[tokio::test]
async fn test_generate_invalid_deck_spec() {
    let request = json_request(
        "/deck/generate",
        json!({"templateUrl": TEMPLATE_URL, "deckSpec": {"slides": "none"}}),
    );
    let response = send(state(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("deckSpec"));
}
