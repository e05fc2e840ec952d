mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

use common::{FormPart, json_body, multipart_request, test_app};

// Each test call uses its own client so the generate window never applies.

#[tokio::test]
async fn empty_prompt_is_rejected() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/generate/prompt",
            Some("192.0.2.60"),
            &[FormPart::Text("method", "prompt"), FormPart::Text("prompt", "  ")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], 400);
    assert_eq!(body["error_message"], "Empty prompt");
}

#[tokio::test]
async fn image_method_needs_an_uploaded_image() {
    let app = test_app();

    let missing = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/generate/image",
            Some("192.0.2.61"),
            &[FormPart::Text("prompt", "what's in my fridge")],
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body = json_body(missing).await;
    assert_eq!(body["error_message"], "Image is required");

    let empty = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/generate/image",
            Some("192.0.2.62"),
            &[
                FormPart::Text("prompt", "what's in my fridge"),
                FormPart::File {
                    name: "image",
                    content_type: "image/png",
                    bytes: b"",
                },
            ],
        ))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn url_method_needs_a_url() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/generate/url",
            Some("192.0.2.63"),
            &[FormPart::Text("method", "url"), FormPart::Text("prompt", "dinner")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_message"], "URL is required");
}

#[tokio::test]
async fn unreadable_page_is_a_bad_gateway() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/generate/url",
            Some("192.0.2.64"),
            &[
                FormPart::Text("prompt", "dinner"),
                FormPart::Text("url", "https://unreachable.example.com/pasta"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["code"], 502);
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/v1/generate/recipe",
            Some("192.0.2.65"),
            &[FormPart::Text("prompt", "dinner")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_message"], "Invalid method");
}
