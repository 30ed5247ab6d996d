mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};

use common::{FakeIdentity, MEMBER_TOKEN, TestApp, location, test_config};

#[tokio::test]
async fn redirects_carry_security_headers_and_request_id() -> Result<()> {
    let config = test_config(&[])?;
    let app = TestApp::with_layers(FakeIdentity::default(), &config)?;

    let resp = app.get("/user-profile", None).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        Some("/sign-in?redirect_url=%2Fuser-profile")
    );

    let headers = resp.headers();
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));

    Ok(())
}

#[tokio::test]
async fn incoming_request_id_is_echoed() -> Result<()> {
    let config = test_config(&[])?;
    let app = TestApp::with_layers(FakeIdentity::default(), &config)?;

    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())?;
    let resp = app.send(req).await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-request-id"], "req-123");

    Ok(())
}

#[tokio::test]
async fn production_cors_only_answers_the_allowlist() -> Result<()> {
    let config = test_config(&[
        ("APP_ENV", "production"),
        ("SESSION_JWT_PUBLIC_KEY_PEM", "unused-by-this-test"),
        ("CORS_ALLOWED_ORIGINS", "https://app.example"),
    ])?;
    let app = TestApp::with_layers(FakeIdentity::default(), &config)?;

    let preflight = |origin: &'static str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/user-profile")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
    };

    let resp = app.send(preflight("https://app.example")?).await?;
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example"
    );
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let resp = app.send(preflight("https://evil.example")?).await?;
    assert!(
        !resp
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );

    Ok(())
}

#[tokio::test]
async fn signed_in_requests_pass_through_every_layer() -> Result<()> {
    let config = test_config(&[])?;
    let app = TestApp::with_layers(FakeIdentity::default(), &config)?;

    let resp = app.get("/user-profile", Some(MEMBER_TOKEN)).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}
