mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};

use common::{
    ADMIN_TOKEN, FakeIdentity, MEMBER_TOKEN, MODERATOR_TOKEN, TestApp, json_body, location,
};
use role_gate::services::identity::Role;

fn app() -> Result<TestApp> {
    TestApp::new(FakeIdentity::with_users(&[("user_1", Role::None)]))
}

#[tokio::test]
async fn public_routes_are_open_to_anonymous_visitors() -> Result<()> {
    let app = app()?;

    let resp = app.get("/", None).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["signed_in"], false);
    assert!(body["role"].is_null());

    let resp = app.get("/health", None).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn public_home_still_sees_the_session() -> Result<()> {
    let app = app()?;

    let body = json_body(app.get("/", Some(MODERATOR_TOKEN)).await?).await?;
    assert_eq!(body["signed_in"], true);
    assert_eq!(body["role"], "moderator");

    Ok(())
}

#[tokio::test]
async fn protected_route_without_session_redirects_to_sign_in() -> Result<()> {
    let app = app()?;

    let resp = app.get("/user-profile", None).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        Some("/sign-in?redirect_url=%2Fuser-profile")
    );

    Ok(())
}

#[tokio::test]
async fn sign_in_redirect_keeps_the_query_string() -> Result<()> {
    let app = app()?;

    let resp = app.get("/settings?tab=security", None).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        Some("/sign-in?redirect_url=%2Fsettings%3Ftab%3Dsecurity")
    );

    Ok(())
}

#[tokio::test]
async fn protected_route_with_session_is_allowed() -> Result<()> {
    let app = app()?;

    let resp = app.get("/user-profile", Some(MEMBER_TOKEN)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["id"], "user_member");
    assert_eq!(body["session_id"], format!("sess_{MEMBER_TOKEN}"));
    assert!(body["role"].is_null());

    Ok(())
}

#[tokio::test]
async fn unmatched_paths_are_protected_too() -> Result<()> {
    let app = app()?;

    let resp = app.get("/settings", None).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/sign-in?redirect_url=%2Fsettings"));

    // Signed in: the filter lets it through and the router answers 404.
    let resp = app.get("/settings", Some(MEMBER_TOKEN)).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn admin_routes_send_non_admins_home() -> Result<()> {
    let app = app()?;

    for token in [None, Some(MEMBER_TOKEN), Some(MODERATOR_TOKEN)] {
        for path in ["/admin", "/admin/dashboard", "/admin/roles/set"] {
            let resp = app.get(path, token).await?;
            assert_eq!(
                resp.status(),
                StatusCode::TEMPORARY_REDIRECT,
                "{path} with {token:?}"
            );
            assert_eq!(location(&resp), Some("/"), "{path} with {token:?}");
        }
    }

    Ok(())
}

#[tokio::test]
async fn admin_routes_allow_admins() -> Result<()> {
    let app = app()?;

    let resp = app.get("/admin", Some(ADMIN_TOKEN)).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // No handler behind it, but the filter allowed the request.
    let resp = app.get("/admin/dashboard", Some(ADMIN_TOKEN)).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn route_matching_ignores_case() -> Result<()> {
    let app = app()?;

    let resp = app.get("/ADMIN/Dashboard", Some(MEMBER_TOKEN)).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/"));

    Ok(())
}

#[tokio::test]
async fn invalid_token_counts_as_signed_out() -> Result<()> {
    let app = app()?;

    let resp = app.get("/user-profile", Some("forged-token")).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        Some("/sign-in?redirect_url=%2Fuser-profile")
    );

    let resp = app.get("/admin", Some("forged-token")).await?;
    assert_eq!(location(&resp), Some("/"));

    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted() -> Result<()> {
    let app = app()?;

    let req = Request::builder()
        .method("GET")
        .uri("/user-profile")
        .header(header::COOKIE, format!("theme=dark; __session={ADMIN_TOKEN}"))
        .body(Body::empty())?;
    let resp = app.send(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["role"], "admin");

    Ok(())
}

#[tokio::test]
async fn denied_requests_never_reach_the_provider_api() -> Result<()> {
    let app = app()?;

    app.get("/admin", Some(MEMBER_TOKEN)).await?;
    app.post_form("/admin/roles/set", Some(MEMBER_TOKEN), "id=user_1&role=admin")
        .await?;

    assert_eq!(app.identity.list_count(), 0);
    assert_eq!(app.identity.update_count(), 0);
    assert_eq!(app.identity.role_of("user_1"), Some(Role::None));

    Ok(())
}

#[tokio::test]
async fn denied_posts_are_redirected_with_see_other() -> Result<()> {
    let app = app()?;

    let resp = app
        .post_form("/admin/roles/set", Some(MEMBER_TOKEN), "id=user_1&role=admin")
        .await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let resp = app.post_form("/settings", None, "a=1").await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/sign-in?redirect_url=%2Fsettings"));

    Ok(())
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() -> Result<()> {
    let app = app()?;

    let req = Request::builder()
        .method("GET")
        .uri("/user-profile")
        .header(header::AUTHORIZATION, format!("bearer {MEMBER_TOKEN}"))
        .body(Body::empty())?;
    let resp = app.send(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}
