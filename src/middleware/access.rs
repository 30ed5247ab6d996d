//! Access Decision Filter.
//!
//! Runs before every handler (and before the 404 fallback):
//! session token → verified claims (or none) → route decision → redirect or pass.
//!
//! - Token source: `Authorization: Bearer <token>`, else the session cookie.
//! - Verification failure is "not signed in" (fail closed), never an error response.
//! - On `Allow` the request is forwarded unchanged apart from a `SessionCtx` extension.
//! - Denials redirect with 307 for GET/HEAD and 303 otherwise.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Method, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};

use crate::api::extractors::SessionCtx;
use crate::services::access::{AccessDecision, HOME_PATH};
use crate::services::identity::SessionClaims;
use crate::state::AppState;

/// Apply the access filter to every route of `router` (including its fallback).
///
/// 例：
/// ```ignore
/// let router = middleware::access::apply(api::routes(), state.clone());
/// let app = router.with_state(state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let claims = verified_claims(&state, req.headers());
    let method = req.method().clone();

    let path = original_uri.path();
    let return_to = original_uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(path);

    match state.access.evaluate(path, return_to, claims.as_ref()) {
        AccessDecision::Allow => {
            req.extensions_mut().insert(SessionCtx::new(claims));
            next.run(req).await
        }
        AccessDecision::RedirectToHome => {
            tracing::debug!(path, signed_in = claims.is_some(), "admin route denied");
            redirect(&method, HOME_PATH)
        }
        AccessDecision::RedirectToSignIn { return_to } => {
            tracing::debug!(path, "sign-in required");
            redirect(&method, &state.access.sign_in_location(&return_to))
        }
    }
}

/// 307 keeps GET/HEAD as they are; anything else becomes a GET of the target (303).
fn redirect(method: &Method, location: &str) -> Response {
    if *method == Method::GET || *method == Method::HEAD {
        Redirect::temporary(location).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

fn verified_claims(state: &AppState, headers: &HeaderMap) -> Option<SessionClaims> {
    let token = session_token(headers, &state.session_cookie_name)?;

    match state.identity.verify_claims(token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            tracing::warn!(
                error = %err,
                provider = state.identity.provider_name(),
                "session token verification failed"
            );
            None
        }
    }
}

/// Bearer token first, then the named cookie. Empty values count as absent.
/// The auth scheme is matched case-insensitively.
fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn prefers_bearer_token() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer abc"),
            (header::COOKIE, "__session=def"),
        ]);
        assert_eq!(session_token(&h, "__session"), Some("abc"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc", "BEARER abc", "Bearer  abc "] {
            let h = HeaderMap::from_iter([(header::AUTHORIZATION, HeaderValue::from_static(value))]);
            assert_eq!(session_token(&h, "__session"), Some("abc"), "{value}");
        }
    }

    #[test]
    fn redirect_status_depends_on_method() {
        let resp = redirect(&Method::GET, "/");
        assert_eq!(resp.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
        let resp = redirect(&Method::HEAD, "/");
        assert_eq!(resp.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
        let resp = redirect(&Method::POST, "/");
        assert_eq!(resp.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }

    #[test]
    fn falls_back_to_cookie() {
        let h = headers(&[(header::COOKIE, "theme=dark; __session=def; other=1")]);
        assert_eq!(session_token(&h, "__session"), Some("def"));
    }

    #[test]
    fn reads_cookie_from_any_cookie_header() {
        let h = headers(&[
            (header::COOKIE, "theme=dark"),
            (header::COOKIE, "__session=xyz"),
        ]);
        assert_eq!(session_token(&h, "__session"), Some("xyz"));
    }

    #[test]
    fn ignores_other_schemes_and_empty_values() {
        let h = headers(&[
            (header::AUTHORIZATION, "Basic dXNlcjpwdw=="),
            (header::COOKIE, "__session="),
        ]);
        assert_eq!(session_token(&h, "__session"), None);

        let h = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert_eq!(session_token(&h, "__session"), None);
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let h = headers(&[(header::COOKIE, "__session_abc=1; x__session=2")]);
        assert_eq!(session_token(&h, "__session"), None);
    }
}
