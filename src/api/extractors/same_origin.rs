/*
 * Responsibility
 * - 状態を変える POST (role 変更) が同一 origin から来たことを確認する extractor
 * - session は cookie でも運ばれるので、cross-site の form post をここで弾く
 * 判定
 *  - `Sec-Fetch-Site: cross-site` は拒否
 *  - `Origin` がある場合は `X-Forwarded-Host` (なければ `Host`) と host/port が一致すること
 *  - `Origin` がない場合 (browser 以外の client) は通す
 * 失敗時は 403 (AppError::Forbidden)
 */
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use url::Url;

use crate::error::AppError;
use crate::state::AppState;

const SEC_FETCH_SITE: &str = "sec-fetch-site";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Marker extractor: present in a handler's arguments means "same-origin only".
#[derive(Debug, Clone, Copy)]
pub struct SameOrigin;

impl FromRequestParts<AppState> for SameOrigin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check(&parts.headers).map(|_| SameOrigin).map_err(|reason| {
            tracing::warn!(
                path = parts.uri.path(),
                origin = ?parts.headers.get(header::ORIGIN),
                reason,
                "cross-origin mutation rejected"
            );
            AppError::Forbidden
        })
    }
}

pub(crate) fn check(headers: &HeaderMap) -> Result<(), &'static str> {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header_str(SEC_FETCH_SITE).is_some_and(|site| site.eq_ignore_ascii_case("cross-site")) {
        return Err("cross-site request");
    }

    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(());
    };
    // "null" and other opaque origins fail to parse as URLs.
    let origin = origin
        .to_str()
        .ok()
        .and_then(|o| Url::parse(o).ok())
        .ok_or("opaque origin")?;
    let origin_host = origin.host_str().ok_or("opaque origin")?;

    let expected = header_str(X_FORWARDED_HOST)
        .or_else(|| header_str(header::HOST.as_str()))
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or("missing host")?;
    let (host, port) = split_host_port(expected);
    let port = match port {
        Some(p) => Some(p.parse::<u16>().map_err(|_| "invalid host")?),
        None => origin.port_or_known_default(),
    };

    if origin_host.eq_ignore_ascii_case(host) && origin.port_or_known_default() == port {
        Ok(())
    } else {
        Err("origin does not match host")
    }
}

// `example.com:3000` / `[::1]:3000` / `example.com`
fn split_host_port(authority: &str) -> (&str, Option<&str>) {
    match authority.rsplit_once(':') {
        Some((host, port)) if !port.ends_with(']') && !host.is_empty() => (host, Some(port)),
        _ => (authority, None),
    }
}
