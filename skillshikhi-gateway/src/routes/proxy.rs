use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use skillshikhi_shared::{ApiErrorResponse, UserRole};
use std::sync::Arc;

use super::auth::extract_auth_user;
use super::heartbeat;
use super::rate_limit::check_rate_limit;
use crate::AppState;

/// Paths that do not require JWT authentication.
const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/register",
    "/api/auth/login",
    "/api/auth/refresh",
    "/api/auth/forgot-password",
    "/api/auth/reset-password",
    "/api/auth/validate-reset-token",
    "/api/admin/login",
];

/// Headers that must not be forwarded (hop-by-hop).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Determines whether a given path is public (no JWT required).
fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

fn is_admin_path(path: &str) -> bool {
    path.starts_with("/api/admin/") || path == "/api/admin"
}

/// Strip the gateway prefix from the path to produce the upstream path.
///
/// Mapping:
/// - /api/auth/...          -> /...               (strip "/api/auth")
/// - /api/users/...         -> /users/...         (strip "/api")
/// - /api/friends/...       -> /friends/...       (strip "/api")
/// - /api/sessions/...      -> /sessions/...      (strip "/api")
/// - /api/messages/...      -> /messages/...      (strip "/api")
/// - /api/notifications/... -> /notifications/... (strip "/api")
/// - /api/reports/...       -> /reports/...       (strip "/api")
/// - /api/admin/...         -> /admin/...         (strip "/api")
fn strip_prefix(path: &str) -> &str {
    // Auth service mounts its routes at the root
    if path.starts_with("/api/auth") && !path.starts_with("/api/auth/") {
        return "/";
    }
    if let Some(rest) = path.strip_prefix("/api/auth") {
        return rest;
    }

    // All other services keep their section segment
    if let Some(rest) = path.strip_prefix("/api") {
        if rest.is_empty() {
            return "/";
        }
        return rest;
    }

    // Fallback: forward as-is
    path
}

/// The catch-all proxy handler.
///
/// 1. Extract path from OriginalUri
/// 2. Resolve upstream service (404 if unknown prefix)
/// 3. For non-public paths: validate the JWT (adminToken cookie fallback on
///    /api/admin/*), gate admin paths on the role claim, check rate limits,
///    and dispatch the fire-and-forget session heartbeat
/// 4. Strip the gateway prefix to build the upstream path
/// 5. Forward the request (method, headers, body, query string)
/// 6. Return the upstream response
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    OriginalUri(original_uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let path = original_uri.path();
    let query = original_uri.query();

    // 1. Resolve upstream
    let upstream_base = match state.config.resolve_upstream(path) {
        Some(url) => url.to_string(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse::new("E0003", "no upstream service for this path")),
            )
                .into_response();
        }
    };

    // 2. Auth + rate limit for non-public paths
    let mut cookie_token_header: Option<String> = None;
    if !is_public(path) {
        let admin_path = is_admin_path(path);

        let auth_info = match extract_auth_user(&headers, &state.config.jwt_secret, admin_path) {
            Ok(info) => info,
            Err(resp) => return resp,
        };

        // Role claim gate for admin routes; services re-check the stored
        // role on top of this.
        if admin_path && auth_info.role != UserRole::Admin {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiErrorResponse::new("E0005", "admin access required")),
            )
                .into_response();
        }

        if auth_info.from_cookie {
            if let Some(cookies) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
                if let Some(token) = cookies.split(';').find_map(|pair| {
                    pair.trim().strip_prefix("adminToken=").map(|t| t.to_string())
                }) {
                    cookie_token_header = Some(format!("Bearer {token}"));
                }
            }
        }

        if let Err(status) = check_rate_limit(
            &state.redis,
            auth_info.user_id,
            auth_info.role,
            &state.config,
        )
        .await
        {
            return (
                status,
                Json(ApiErrorResponse::new("E0006", "rate limit exceeded")),
            )
                .into_response();
        }

        // Best-effort session heartbeat; never blocks or fails this request.
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());
        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        heartbeat::dispatch(
            state.http_client.clone(),
            &state.config.auth_url,
            auth_info.user_id,
            auth_info.token_id,
            ip_address,
            user_agent,
        );
    }

    // 3. Build upstream URL
    let upstream_path = strip_prefix(path);
    let upstream_url = match query {
        Some(q) => format!("{upstream_base}{upstream_path}?{q}"),
        None => format!("{upstream_base}{upstream_path}"),
    };

    // 4. Read body (max 10 MB)
    let body_bytes = match axum::body::to_bytes(body, 10 * 1024 * 1024).await {
        Ok(b) => b,
        Err(_) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ApiErrorResponse::new("E0008", "request body too large (max 10MB)")),
            )
                .into_response();
        }
    };

    // 5. Build upstream request
    let mut upstream_req = state
        .http_client
        .request(
            reqwest::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET),
            &upstream_url,
        )
        .body(body_bytes.to_vec());

    // Forward headers, skipping hop-by-hop
    for (name, value) in headers.iter() {
        let name_lower = name.as_str().to_lowercase();
        if HOP_BY_HOP_HEADERS.contains(&name_lower.as_str()) {
            continue;
        }
        if let Ok(val) = value.to_str() {
            upstream_req = upstream_req.header(name.as_str(), val);
        }
    }

    // A cookie-authenticated admin request is forwarded as a bearer request
    // so upstream extractors see a normal Authorization header.
    if let Some(bearer) = cookie_token_header {
        upstream_req = upstream_req.header("Authorization", bearer);
    }

    // 6. Send and return upstream response
    let upstream_resp = match upstream_req.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, upstream = %upstream_url, "upstream request failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiErrorResponse::new("E0007", format!("upstream unavailable: {e}"))),
            )
                .into_response();
        }
    };

    let status = StatusCode::from_u16(upstream_resp.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response_headers = HeaderMap::new();
    for (name, value) in upstream_resp.headers().iter() {
        let name_lower = name.as_str().to_lowercase();
        if HOP_BY_HOP_HEADERS.contains(&name_lower.as_str()) {
            continue;
        }
        if let (Ok(hn), Ok(hv)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            response_headers.insert(hn, hv);
        }
    }

    let resp_body = match upstream_resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to read upstream response body");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiErrorResponse::new("E0007", "failed to read upstream response")),
            )
                .into_response();
        }
    };

    (status, response_headers, resp_body).into_response()
}

#[cfg(test)]
mod tests {
    use super::{is_admin_path, is_public, strip_prefix};

    #[test]
    fn public_paths() {
        assert!(is_public("/api/auth/login"));
        assert!(is_public("/api/auth/validate-reset-token?email=a@b.c&code=123456"));
        assert!(is_public("/api/admin/login"));
        assert!(!is_public("/api/sessions"));
        assert!(!is_public("/api/admin/reports"));
    }

    #[test]
    fn admin_paths() {
        assert!(is_admin_path("/api/admin/users"));
        assert!(is_admin_path("/api/admin"));
        assert!(!is_admin_path("/api/auth/login"));
    }

    #[test]
    fn auth_prefix_is_stripped_fully() {
        assert_eq!(strip_prefix("/api/auth/login"), "/login");
        assert_eq!(strip_prefix("/api/auth"), "/");
    }

    #[test]
    fn section_segment_is_kept_for_other_services() {
        assert_eq!(strip_prefix("/api/friends/status/abc"), "/friends/status/abc");
        assert_eq!(strip_prefix("/api/sessions"), "/sessions");
        assert_eq!(strip_prefix("/api/admin/reports/bulk/resolve"), "/admin/reports/bulk/resolve");
        assert_eq!(strip_prefix("/api/notifications/unread-count"), "/notifications/unread-count");
    }
}
