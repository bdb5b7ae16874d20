use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use skillshikhi_shared::{ApiErrorResponse, UserRole};
use uuid::Uuid;

/// Authenticated user information extracted from the JWT.
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub user_id: Uuid,
    pub role: UserRole,
    pub token_id: Uuid,
    /// True when the token came from the `adminToken` cookie rather than the
    /// Authorization header; the proxy re-injects it as a bearer header so
    /// upstream extractors see a normal request.
    pub from_cookie: bool,
}

fn unauthorized(message: impl Into<String>) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorResponse::new("E0004", message)),
    )
        .into_response()
}

/// Pull the raw token out of the request: the Authorization bearer header, or
/// on admin page routes the persisted `adminToken` cookie.
fn extract_raw_token(headers: &HeaderMap, allow_admin_cookie: bool) -> Result<(String, bool), Response> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|v| v.to_str().ok()) {
        if !auth_header.starts_with("Bearer ") {
            return Err(unauthorized("authorization header must use Bearer scheme"));
        }
        return Ok((auth_header[7..].to_string(), false));
    }

    if allow_admin_cookie {
        if let Some(token) = admin_cookie_token(headers) {
            return Ok((token, true));
        }
    }

    Err(unauthorized("missing authorization header"))
}

fn admin_cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == "adminToken" && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Extract and validate the JWT from request headers (or the adminToken
/// cookie when `allow_admin_cookie` is set).
pub fn extract_auth_user(
    headers: &HeaderMap,
    jwt_secret: &str,
    allow_admin_cookie: bool,
) -> Result<AuthInfo, Response> {
    let (token, from_cookie) = extract_raw_token(headers, allow_admin_cookie)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<skillshikhi_shared::Claims>(
        &token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => unauthorized("token has expired"),
        _ => unauthorized(format!("invalid token: {e}")),
    })?;

    Ok(AuthInfo {
        user_id: token_data.claims.sub,
        role: token_data.claims.role,
        token_id: token_data.claims.jti,
        from_cookie,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn admin_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; adminToken=abc.def.ghi; lang=en"),
        );
        assert_eq!(admin_cookie_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_empty_admin_cookie_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark"));
        assert_eq!(admin_cookie_token(&headers), None);

        headers.insert("cookie", HeaderValue::from_static("adminToken="));
        assert_eq!(admin_cookie_token(&headers), None);
    }
}
