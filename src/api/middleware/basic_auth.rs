use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;

/// HTTP Basic authentication for destructive routes. Requests pass straight
/// through when no credentials are configured.
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let (Some(username), Some(password)) = (
        state.config.basic_auth_username.as_deref(),
        state.config.basic_auth_password.as_deref(),
    ) else {
        return next.run(req).await;
    };

    let supplied = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_basic_credentials);

    match supplied {
        Some((user, pass)) if credentials_match(&user, &pass, username, password) => {
            next.run(req).await
        }
        _ => {
            tracing::warn!("Rejected unauthenticated {} {}", req.method(), req.uri());
            (
                [(header::WWW_AUTHENTICATE, "Basic realm=\"storytelling\"")],
                AppError::Unauthorized("Authentication required.".to_string()),
            )
                .into_response()
        }
    }
}

/// Compares both parts without short-circuiting, in time independent of
/// where the supplied bytes first differ.
fn credentials_match(user: &str, pass: &str, username: &str, password: &str) -> bool {
    let user_ok = user.as_bytes().ct_eq(username.as_bytes());
    let pass_ok = pass.as_bytes().ct_eq(password.as_bytes());
    (user_ok & pass_ok).into()
}

fn parse_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
