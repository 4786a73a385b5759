use super::error::{ApiError, MSG_SIGN_IN_REQUIRED};
use super::state::ServerState;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use tracing::{debug, warn};

/// A signed-in caller, resolved from a stored session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn resolve_token(token: &str, ctx: &ServerState) -> Option<Session> {
    match ctx.user_manager.resolve_session(token) {
        Ok(Some(session)) => {
            debug!("Resolved session for user_id={}", session.user_id);
            Some(Session {
                user_id: session.user_id,
                token: session.value,
            })
        }
        Ok(None) => {
            debug!("Session token not found in store");
            None
        }
        Err(e) => {
            warn!("Failed to look up session: {}", e);
            None
        }
    }
}

/// The cookie is tried first, then the Authorization header. A token that
/// does not resolve falls through to the next one.
fn extract_session_from_request_parts(parts: &Parts, ctx: &ServerState) -> Option<Session> {
    let cookie_token = extract_session_token_from_cookies(parts);
    let header_token = extract_session_token_from_headers(parts);
    if cookie_token.is_none() && header_token.is_none() {
        debug!("No session token in cookies nor headers.");
        return None;
    }

    cookie_token
        .iter()
        .chain(header_token.iter().filter(|t| Some(*t) != cookie_token.as_ref()))
        .find_map(|token| resolve_token(token, ctx))
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .ok_or(ApiError::Unauthorized(MSG_SIGN_IN_REQUIRED))
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx))
    }
}
