use super::state::ServerState;
use crate::captures::Principal;
use crate::user::auth::AuthTokenValue;
use crate::user::{Permission, UserManager};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use anyhow::Result;
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use tracing::debug;

#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
    pub token: String,
    pub permissions: Vec<Permission>,
}

impl Session {
    pub fn principal(session: Option<&Session>) -> Principal {
        match session {
            Some(session) => Principal::authenticated(session.user_id, &session.permissions),
            None => Principal::anonymous(),
        }
    }
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// The cookie wins over the header when a request carries both.
fn session_token(parts: &Parts) -> Option<AuthTokenValue> {
    let from_cookie = CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(|cookie| cookie.value().to_string());
    from_cookie
        .or_else(|| {
            parts
                .headers
                .get(HEADER_SESSION_TOKEN_KEY)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        })
        .map(AuthTokenValue)
}

/// Resolves the token to a live session. Permissions are read on every
/// request so role changes apply to sessions already open.
fn resolve_session(token: AuthTokenValue, user_manager: &UserManager) -> Result<Option<Session>> {
    let auth_token = match user_manager.get_auth_token(&token)? {
        Some(auth_token) => auth_token,
        None => return Ok(None),
    };
    if let Err(err) = user_manager.update_auth_token_last_used(&token) {
        debug!("Could not touch token of user {}: {}", auth_token.user_id, err);
    }
    let permissions = user_manager.get_user_permissions(auth_token.user_id)?;
    Ok(Some(Session {
        user_id: auth_token.user_id,
        token: auth_token.value.0,
        permissions,
    }))
}

fn extract_session_from_request_parts(parts: &Parts, ctx: &ServerState) -> Option<Session> {
    let token = session_token(parts)?;
    match resolve_session(token, &ctx.user_manager) {
        Ok(Some(session)) => {
            debug!(
                "Session of user {} with {:?}",
                session.user_id, session.permissions
            );
            Some(session)
        }
        Ok(None) => {
            debug!("Unknown session token");
            None
        }
        Err(err) => {
            debug!("Session lookup failed: {:#}", err);
            None
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).ok_or(SessionExtractionError::AccessDenied)
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
