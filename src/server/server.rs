use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info};

use crate::capture_store::{CaptureForm, CaptureStore};
use crate::captures::{
    views::{self, ViewResult},
    ListingParams, Notices, Page, Route, ViewError, ViewOutcome,
};
use crate::user::auth::AuthTokenValue;
use crate::user::UserManager;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::flash::{clear_flash, pending_notices, store_flash};
use super::metrics::{
    metrics_handler, record_capture_mutation, record_login_attempt, set_catalog_metrics,
};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};

const HOME_TEMPLATE: &str = "home/index.html";
const LOGIN_TEMPLATE: &str = "account/login.html";

/// JSON stand-in for a rendered template.
#[derive(Serialize)]
struct RenderedPage<'a> {
    template: &'a str,
    context: Value,
    messages: &'a Notices,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Deserialize, Debug, Default)]
struct LoginPageParams {
    next: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        match self {
            ViewError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ViewError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ViewError::Store(err) => {
                error!("Capture store failure: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Pages show every pending notice and consume the flash cookie; redirects
/// push the notices into it for the next page. Errors leave the cookie alone.
fn respond(jar: CookieJar, notices: Notices, result: ViewResult) -> Response {
    match result {
        Ok(ViewOutcome::Render(Page { template, context })) => {
            let page = RenderedPage {
                template,
                context,
                messages: &notices,
            };
            (clear_flash(jar), Json(page)).into_response()
        }
        Ok(ViewOutcome::Redirect(route)) => {
            (store_flash(jar, &notices), Redirect::to(&route.path())).into_response()
        }
        Err(err) => err.into_response(),
    }
}

fn mutation_outcome(result: &ViewResult) -> &'static str {
    match result {
        Ok(ViewOutcome::Redirect(Route::Home)) | Ok(ViewOutcome::Redirect(Route::Login { .. })) => {
            "denied"
        }
        Ok(ViewOutcome::Redirect(_)) => "success",
        Ok(ViewOutcome::Render(_)) => "invalid",
        Err(ViewError::NotFound) => "not_found",
        Err(_) => "error",
    }
}

fn track_mutation(operation: &str, store: &dyn CaptureStore, result: &ViewResult) {
    let outcome = mutation_outcome(result);
    record_capture_mutation(operation, outcome);
    if outcome == "success" {
        set_catalog_metrics(store.get_captures_count(), store.get_artists_count());
    }
}

/// A body that fails to parse only matters once the principal is allowed in;
/// anyone else gets the usual redirect from the view.
fn submitted_form(
    session: Option<&Session>,
    body: Result<Json<CaptureForm>, JsonRejection>,
) -> Result<CaptureForm, Response> {
    match body {
        Ok(Json(form)) => Ok(form),
        Err(rejection) if Session::principal(session).privileged => {
            Err(rejection.into_response())
        }
        Err(_) => Ok(CaptureForm::default()),
    }
}

async fn home(session: Option<Session>, State(state): State<ServerState>, jar: CookieJar) -> Response {
    let notices = pending_notices(&jar);
    let page = Page {
        template: HOME_TEMPLATE,
        context: json!({
            "uptime": format_uptime(state.start_time.elapsed()),
            "hash": state.hash,
            "user_id": session.map(|s| s.user_id),
        }),
    };
    respond(jar, notices, Ok(ViewOutcome::Render(page)))
}

async fn all_captures(
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params: ListingParams = pairs.into_iter().collect();
    debug!("all_captures() called with {:?}", params);
    let mut notices = pending_notices(&jar);
    let result = views::all_captures(store.as_ref(), params, &mut notices);
    respond(jar, notices, result)
}

async fn capture_detail(
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let notices = pending_notices(&jar);
    let result = views::capture_detail(store.as_ref(), id);
    respond(jar, notices, result)
}

async fn all_artists(State(store): State<GuardedCaptureStore>, jar: CookieJar) -> Response {
    let notices = pending_notices(&jar);
    let result = views::all_artists(store.as_ref());
    respond(jar, notices, result)
}

async fn add_capture_page(
    session: Option<Session>,
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
) -> Response {
    let mut notices = pending_notices(&jar);
    let principal = Session::principal(session.as_ref());
    let result = views::add_capture(store.as_ref(), &principal, None, &mut notices);
    respond(jar, notices, result)
}

async fn add_capture_submit(
    session: Option<Session>,
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
    body: Result<Json<CaptureForm>, JsonRejection>,
) -> Response {
    let form = match submitted_form(session.as_ref(), body) {
        Ok(form) => form,
        Err(response) => return response,
    };
    let mut notices = pending_notices(&jar);
    let principal = Session::principal(session.as_ref());
    let result = views::add_capture(store.as_ref(), &principal, Some(form), &mut notices);
    track_mutation("add", store.as_ref(), &result);
    respond(jar, notices, result)
}

async fn edit_capture_page(
    session: Option<Session>,
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let mut notices = pending_notices(&jar);
    let principal = Session::principal(session.as_ref());
    let result = views::edit_capture(store.as_ref(), &principal, id, None, &mut notices);
    respond(jar, notices, result)
}

async fn edit_capture_submit(
    session: Option<Session>,
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
    Path(id): Path<i64>,
    body: Result<Json<CaptureForm>, JsonRejection>,
) -> Response {
    let form = match submitted_form(session.as_ref(), body) {
        Ok(form) => form,
        Err(response) => return response,
    };
    let mut notices = pending_notices(&jar);
    let principal = Session::principal(session.as_ref());
    let result = views::edit_capture(store.as_ref(), &principal, id, Some(form), &mut notices);
    track_mutation("edit", store.as_ref(), &result);
    respond(jar, notices, result)
}

async fn delete_capture(
    session: Option<Session>,
    State(store): State<GuardedCaptureStore>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let mut notices = pending_notices(&jar);
    let principal = Session::principal(session.as_ref());
    let result = views::delete_capture(store.as_ref(), &principal, id, &mut notices);
    track_mutation("delete", store.as_ref(), &result);
    respond(jar, notices, result)
}

async fn login_page(jar: CookieJar, Query(params): Query<LoginPageParams>) -> Response {
    let notices = pending_notices(&jar);
    let page = Page {
        template: LOGIN_TEMPLATE,
        context: json!({ "next": params.next }),
    };
    respond(jar, notices, Ok(ViewOutcome::Render(page)))
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for user {}", body.user_handle);
    let credentials = match user_manager.verify_password(&body.user_handle, &body.password) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            record_login_attempt("failure");
            return StatusCode::FORBIDDEN.into_response();
        }
        Err(err) => {
            error!("Error while verifying credentials: {:#}", err);
            record_login_attempt("error");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match user_manager.generate_auth_token(&credentials) {
        Ok(auth_token) => {
            record_login_attempt("success");
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, auth_token.value.0.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (
                StatusCode::CREATED,
                jar.add(cookie),
                Json(LoginSuccessResponse {
                    token: auth_token.value.0,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Error with auth token generation: {:#}", err);
            record_login_attempt("error");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    jar: CookieJar,
    session: Session,
) -> Response {
    match user_manager.delete_auth_token(session.user_id, &AuthTokenValue(session.token)) {
        Ok(()) => {
            let jar = jar.remove(Cookie::build(COOKIE_SESSION_TOKEN_KEY).path("/"));
            (StatusCode::OK, jar).into_response()
        }
        Err(err) => {
            debug!("Logout failed: {}", err);
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    capture_store: GuardedCaptureStore,
    user_manager: GuardedUserManager,
) -> Router {
    let state = ServerState::new(config, capture_store, user_manager);

    let auth_routes: Router = Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let catalog_routes: Router = Router::new()
        .route("/", get(home))
        .route("/artists", get(all_artists))
        .route("/captures", get(all_captures))
        .route("/captures/", get(all_captures))
        .route("/captures/add", get(add_capture_page).post(add_capture_submit))
        .route(
            "/captures/edit/{id}",
            get(edit_capture_page).post(edit_capture_submit),
        )
        .route(
            "/captures/delete/{id}",
            get(delete_capture).post(delete_capture),
        )
        .route("/captures/{id}", get(capture_detail))
        .with_state(state.clone());

    catalog_routes
        .nest("/v1/auth", auth_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    capture_store: Arc<dyn CaptureStore>,
    user_manager: Arc<UserManager>,
    config: ServerConfig,
) -> Result<()> {
    set_catalog_metrics(
        capture_store.get_captures_count(),
        capture_store.get_artists_count(),
    );

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", config.metrics_port))?;
    let metrics_app = Router::new().route("/metrics", get(metrics_handler));
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_app).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let port = config.port;
    let app = make_app(config, capture_store, user_manager);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
