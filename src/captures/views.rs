//! Capture views. Each operation reads the store, pushes notices and returns
//! either a page to render or a route to redirect to. Translation to HTTP
//! happens in the server module.

use super::listing::{build_listing, ListingParams, ListingRequest};
use super::notices::Notices;
use crate::capture_store::{Capture, CaptureForm, CaptureStore, CaptureStoreError};
use crate::capture_store::validation::FormErrors;
use crate::user::Permission;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

pub const CAPTURES_TEMPLATE: &str = "captures/captures.html";
pub const CAPTURE_DETAIL_TEMPLATE: &str = "captures/capture_detail.html";
pub const ADD_CAPTURE_TEMPLATE: &str = "captures/add_capture.html";
pub const EDIT_CAPTURE_TEMPLATE: &str = "captures/edit_capture.html";
pub const ARTISTS_TEMPLATE: &str = "captures/artists.html";

const OWNERS_ONLY_MESSAGE: &str = "Sorry, only store owners can do that.";

/// What the acting user may do, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Principal {
    pub user_id: Option<usize>,
    pub privileged: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: usize, permissions: &[Permission]) -> Self {
        Principal {
            user_id: Some(user_id),
            privileged: permissions.contains(&Permission::EditCatalog),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Captures,
    CaptureDetail(i64),
    AddCapture,
    EditCapture(i64),
    DeleteCapture(i64),
    Login { next: String },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Captures => "/captures/".to_string(),
            Route::CaptureDetail(id) => format!("/captures/{}", id),
            Route::AddCapture => "/captures/add".to_string(),
            Route::EditCapture(id) => format!("/captures/edit/{}", id),
            Route::DeleteCapture(id) => format!("/captures/delete/{}", id),
            Route::Login { next } => {
                format!("/v1/auth/login?next={}", urlencoding::encode(next))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub template: &'static str,
    pub context: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    Render(Page),
    Redirect(Route),
}

fn render(template: &'static str, context: Value) -> ViewOutcome {
    ViewOutcome::Render(Page { template, context })
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for ViewError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<CaptureStoreError>() {
            Some(CaptureStoreError::UnknownSortField(_)) => ViewError::BadRequest(err.to_string()),
            _ => ViewError::Store(err),
        }
    }
}

pub type ViewResult = Result<ViewOutcome, ViewError>;

/// Login is required first, then the EditCatalog permission. Returns the
/// redirect to follow when the principal may not continue.
fn require_store_owner(
    principal: &Principal,
    requested: Route,
    notices: &mut Notices,
) -> Option<ViewOutcome> {
    if principal.user_id.is_none() {
        return Some(ViewOutcome::Redirect(Route::Login {
            next: requested.path(),
        }));
    }
    if !principal.privileged {
        debug!(
            "User {:?} denied access to {}",
            principal.user_id,
            requested.path()
        );
        notices.error(OWNERS_ONLY_MESSAGE);
        return Some(ViewOutcome::Redirect(Route::Home));
    }
    None
}

fn form_context(data: &CaptureForm, errors: &FormErrors) -> Value {
    json!({
        "data": data,
        "errors": errors.to_json(),
    })
}

/// Splits the validation failure of a save from every other error.
fn saved<T>(result: anyhow::Result<T>) -> Result<Result<T, FormErrors>, ViewError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(err) => match err.downcast::<CaptureStoreError>() {
            Ok(CaptureStoreError::InvalidForm(errors)) => Ok(Err(errors)),
            Ok(other) => Err(ViewError::from(anyhow::Error::from(other))),
            Err(err) => Err(ViewError::from(err)),
        },
    }
}

pub fn all_captures(
    store: &dyn CaptureStore,
    params: ListingParams,
    notices: &mut Notices,
) -> ViewResult {
    let request = match ListingRequest::try_from(params) {
        Ok(request) => request,
        Err(err) => {
            notices.error(err.to_string());
            return Ok(ViewOutcome::Redirect(Route::Captures));
        }
    };
    let listing = build_listing(store, request)?;
    debug!(
        "Listing {} captures, sorting {}",
        listing.captures.len(),
        listing.current_sorting
    );
    Ok(render(
        CAPTURES_TEMPLATE,
        json!({
            "captures": listing.captures,
            "search_term": listing.search_term,
            "current_artists": listing.current_artists,
            "current_sorting": listing.current_sorting,
        }),
    ))
}

pub fn capture_detail(store: &dyn CaptureStore, capture_id: i64) -> ViewResult {
    let capture = store.get_capture(capture_id)?.ok_or(ViewError::NotFound)?;
    Ok(render(CAPTURE_DETAIL_TEMPLATE, json!({ "capture": capture })))
}

pub fn all_artists(store: &dyn CaptureStore) -> ViewResult {
    let artists = store.list_artists()?;
    Ok(render(ARTISTS_TEMPLATE, json!({ "artists": artists })))
}

/// `submission` is None for the GET that shows the empty form.
pub fn add_capture(
    store: &dyn CaptureStore,
    principal: &Principal,
    submission: Option<CaptureForm>,
    notices: &mut Notices,
) -> ViewResult {
    if let Some(redirect) = require_store_owner(principal, Route::AddCapture, notices) {
        return Ok(redirect);
    }

    let form = match submission {
        None => {
            return Ok(render(
                ADD_CAPTURE_TEMPLATE,
                json!({ "form": form_context(&CaptureForm::default(), &FormErrors::default()) }),
            ))
        }
        Some(form) => form,
    };

    match saved(store.create_capture(&form))? {
        Ok(capture) => {
            info!("Capture {} added by user {:?}", capture.id, principal.user_id);
            notices.success("Successfully added capture!");
            Ok(ViewOutcome::Redirect(Route::CaptureDetail(capture.id)))
        }
        Err(errors) => {
            notices.error("Failed to add capture. Please ensure the form is valid.");
            Ok(render(
                ADD_CAPTURE_TEMPLATE,
                json!({ "form": form_context(&form, &errors) }),
            ))
        }
    }
}

pub fn edit_capture(
    store: &dyn CaptureStore,
    principal: &Principal,
    capture_id: i64,
    submission: Option<CaptureForm>,
    notices: &mut Notices,
) -> ViewResult {
    if let Some(redirect) =
        require_store_owner(principal, Route::EditCapture(capture_id), notices)
    {
        return Ok(redirect);
    }
    let capture: Capture = store.get_capture(capture_id)?.ok_or(ViewError::NotFound)?;

    let form = match submission {
        None => {
            notices.info(format!("You are editing {}", capture.name));
            return Ok(render(
                EDIT_CAPTURE_TEMPLATE,
                json!({
                    "form": form_context(&CaptureForm::from(&capture), &FormErrors::default()),
                    "capture": capture,
                }),
            ));
        }
        Some(form) => form,
    };

    match saved(store.update_capture(capture_id, &form))? {
        Ok(Some(updated)) => {
            info!("Capture {} updated by user {:?}", updated.id, principal.user_id);
            notices.success("Successfully updated capture!");
            Ok(ViewOutcome::Redirect(Route::CaptureDetail(updated.id)))
        }
        Ok(None) => Err(ViewError::NotFound),
        Err(errors) => {
            notices.error("Failed to update capture. Please ensure the form is valid.");
            Ok(render(
                EDIT_CAPTURE_TEMPLATE,
                json!({
                    "form": form_context(&form, &errors),
                    "capture": capture,
                }),
            ))
        }
    }
}

pub fn delete_capture(
    store: &dyn CaptureStore,
    principal: &Principal,
    capture_id: i64,
    notices: &mut Notices,
) -> ViewResult {
    if let Some(redirect) =
        require_store_owner(principal, Route::DeleteCapture(capture_id), notices)
    {
        return Ok(redirect);
    }
    if !store.delete_capture(capture_id)? {
        return Err(ViewError::NotFound);
    }
    info!("Capture {} deleted by user {:?}", capture_id, principal.user_id);
    notices.success("Capture deleted!");
    Ok(ViewOutcome::Redirect(Route::Captures))
}
