//! Test fixture creation for the captures and user databases

use super::constants::*;
use anyhow::Result;
use capture_catalog_server::capture_store::{CaptureForm, CaptureStore, SqliteCaptureStore};
use capture_catalog_server::user::{SqliteUserStore, UserManager, UserRole};
use std::path::Path;
use std::sync::Arc;

fn capture_form(
    name: &str,
    description: &str,
    artist_id: Option<i64>,
    price: f64,
    rating: Option<f64>,
) -> CaptureForm {
    CaptureForm {
        name: name.to_string(),
        description: description.to_string(),
        artist_id,
        price: Some(price),
        rating,
        ..Default::default()
    }
}

/// Creates captures.db in `dir` with 2 artists and 4 captures.
/// Captures get ids 1 to 4 in the order they are inserted here.
pub fn create_test_catalog(dir: &Path) -> Result<SqliteCaptureStore> {
    let store = SqliteCaptureStore::new(dir.join("captures.db"))?;

    let ansel = store.create_artist(ARTIST_1_NAME, Some(ARTIST_1_FRIENDLY_NAME))?;
    let dorothea = store.create_artist(ARTIST_2_NAME, None)?;

    store.create_capture(&capture_form(
        CAPTURE_1_NAME,
        "Hernandez, New Mexico at dusk",
        Some(ansel.id),
        120.0,
        Some(4.8),
    ))?;
    store.create_capture(&capture_form(
        CAPTURE_2_NAME,
        "Granite face in winter",
        Some(ansel.id),
        95.0,
        Some(4.5),
    ))?;
    store.create_capture(&capture_form(
        CAPTURE_3_NAME,
        "Portrait in Nipomo",
        Some(dorothea.id),
        150.0,
        Some(5.0),
    ))?;
    store.create_capture(&capture_form(
        CAPTURE_4_NAME,
        "Green lights over the fjord",
        None,
        40.0,
        None,
    ))?;

    Ok(store)
}

/// Creates user.db in `dir` with a customer and a store owner, both able to log in.
pub fn create_test_users(dir: &Path) -> Result<UserManager> {
    let user_store = SqliteUserStore::new(dir.join("user.db"))?;
    let user_manager = UserManager::new(Arc::new(user_store));

    for (handle, password, role) in [
        (TEST_USER, TEST_PASS, UserRole::Regular),
        (ADMIN_USER, ADMIN_PASS, UserRole::Admin),
    ] {
        let user_id = user_manager.add_user(handle)?;
        user_manager.create_password_credentials(handle, password)?;
        user_manager.add_user_role(user_id, role)?;
    }

    Ok(user_manager)
}
