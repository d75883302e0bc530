//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per capture-server endpoint. Redirects are
//! not followed automatically so tests can inspect them, and cookies are
//! kept so flash notices survive into the next request.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{header, redirect, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// JSON body of every rendered page
#[derive(Debug, Deserialize)]
pub struct RenderedPage {
    pub template: String,
    pub context: Value,
    pub messages: Vec<Value>,
}

impl RenderedPage {
    pub async fn from_response(response: Response) -> Self {
        assert_eq!(response.status(), StatusCode::OK, "Expected a rendered page");
        response.json().await.expect("Page body is not valid JSON")
    }

    pub fn message_texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| m["message"].as_str())
            .collect()
    }

    /// Names of the listed captures, in order
    pub fn capture_names(&self) -> Vec<&str> {
        self.context["captures"]
            .as_array()
            .expect("No captures in context")
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect()
    }
}

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the customer
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);
        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );
        client
    }

    /// Creates a client logged in as the store owner
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);
        let response = client.login(ADMIN_USER, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Admin authentication failed: {:?}",
            response.text().await
        );
        client
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Location header of a 303 response
    pub fn redirect_location(response: &Response) -> String {
        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "Expected a redirect"
        );
        response
            .headers()
            .get(header::LOCATION)
            .expect("Redirect without Location")
            .to_str()
            .expect("Location is not ASCII")
            .to_string()
    }

    /// GETs the target of a redirect response
    pub async fn follow(&self, response: Response) -> Response {
        let location = Self::redirect_location(&response);
        self.get(&location).await
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.post_json(
            "/v1/auth/login",
            &json!({
                "user_handle": handle,
                "password": password,
            }),
        )
        .await
    }

    /// GET /v1/auth/login
    pub async fn login_page(&self, next: &str) -> Response {
        self.client
            .get(format!("{}/v1/auth/login", self.base_url))
            .query(&[("next", next)])
            .send()
            .await
            .expect("Login page request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    /// GET /captures/ with the given query parameters
    pub async fn list_captures(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}/captures/", self.base_url))
            .query(query)
            .send()
            .await
            .expect("Listing request failed")
    }

    /// GET /captures/{id}
    pub async fn get_capture(&self, id: i64) -> Response {
        self.get(&format!("/captures/{}", id)).await
    }

    /// GET /artists
    pub async fn list_artists(&self) -> Response {
        self.get("/artists").await
    }

    // ========================================================================
    // Owner-only Endpoints
    // ========================================================================

    /// GET /captures/add
    pub async fn add_capture_page(&self) -> Response {
        self.get("/captures/add").await
    }

    /// POST /captures/add
    pub async fn add_capture(&self, form: &Value) -> Response {
        self.post_json("/captures/add", form).await
    }

    /// GET /captures/edit/{id}
    pub async fn edit_capture_page(&self, id: i64) -> Response {
        self.get(&format!("/captures/edit/{}", id)).await
    }

    /// POST /captures/edit/{id}
    pub async fn edit_capture(&self, id: i64, form: &Value) -> Response {
        self.post_json(&format!("/captures/edit/{}", id), form).await
    }

    /// POST /captures/delete/{id}
    pub async fn delete_capture(&self, id: i64) -> Response {
        self.client
            .post(format!("{}/captures/delete/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete request failed")
    }
}
