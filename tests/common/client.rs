//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all library server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client carrying an optional bearer token
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set
    pub access_token: Option<String>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            access_token: None,
        }
    }

    pub fn with_token(base_url: String, access_token: &str) -> Self {
        let mut client = Self::new(base_url);
        client.access_token = Some(access_token.to_string());
        client
    }

    /// Creates a client logged in as the test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed"
        );
        let tokens: Value = response.json().await.expect("Invalid login response");
        let access_token = tokens["accessToken"]
            .as_str()
            .expect("Login response without access token");

        Self::with_token(client.base_url, access_token)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Response {
        builder.send().await.expect("Request failed")
    }

    // ========================================================================
    // Generic requests
    // ========================================================================

    pub async fn get(&self, path: &str) -> Response {
        Self::send(self.request(Method::GET, path)).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        Self::send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        Self::send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Response {
        Self::send(self.request(Method::DELETE, path)).await
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /auth/signup
    pub async fn signup(&self, login: &str, password: &str) -> Response {
        self.post_json(
            "/auth/signup",
            &json!({ "login": login, "password": password }),
        )
        .await
    }

    /// POST /auth/login
    pub async fn login(&self, login: &str, password: &str) -> Response {
        self.post_json(
            "/auth/login",
            &json!({ "login": login, "password": password }),
        )
        .await
    }

    /// POST /auth/refresh, without a token when `refresh_token` is `None`
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Response {
        let body = match refresh_token {
            Some(token) => json!({ "refreshToken": token }),
            None => json!({}),
        };
        self.post_json("/auth/refresh", &body).await
    }

    // ========================================================================
    // Library Endpoints
    // ========================================================================

    /// POST /artist
    pub async fn create_artist(&self, name: &str, has_award: bool) -> Response {
        self.post_json("/artist", &json!({ "name": name, "hasAward": has_award }))
            .await
    }

    /// POST /album
    pub async fn create_album(&self, name: &str, year: i32, artist_id: Option<&str>) -> Response {
        self.post_json(
            "/album",
            &json!({ "name": name, "year": year, "artistId": artist_id }),
        )
        .await
    }

    /// POST /track
    pub async fn create_track(
        &self,
        name: &str,
        duration: i64,
        artist_id: Option<&str>,
        album_id: Option<&str>,
    ) -> Response {
        self.post_json(
            "/track",
            &json!({
                "name": name,
                "duration": duration,
                "artistId": artist_id,
                "albumId": album_id,
            }),
        )
        .await
    }

    /// GET /{kind}
    pub async fn list(&self, kind: &str) -> Response {
        self.get(&format!("/{}", kind)).await
    }

    /// GET /{kind}/{id}
    pub async fn get_record(&self, kind: &str, id: &str) -> Response {
        self.get(&format!("/{}/{}", kind, id)).await
    }

    /// PUT /{kind}/{id}
    pub async fn update_record(&self, kind: &str, id: &str, patch: &Value) -> Response {
        self.put_json(&format!("/{}/{}", kind, id), patch).await
    }

    /// DELETE /{kind}/{id}
    pub async fn delete_record(&self, kind: &str, id: &str) -> Response {
        self.delete(&format!("/{}/{}", kind, id)).await
    }

    /// Creates a record and returns its id, panicking unless it was created
    pub async fn created_id(response: Response) -> String {
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Record was not created"
        );
        let body: Value = response.json().await.expect("Invalid create response");
        body["id"].as_str().expect("Record without id").to_string()
    }

    // ========================================================================
    // Favorites Endpoints
    // ========================================================================

    /// GET /favs
    pub async fn get_favorites(&self) -> Response {
        self.get("/favs").await
    }

    /// POST /favs/{kind}/{id}
    pub async fn add_favorite(&self, kind: &str, id: &str) -> Response {
        Self::send(self.request(Method::POST, &format!("/favs/{}/{}", kind, id))).await
    }

    /// DELETE /favs/{kind}/{id}
    pub async fn remove_favorite(&self, kind: &str, id: &str) -> Response {
        self.delete(&format!("/favs/{}/{}", kind, id)).await
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /user
    pub async fn list_users(&self) -> Response {
        self.get("/user").await
    }

    /// POST /user
    pub async fn create_user(&self, login: &str, password: &str) -> Response {
        self.post_json("/user", &json!({ "login": login, "password": password }))
            .await
    }

    /// GET /user/{id}
    pub async fn get_user(&self, id: &str) -> Response {
        self.get(&format!("/user/{}", id)).await
    }

    /// PUT /user/{id}
    pub async fn update_password(&self, id: &str, old_password: &str, new_password: &str) -> Response {
        self.put_json(
            &format!("/user/{}", id),
            &json!({ "oldPassword": old_password, "newPassword": new_password }),
        )
        .await
    }

    /// DELETE /user/{id}
    pub async fn delete_user(&self, id: &str) -> Response {
        self.delete(&format!("/user/{}", id)).await
    }
}
