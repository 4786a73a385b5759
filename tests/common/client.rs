//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides one method per API endpoint. When routes or
//! request formats change, update only this file.

use super::constants::*;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

/// Mints an identity token the way the external provider would.
pub fn mint_id_token(user_id: &str, name: &str) -> String {
    mint_id_token_with_secret(user_id, name, IDENTITY_SECRET)
}

pub fn mint_id_token_with_secret(user_id: &str, name: &str, secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": user_id,
            "name": name,
            "email": format!("{}@example.com", user_id),
            "iss": IDENTITY_ISSUER,
            "aud": IDENTITY_AUDIENCE,
            "iat": now,
            "exp": now + 3600,
        }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to mint identity token")
}

impl TestClient {
    /// Creates a new anonymous client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client signed in as `user_id`
    ///
    /// # Panics
    ///
    /// Panics if sign-in fails (indicates test infrastructure problem).
    pub async fn signed_in(base_url: String, user_id: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.sign_in(&mint_id_token(user_id, "Test User")).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Sign-in failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// POST /api/auth/session
    pub async fn sign_in(&self, id_token: &str) -> Response {
        self.client
            .post(self.url("/api/auth/session"))
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .expect("Sign-in request failed")
    }

    /// GET /api/auth/session
    pub async fn get_session(&self) -> Response {
        self.client
            .get(self.url("/api/auth/session"))
            .send()
            .await
            .expect("Get session request failed")
    }

    /// DELETE /api/auth/session
    pub async fn sign_out(&self) -> Response {
        self.client
            .delete(self.url("/api/auth/session"))
            .send()
            .await
            .expect("Sign-out request failed")
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// GET /api/models
    pub async fn list_models(&self) -> Response {
        self.get("/api/models").await
    }

    /// GET /api/models/{id}
    pub async fn get_model(&self, id: u64) -> Response {
        self.get(&format!("/api/models/{}", id)).await
    }

    /// GET /api/models/category/{category}
    pub async fn get_models_by_category(&self, category: &str) -> Response {
        self.get(&format!("/api/models/category/{}", category)).await
    }

    /// GET /api/models/{id}/similar
    pub async fn get_similar_models(&self, id: u64) -> Response {
        self.get(&format!("/api/models/{}/similar", id)).await
    }

    /// POST /api/models/{id}/usage for a successful invocation
    pub async fn record_usage(&self, id: u64) -> Response {
        self.client
            .post(self.url(&format!("/api/models/{}/usage", id)))
            .send()
            .await
            .expect("Record usage request failed")
    }

    /// POST /api/models/{id}/usage for a failed invocation
    pub async fn report_failed_usage(&self, id: u64, error: &str) -> Response {
        self.client
            .post(self.url(&format!("/api/models/{}/usage", id)))
            .json(&json!({ "success": false, "error": error }))
            .send()
            .await
            .expect("Report usage request failed")
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    /// GET /api/recommendations
    pub async fn get_recommendations(&self, limit: Option<i64>) -> Response {
        match limit {
            Some(limit) => {
                self.get(&format!("/api/recommendations?limit={}", limit))
                    .await
            }
            None => self.get("/api/recommendations").await,
        }
    }

    /// GET /api/recommendations/accessible
    pub async fn get_accessible(&self, audience: &str) -> Response {
        self.get(&format!(
            "/api/recommendations/accessible?audience={}",
            audience
        ))
        .await
    }

    // ========================================================================
    // Badges
    // ========================================================================

    /// GET /api/users/{user_id}/badges
    pub async fn get_badges(&self, user_id: &str) -> Response {
        self.get(&format!("/api/users/{}/badges", user_id)).await
    }

    /// GET /api/users/{user_id}/badges/status
    pub async fn get_badge_status(&self, user_id: &str) -> Response {
        self.get(&format!("/api/users/{}/badges/status", user_id))
            .await
    }

    /// GET /api/users/{user_id}/badges/earned
    pub async fn get_earned_badges(&self, user_id: &str) -> Response {
        self.get(&format!("/api/users/{}/badges/earned", user_id))
            .await
    }

    /// POST /api/users/{user_id}/badges/progress
    pub async fn increment_badge_progress(&self, user_id: &str, body: Value) -> Response {
        self.client
            .post(self.url(&format!("/api/users/{}/badges/progress", user_id)))
            .json(&body)
            .send()
            .await
            .expect("Badge progress request failed")
    }

    /// POST /api/users/{user_id}/badges/earn
    pub async fn earn_badge(&self, user_id: &str, body: Value) -> Response {
        self.client
            .post(self.url(&format!("/api/users/{}/badges/earn", user_id)))
            .json(&body)
            .send()
            .await
            .expect("Earn badge request failed")
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// GET /api/favorites
    pub async fn get_favorites(&self) -> Response {
        self.get("/api/favorites").await
    }

    /// POST /api/favorites
    pub async fn add_favorite(&self, model_id: u64) -> Response {
        self.client
            .post(self.url("/api/favorites"))
            .json(&json!({ "modelId": model_id }))
            .send()
            .await
            .expect("Add favorite request failed")
    }

    /// DELETE /api/favorites/{model_id}
    pub async fn remove_favorite(&self, model_id: u64) -> Response {
        self.client
            .delete(self.url(&format!("/api/favorites/{}", model_id)))
            .send()
            .await
            .expect("Remove favorite request failed")
    }

    // ========================================================================
    // Admin
    // ========================================================================

    /// GET /api/admin/models
    pub async fn admin_list_models(&self) -> Response {
        self.get("/api/admin/models").await
    }

    /// POST /api/admin/models
    pub async fn admin_create_model(&self, body: Value) -> Response {
        self.client
            .post(self.url("/api/admin/models"))
            .json(&body)
            .send()
            .await
            .expect("Create model request failed")
    }

    /// PUT /api/admin/models/{id}/active
    pub async fn admin_set_active(&self, id: u64, is_active: bool) -> Response {
        self.client
            .put(self.url(&format!("/api/admin/models/{}/active", id)))
            .json(&json!({ "isActive": is_active }))
            .send()
            .await
            .expect("Set active request failed")
    }

    /// GET on an arbitrary path
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }
}
