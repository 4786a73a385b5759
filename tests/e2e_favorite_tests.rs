//! End-to-end tests for favorites

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::Value;

fn ids(models: &Value) -> Vec<u64> {
    models
        .as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|m| m["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_favorites_require_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    assert_eq!(client.get_favorites().await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        client.add_favorite(CHAT_MODEL_ID).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        client.remove_favorite(CHAT_MODEL_ID).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_add_and_remove_favorites() {
    let server = TestServer::spawn().await;
    let client = TestClient::signed_in(server.base_url.clone(), TEST_USER_ID).await;

    let response = client.add_favorite(IMAGE_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let favorite: Value = response.json().await.unwrap();
    assert_eq!(favorite["modelId"], IMAGE_MODEL_ID);
    assert_eq!(favorite["userId"], TEST_USER_ID);

    client.add_favorite(CHAT_MODEL_ID).await;

    let models: Value = client.get_favorites().await.json().await.unwrap();
    assert_eq!(ids(&models), vec![IMAGE_MODEL_ID, CHAT_MODEL_ID]);

    let response = client.remove_favorite(IMAGE_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["removed"], true);

    let body: Value = client
        .remove_favorite(IMAGE_MODEL_ID)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["removed"], false);

    let models: Value = client.get_favorites().await.json().await.unwrap();
    assert_eq!(ids(&models), vec![CHAT_MODEL_ID]);
}

#[tokio::test]
async fn test_duplicate_favorite_counts_once_towards_collector() {
    let server = TestServer::spawn().await;
    let client = TestClient::signed_in(server.base_url.clone(), TEST_USER_ID).await;

    let first: Value = client.add_favorite(CODE_MODEL_ID).await.json().await.unwrap();
    let second: Value = client.add_favorite(CODE_MODEL_ID).await.json().await.unwrap();
    assert_eq!(first["id"], second["id"]);

    client.add_favorite(TUTOR_MODEL_ID).await;

    let badges: Value = client.get_badges(TEST_USER_ID).await.json().await.unwrap();
    assert_eq!(badges["badges"]["collector"], 2);
}

#[tokio::test]
async fn test_favorite_of_unknown_model() {
    let server = TestServer::spawn().await;
    let client = TestClient::signed_in(server.base_url.clone(), TEST_USER_ID).await;

    let response = client.add_favorite(999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get("/api/favorites/abc").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_favorites_are_per_user() {
    let server = TestServer::spawn().await;
    let ayse = TestClient::signed_in(server.base_url.clone(), TEST_USER_ID).await;
    let mehmet = TestClient::signed_in(server.base_url.clone(), OTHER_USER_ID).await;

    ayse.add_favorite(TRANSLATION_MODEL_ID).await;

    let models: Value = mehmet.get_favorites().await.json().await.unwrap();
    assert!(models.as_array().unwrap().is_empty());
}
