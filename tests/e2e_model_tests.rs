//! End-to-end tests for the model catalog endpoints

mod common;

use common::*;
use modelhub_server::catalog_store::CatalogStore;
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
async fn test_list_models_hides_inactive() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.list_models().await;
    assert_eq!(response.status(), StatusCode::OK);
    let models: Value = response.json().await.unwrap();
    assert_eq!(models.as_array().unwrap().len(), ACTIVE_MODEL_COUNT);
    assert!(!ids(&models).contains(&INACTIVE_MODEL_ID));

    let first = &models[0];
    assert_eq!(first["name"], "Türkçe Sohbet");
    assert_eq!(first["category"], "chat");
    assert_eq!(first["provider"], "groq");
    assert_eq!(first["modelId"], "llama3-8b-8192");
    assert_eq!(first["isActive"], true);
}

#[tokio::test]
async fn test_list_models_filtered_by_category() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let models: Value = client.get("/api/models?category=chat").await.json().await.unwrap();
    assert_eq!(ids(&models), vec![CHAT_MODEL_ID, TUTOR_MODEL_ID]);

    let response = client.get("/api/models?category=astrology").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_model_increments_usage_count() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_model(CHAT_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let model: Value = response.json().await.unwrap();
    assert_eq!(model["usageCount"], CHAT_MODEL_USAGE + 1);

    let model: Value = client.get_model(CHAT_MODEL_ID).await.json().await.unwrap();
    assert_eq!(model["usageCount"], CHAT_MODEL_USAGE + 2);
}

#[tokio::test]
async fn test_get_model_errors() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get("/api/models/not-a-number").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Geçersiz model ID");

    let response = client.get_model(999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Model bulunamadı");

    let response = client.get_model(INACTIVE_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_models_by_category_route() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_models_by_category("image-generation").await;
    assert_eq!(response.status(), StatusCode::OK);
    let models: Value = response.json().await.unwrap();
    assert_eq!(ids(&models), vec![IMAGE_MODEL_ID]);

    let response = client.get_models_by_category("math").await;
    assert_eq!(response.status(), StatusCode::OK);
    let models: Value = response.json().await.unwrap();
    assert!(models.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_similar_models() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_similar_models(CHAT_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let models: Value = response.json().await.unwrap();
    // Same category, without the model itself nor inactive ones
    assert_eq!(ids(&models), vec![TUTOR_MODEL_ID]);

    let response = client.get_similar_models(CODE_MODEL_ID).await;
    let models: Value = response.json().await.unwrap();
    assert!(models.as_array().unwrap().is_empty());

    let response = client.get_similar_models(999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_usage_only_moves_global_counter() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.record_usage(TRANSLATION_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["modelId"], TRANSLATION_MODEL_ID);
    assert_eq!(body["usageCount"], TRANSLATION_MODEL_USAGE + 1);
    assert!(body["badges"].is_null());
}

#[tokio::test]
async fn test_failed_invocation_is_not_tracked() {
    let server = TestServer::spawn().await;
    let client = TestClient::signed_in(server.base_url.clone(), TEST_USER_ID).await;

    let response = client
        .report_failed_usage(TRANSLATION_MODEL_ID, "provider timeout")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Bir hata oluştu. Lütfen başka bir model deneyin.");

    let model = server
        .catalog_store
        .get_model(TRANSLATION_MODEL_ID)
        .unwrap()
        .unwrap();
    assert_eq!(model.usage_count, TRANSLATION_MODEL_USAGE);

    let badges: Value = client.get_badges(TEST_USER_ID).await.json().await.unwrap();
    assert_eq!(badges["badges"]["translator"], 0);
}

#[tokio::test]
async fn test_usage_of_inactive_model_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.record_usage(INACTIVE_MODEL_ID).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
