//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, CHAT_MODEL_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_model() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.get_model(CHAT_MODEL_ID).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod server;

pub use client::{mint_id_token, mint_id_token_with_secret, TestClient};
pub use constants::*;
pub use server::TestServer;
