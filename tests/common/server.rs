//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own SQLite databases.

use super::constants::*;
use jsonwebtoken::{Algorithm, DecodingKey};
use modelhub_server::catalog_store::{
    CatalogStore, Complexity, ModelCategory, NewModel, Provider, SqliteCatalogStore,
};
use modelhub_server::identity::{IdentityVerifier, JwtIdentityVerifier};
use modelhub_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use modelhub_server::user::{FullUserStore, SqliteUserStore, UserManager};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

struct FixtureModel {
    name: &'static str,
    description: &'static str,
    category: ModelCategory,
    provider: Provider,
    provider_model_id: &'static str,
    rating: f64,
    usage_count: u64,
    is_active: bool,
    child_friendly: bool,
    elderly_friendly: bool,
    complexity: Option<Complexity>,
}

const FIXTURE_MODELS: [FixtureModel; 6] = [
    FixtureModel {
        name: "Türkçe Sohbet",
        description: "Günlük sohbet için yardımcı asistan",
        category: ModelCategory::Chat,
        provider: Provider::Groq,
        provider_model_id: "llama3-8b-8192",
        rating: 4.5,
        usage_count: 300,
        is_active: true,
        child_friendly: false,
        elderly_friendly: true,
        complexity: Some(Complexity::Simple),
    },
    FixtureModel {
        name: "Çeviri Asistanı",
        description: "İngilizceden Türkçeye çeviri",
        category: ModelCategory::Translation,
        provider: Provider::HuggingFace,
        provider_model_id: "Helsinki-NLP/opus-mt-tc-big-en-tr",
        rating: 4.8,
        usage_count: 50,
        is_active: true,
        child_friendly: true,
        elderly_friendly: true,
        complexity: Some(Complexity::Simple),
    },
    FixtureModel {
        name: "Kod Ustası",
        description: "Gelişmiş kod üretimi",
        category: ModelCategory::Code,
        provider: Provider::DeepSeek,
        provider_model_id: "deepseek-coder",
        rating: 4.2,
        usage_count: 200,
        is_active: true,
        child_friendly: false,
        elderly_friendly: false,
        complexity: Some(Complexity::Advanced),
    },
    FixtureModel {
        name: "Görsel Yaratıcı",
        description: "Metinden görsel oluşturma",
        category: ModelCategory::ImageGeneration,
        provider: Provider::OpenAi,
        provider_model_id: "dall-e-3",
        rating: 4.9,
        usage_count: 120,
        is_active: true,
        child_friendly: true,
        elderly_friendly: false,
        complexity: Some(Complexity::Moderate),
    },
    FixtureModel {
        name: "Eğitim Botu",
        description: "Çocuklar için eğitim odaklı sohbet",
        category: ModelCategory::Chat,
        provider: Provider::Gemini,
        provider_model_id: "gemini-1.5-flash",
        rating: 4.0,
        usage_count: 10,
        is_active: true,
        child_friendly: true,
        elderly_friendly: false,
        complexity: Some(Complexity::Simple),
    },
    FixtureModel {
        name: "Emekli Model",
        description: "Artık kullanılmıyor",
        category: ModelCategory::Chat,
        provider: Provider::OpenAi,
        provider_model_id: "gpt-3.5-turbo",
        rating: 3.0,
        usage_count: 9999,
        is_active: false,
        child_friendly: true,
        elderly_friendly: true,
        complexity: None,
    },
];

fn populate_catalog(store: &dyn CatalogStore) {
    for fixture in FIXTURE_MODELS.iter() {
        store
            .insert_seed_model(
                NewModel {
                    name: fixture.name.to_string(),
                    description: fixture.description.to_string(),
                    image_url: None,
                    category: fixture.category,
                    provider: fixture.provider,
                    provider_model_id: fixture.provider_model_id.to_string(),
                    is_active: fixture.is_active,
                    capabilities: vec![],
                    examples: vec![],
                    child_friendly: fixture.child_friendly,
                    elderly_friendly: fixture.elderly_friendly,
                    complexity: fixture.complexity,
                },
                fixture.rating,
                fixture.usage_count,
            )
            .expect("Failed to insert fixture model");
    }
}

/// Test server instance with an isolated catalog and user database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub port: u16,

    /// User store for direct database access in tests
    pub user_store: Arc<dyn FullUserStore>,

    /// Catalog store for direct database access in tests
    pub catalog_store: Arc<dyn CatalogStore>,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the databases cannot be created, the port cannot be bound or
    /// the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");

        let catalog_store: Arc<dyn CatalogStore> = Arc::new(
            SqliteCatalogStore::new(temp_db_dir.path().join("catalog.db"))
                .expect("Failed to open catalog store"),
        );
        populate_catalog(catalog_store.as_ref());

        let user_store: Arc<dyn FullUserStore> = Arc::new(
            SqliteUserStore::new(temp_db_dir.path().join("user.db"))
                .expect("Failed to open user store"),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            admin_user_ids: vec![ADMIN_USER_ID.to_string()],
            ..Default::default()
        };

        let user_manager = Arc::new(UserManager::new(
            catalog_store.clone(),
            user_store.clone(),
        ));

        let identity_verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::new(
            DecodingKey::from_secret(IDENTITY_SECRET.as_bytes()),
            Algorithm::HS256,
            Some(IDENTITY_ISSUER),
            Some(IDENTITY_AUDIENCE),
        ));

        let app = make_app(
            config,
            catalog_store.clone(),
            user_manager,
            Some(identity_verifier),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            user_store,
            catalog_store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
