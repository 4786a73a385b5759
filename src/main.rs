use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modelhub_server::catalog_store::{
    seed_catalog_if_empty, CatalogStore, InMemoryCatalogStore, SqliteCatalogStore,
};
use modelhub_server::config::{AppConfig, CliConfig, FileConfig};
use modelhub_server::identity::{IdentityVerifier, JwtIdentityVerifier};
use modelhub_server::recommendation::AudienceMatching;
use modelhub_server::server::{self, run_server, RequestsLoggingLevel, ServerConfig};
use modelhub_server::user::{FullUserStore, InMemoryUserStore, SqliteUserStore, UserManager};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in it override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding catalog.db and user.db. Omit to keep everything in memory.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Insert the default models when the catalog is empty.
    #[clap(long)]
    pub seed_catalog: bool,

    /// Days of inactivity after which a user's preferences are cleared. 0 disables pruning.
    #[clap(long, default_value_t = 0)]
    pub inactive_user_retention_days: u64,

    /// Days after which an unused session is deleted. 0 disables pruning.
    #[clap(long, default_value_t = 30)]
    pub session_retention_days: u64,

    /// Interval in hours between pruning runs.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,

    /// How accessible recommendations decide whether a model suits an audience.
    #[clap(long, default_value = "tags")]
    pub audience_matching: AudienceMatching,

    /// User id allowed on the admin routes. Can be repeated.
    #[clap(long = "admin-user-id")]
    pub admin_user_ids: Vec<String>,

    /// HS256 secret shared with the identity provider.
    #[clap(long, env = "IDENTITY_SECRET", hide_env_values = true)]
    pub identity_secret: Option<String>,

    /// Expected `iss` claim of identity tokens.
    #[clap(long)]
    pub identity_issuer: Option<String>,

    /// Expected `aud` claim of identity tokens.
    #[clap(long)]
    pub identity_audience: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            seed_catalog: self.seed_catalog,
            inactive_user_retention_days: self.inactive_user_retention_days,
            session_retention_days: self.session_retention_days,
            prune_interval_hours: self.prune_interval_hours,
            audience_matching: self.audience_matching,
            admin_user_ids: self.admin_user_ids.clone(),
            identity_secret: self.identity_secret.clone(),
            identity_issuer: self.identity_issuer.clone(),
            identity_audience: self.identity_audience.clone(),
        }
    }
}

/// Periodically clears stale preferences and deletes unused sessions.
/// A retention of 0 days skips that kind of pruning.
fn spawn_retention_pruning(
    user_manager: Arc<UserManager>,
    preference_retention_days: u64,
    session_retention_days: u64,
    interval_hours: u64,
) {
    info!(
        "Retention pruning enabled: preferences {} days, sessions {} days, every {} hours",
        preference_retention_days, session_retention_days, interval_hours
    );

    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours * 60 * 60);
        let mut ticker = tokio::time::interval(interval);

        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if preference_retention_days > 0 {
                match user_manager.prune_inactive_preferences(preference_retention_days) {
                    Ok(count) if count > 0 => {
                        info!("Cleared preferences of {} inactive users", count)
                    }
                    Ok(_) => {}
                    Err(e) => error!("Failed to prune inactive preferences: {}", e),
                }
            }
            if session_retention_days > 0 {
                match user_manager.prune_unused_sessions(session_retention_days) {
                    Ok(count) if count > 0 => info!("Deleted {} unused sessions", count),
                    Ok(_) => {}
                    Err(e) => error!("Failed to prune unused sessions: {}", e),
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let (catalog_store, user_store): (Arc<dyn CatalogStore>, Arc<dyn FullUserStore>) =
        match (config.catalog_db_path(), config.user_db_path()) {
            (Some(catalog_db), Some(user_db)) => {
                info!("Opening SQLite catalog database at {:?}...", catalog_db);
                let catalog_store = Arc::new(SqliteCatalogStore::new(&catalog_db)?);
                info!("Opening SQLite user database at {:?}...", user_db);
                let user_store = Arc::new(SqliteUserStore::new(&user_db)?);
                (catalog_store, user_store)
            }
            _ => {
                info!("No db_dir configured, using in-memory stores");
                (
                    Arc::new(InMemoryCatalogStore::new()),
                    Arc::new(InMemoryUserStore::new()),
                )
            }
        };

    if config.seed_catalog {
        let inserted = seed_catalog_if_empty(catalog_store.as_ref())?;
        if inserted > 0 {
            info!("Seeded catalog with {} models", inserted);
        }
    }

    info!("Initializing metrics...");
    server::metrics::init_metrics();
    server::metrics::set_catalog_size(catalog_store.count_models()?);

    let identity_verifier: Option<Arc<dyn IdentityVerifier>> = match &config.identity {
        Some(settings) => Some(Arc::new(JwtIdentityVerifier::from_settings(settings)?)),
        None => {
            info!("No identity provider configured, sign-in is disabled");
            None
        }
    };

    let user_manager = Arc::new(UserManager::new(catalog_store.clone(), user_store));

    if config.inactive_user_retention_days > 0 || config.session_retention_days > 0 {
        spawn_retention_pruning(
            user_manager.clone(),
            config.inactive_user_retention_days,
            config.session_retention_days,
            config.prune_interval_hours,
        );
    }

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        metrics_port: config.metrics_port,
        frontend_dir_path: config.frontend_dir_path.clone(),
        recommendations: config.recommendations.clone(),
        audience_matching: config.audience_matching,
        admin_user_ids: config.admin_user_ids.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    run_server(server_config, catalog_store, user_manager, identity_verifier).await
}
