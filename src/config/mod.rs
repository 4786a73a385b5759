mod file_config;

pub use file_config::{FileConfig, IdentityConfig, RecommendationsConfig};

use crate::recommendation::{self, AudienceMatching};
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// Upper bound for retention settings, roughly a century.
pub const MAX_RETENTION_DAYS: u64 = 36_500;
pub const MAX_PRUNE_INTERVAL_HOURS: u64 = 24 * 365;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub seed_catalog: bool,
    pub inactive_user_retention_days: u64,
    pub session_retention_days: u64,
    pub prune_interval_hours: u64,
    pub audience_matching: AudienceMatching,
    pub admin_user_ids: Vec<String>,
    pub identity_secret: Option<String>,
    pub identity_issuer: Option<String>,
    pub identity_audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` keeps every store in memory.
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub seed_catalog: bool,
    /// 0 disables pruning.
    pub inactive_user_retention_days: u64,
    /// Sessions unused for longer are deleted. 0 disables pruning.
    pub session_retention_days: u64,
    pub prune_interval_hours: u64,
    pub audience_matching: AudienceMatching,
    pub admin_user_ids: Vec<String>,
    pub recommendations: RecommendationSettings,
    /// `None` disables sign-in.
    pub identity: Option<IdentitySettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationSettings {
    pub default_limit: usize,
    pub panel_limit: usize,
    pub similar_limit: usize,
    pub accessible_limit: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_limit: recommendation::DEFAULT_LIMIT,
            panel_limit: recommendation::PANEL_LIMIT,
            similar_limit: recommendation::SIMILAR_LIMIT,
            accessible_limit: recommendation::ACCESSIBLE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityAlgorithm {
    Hs256,
    Rs256,
}

impl IdentityAlgorithm {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Some(IdentityAlgorithm::Hs256),
            "RS256" => Some(IdentityAlgorithm::Rs256),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub algorithm: IdentityAlgorithm,
    pub secret: Option<String>,
    pub public_key_path: Option<PathBuf>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file.db_dir.map(PathBuf::from).or_else(|| cli.db_dir.clone());
        if let Some(db_dir) = &db_dir {
            if !db_dir.exists() {
                bail!("Database directory does not exist: {:?}", db_dir);
            }
            if !db_dir.is_dir() {
                bail!("db_dir is not a directory: {:?}", db_dir);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let seed_catalog = file.seed_catalog.unwrap_or(cli.seed_catalog);
        let inactive_user_retention_days = file
            .inactive_user_retention_days
            .unwrap_or(cli.inactive_user_retention_days);
        let session_retention_days = file
            .session_retention_days
            .unwrap_or(cli.session_retention_days);
        let prune_interval_hours = file
            .prune_interval_hours
            .unwrap_or(cli.prune_interval_hours);
        for (name, days) in [
            ("inactive_user_retention_days", inactive_user_retention_days),
            ("session_retention_days", session_retention_days),
        ] {
            if days > MAX_RETENTION_DAYS {
                bail!("{} must be at most {}, got {}", name, MAX_RETENTION_DAYS, days);
            }
        }
        if (inactive_user_retention_days > 0 || session_retention_days > 0)
            && prune_interval_hours == 0
        {
            bail!("prune_interval_hours must be positive when retention is enabled");
        }
        if prune_interval_hours > MAX_PRUNE_INTERVAL_HOURS {
            bail!(
                "prune_interval_hours must be at most {}, got {}",
                MAX_PRUNE_INTERVAL_HOURS,
                prune_interval_hours
            );
        }

        let audience_matching = match file.audience_matching {
            Some(s) => AudienceMatching::from_str(&s, true)
                .map_err(|_| anyhow::anyhow!("Unknown audience_matching '{}'", s))?,
            None => cli.audience_matching,
        };

        let admin_user_ids = file
            .admin_user_ids
            .unwrap_or_else(|| cli.admin_user_ids.clone());

        let rec_file = file.recommendations.unwrap_or_default();
        let defaults = RecommendationSettings::default();
        let recommendations = RecommendationSettings {
            default_limit: rec_file.default_limit.unwrap_or(defaults.default_limit),
            panel_limit: rec_file.panel_limit.unwrap_or(defaults.panel_limit),
            similar_limit: rec_file.similar_limit.unwrap_or(defaults.similar_limit),
            accessible_limit: rec_file
                .accessible_limit
                .unwrap_or(defaults.accessible_limit),
        };

        let identity = resolve_identity(cli, file.identity)?;

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            seed_catalog,
            inactive_user_retention_days,
            session_retention_days,
            prune_interval_hours,
            audience_matching,
            admin_user_ids,
            recommendations,
            identity,
        })
    }

    pub fn catalog_db_path(&self) -> Option<PathBuf> {
        self.db_dir.as_ref().map(|dir| dir.join("catalog.db"))
    }

    pub fn user_db_path(&self) -> Option<PathBuf> {
        self.db_dir.as_ref().map(|dir| dir.join("user.db"))
    }
}

/// The TOML `[identity]` section takes precedence over the CLI shortcut
/// flags, which only support HS256.
fn resolve_identity(
    cli: &CliConfig,
    file_identity: Option<IdentityConfig>,
) -> Result<Option<IdentitySettings>> {
    let settings = match file_identity {
        Some(identity) => {
            let algorithm = match identity.algorithm.as_deref() {
                Some(s) => IdentityAlgorithm::parse(s)
                    .with_context(|| format!("Unsupported identity algorithm '{}'", s))?,
                None => IdentityAlgorithm::Hs256,
            };
            IdentitySettings {
                algorithm,
                secret: identity.secret,
                public_key_path: identity.public_key_path.map(PathBuf::from),
                issuer: identity.issuer.or_else(|| cli.identity_issuer.clone()),
                audience: identity.audience.or_else(|| cli.identity_audience.clone()),
            }
        }
        None => match &cli.identity_secret {
            Some(secret) => IdentitySettings {
                algorithm: IdentityAlgorithm::Hs256,
                secret: Some(secret.clone()),
                public_key_path: None,
                issuer: cli.identity_issuer.clone(),
                audience: cli.identity_audience.clone(),
            },
            None => return Ok(None),
        },
    };

    match settings.algorithm {
        IdentityAlgorithm::Hs256 => {
            if settings.secret.as_deref().unwrap_or("").is_empty() {
                bail!("identity.secret must be set for HS256");
            }
        }
        IdentityAlgorithm::Rs256 => match &settings.public_key_path {
            Some(path) if path.exists() => {}
            Some(path) => bail!("Identity public key not found: {:?}", path),
            None => bail!("identity.public_key_path must be set for RS256"),
        },
    }
    Ok(Some(settings))
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
