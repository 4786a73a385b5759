use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub seed_catalog: Option<bool>,
    pub inactive_user_retention_days: Option<u64>,
    pub session_retention_days: Option<u64>,
    pub prune_interval_hours: Option<u64>,
    pub audience_matching: Option<String>,
    pub admin_user_ids: Option<Vec<String>>,

    // Feature configs
    pub recommendations: Option<RecommendationsConfig>,
    pub identity: Option<IdentityConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationsConfig {
    pub default_limit: Option<usize>,
    pub panel_limit: Option<usize>,
    pub similar_limit: Option<usize>,
    pub accessible_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct IdentityConfig {
    /// "HS256" or "RS256"
    pub algorithm: Option<String>,
    pub secret: Option<String>,
    pub public_key_path: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_file() {
        let toml = r#"
            db_dir = "/data"
            port = 4000
            logging_level = "headers"
            seed_catalog = false
            inactive_user_retention_days = 90
            session_retention_days = 14
            audience_matching = "keywords"
            admin_user_ids = ["admin-1"]

            [recommendations]
            panel_limit = 5

            [identity]
            algorithm = "HS256"
            secret = "s3cret"
            issuer = "https://id.example.com"
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.db_dir.as_deref(), Some("/data"));
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.seed_catalog, Some(false));
        assert_eq!(config.inactive_user_retention_days, Some(90));
        assert_eq!(config.session_retention_days, Some(14));
        assert_eq!(config.admin_user_ids, Some(vec!["admin-1".to_string()]));
        assert_eq!(config.recommendations.unwrap().panel_limit, Some(5));
        let identity = config.identity.unwrap();
        assert_eq!(identity.secret.as_deref(), Some("s3cret"));
        assert!(identity.audience.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.db_dir.is_none());
        assert!(config.identity.is_none());
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(FileConfig::load(&missing).is_err());

        let bad = dir.path().join("bad.toml");
        std::fs::File::create(&bad)
            .unwrap()
            .write_all(b"port = \"not a number\"")
            .unwrap();
        let err = FileConfig::load(&bad).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }
}
