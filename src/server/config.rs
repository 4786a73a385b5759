use super::RequestsLoggingLevel;
use crate::config::RecommendationSettings;
use crate::recommendation::AudienceMatching;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub frontend_dir_path: Option<String>,
    pub recommendations: RecommendationSettings,
    pub audience_matching: AudienceMatching,
    /// Identity-provider user ids allowed on the admin routes.
    pub admin_user_ids: Vec<String>,
}

impl ServerConfig {
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.iter().any(|id| id == user_id)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            frontend_dir_path: None,
            recommendations: RecommendationSettings::default(),
            audience_matching: AudienceMatching::default(),
            admin_user_ids: vec![],
        }
    }
}
