use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub const MSG_INVALID_MODEL_ID: &str = "Geçersiz model ID";
pub const MSG_MODEL_NOT_FOUND: &str = "Model bulunamadı";
pub const MSG_USER_NOT_FOUND: &str = "Kullanıcı bulunamadı";
pub const MSG_MISSING_BADGE_TYPE: &str = "Rozet tipi belirtilmedi";
pub const MSG_MISSING_BADGE_TYPE_OR_LEVEL: &str = "Rozet tipi veya seviyesi belirtilmedi";
pub const MSG_INVALID_CATEGORY: &str = "Geçersiz kategori";
pub const MSG_INVALID_AUDIENCE: &str = "Geçersiz hedef kitle";
pub const MSG_INVALID_BODY: &str = "Geçersiz istek gövdesi";
pub const MSG_UNKNOWN_BADGE: &str = "Bilinmeyen rozet";
pub const MSG_SIGN_IN_REQUIRED: &str = "Oturum açmanız gerekiyor";
pub const MSG_FORBIDDEN: &str = "Bu işlem için yetkiniz yok";
pub const MSG_INVALID_IDENTITY: &str = "Kimlik doğrulanamadı";
pub const MSG_IDENTITY_DISABLED: &str = "Oturum açma şu anda kullanılamıyor";
pub const MSG_TRY_ANOTHER_MODEL: &str = "Bir hata oluştu. Lütfen başka bir model deneyin.";
pub const MSG_MODELS_FETCH_FAILED: &str = "Modeller alınırken bir hata oluştu";

/// Client-visible failure of an API call. Every variant renders as
/// `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    UpstreamProvider(&'static str),
    #[error("{0}")]
    ServiceUnavailable(&'static str),
    /// The inner error is logged, never sent to the client.
    #[error("{message}")]
    Internal {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn invalid(message: &str) -> Self {
        ApiError::InvalidInput(message.to_string())
    }

    pub fn internal(message: &'static str, cause: anyhow::Error) -> Self {
        ApiError::Internal { message, cause }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::UpstreamProvider(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(cause: anyhow::Error) -> Self {
        ApiError::internal("Beklenmeyen bir hata oluştu", cause)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal { message, cause } => error!("{}: {:#}", message, cause),
            ApiError::UpstreamProvider(message) => warn!("Upstream provider failure: {}", message),
            _ => {}
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
