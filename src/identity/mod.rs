//! Verification of identity tokens issued by the external identity
//! provider. Only verification happens here; issuing tokens is the
//! provider's job.

use crate::config::{IdentityAlgorithm, IdentitySettings};
use crate::user::UserIdentity;
use anyhow::{Context, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Identity token has an empty subject")]
    EmptySubject,
}

pub trait IdentityVerifier: Send + Sync {
    /// Verifies `id_token` and extracts the user profile it carries.
    fn verify(&self, id_token: &str) -> Result<UserIdentity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifies signed JWT identity tokens (HS256 or RS256).
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        JwtIdentityVerifier {
            decoding_key,
            validation,
        }
    }

    pub fn from_settings(settings: &IdentitySettings) -> Result<Self> {
        let (decoding_key, algorithm) = match settings.algorithm {
            IdentityAlgorithm::Hs256 => {
                let secret = settings
                    .secret
                    .as_ref()
                    .context("identity.secret is required for HS256")?;
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            IdentityAlgorithm::Rs256 => {
                let path = settings
                    .public_key_path
                    .as_ref()
                    .context("identity.public_key_path is required for RS256")?;
                let pem = std::fs::read(path)
                    .with_context(|| format!("Failed to read identity public key {:?}", path))?;
                (
                    DecodingKey::from_rsa_pem(&pem).context("Invalid RSA public key")?,
                    Algorithm::RS256,
                )
            }
        };
        info!(
            "Identity tokens verified with {:?} (issuer: {:?}, audience: {:?})",
            algorithm, settings.issuer, settings.audience
        );
        Ok(Self::new(
            decoding_key,
            algorithm,
            settings.issuer.as_deref(),
            settings.audience.as_deref(),
        ))
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, id_token: &str) -> Result<UserIdentity, IdentityError> {
        let data = decode::<IdentityClaims>(id_token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        debug!("Verified identity token for subject {}", claims.sub);
        Ok(UserIdentity {
            id: claims.sub,
            display_name: claims.name,
            email: claims.email,
            avatar: claims.picture,
        })
    }
}
