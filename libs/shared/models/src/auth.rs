use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub tipo_usuario: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    /// Marketplace role carried by the token.
    ///
    /// Supabase puts `authenticated` in `role`, so the explicit claim and the
    /// metadata objects win over it.
    pub fn marketplace_role(&self) -> Option<String> {
        let from_metadata = |meta: &Option<serde_json::Value>, key: &str| {
            meta.as_ref()
                .and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        self.tipo_usuario.clone()
            .or_else(|| from_metadata(&self.app_metadata, "role"))
            .or_else(|| from_metadata(&self.user_metadata, "tipo_usuario"))
            .or_else(|| self.role.clone())
    }
}

/// Marketplace roles. Tokens from older clients carry the Spanish names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[serde(alias = "cliente")]
    Client,
    #[serde(alias = "profesional")]
    Professional,
    Admin,
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "cliente" => Ok(UserRole::Client),
            "professional" | "profesional" => Ok(UserRole::Professional),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Client => write!(f, "client"),
            UserRole::Professional => write!(f, "professional"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Subject claim parsed as a UUID; every marketplace account is keyed by one.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.id)
            .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.user_role() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    pub fn require_role(&self, role: UserRole) -> Result<Uuid, AppError> {
        if !self.has_role(role) {
            return Err(AppError::Forbidden(format!("Only {} accounts can do this", role)));
        }
        self.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: &str) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            email: None,
            role: Some(role.to_string()),
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn parses_spanish_and_english_roles() {
        assert_eq!("PROFESIONAL".parse::<UserRole>(), Ok(UserRole::Professional));
        assert_eq!("client".parse::<UserRole>(), Ok(UserRole::Client));
        assert!("doctor".parse::<UserRole>().is_err());
    }

    #[test]
    fn require_role_rejects_other_roles() {
        let user = user_with_role("cliente");
        assert!(user.require_role(UserRole::Client).is_ok());
        assert!(matches!(
            user.require_role(UserRole::Professional),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn marketplace_role_prefers_explicit_claims() {
        let claims: JwtClaims = serde_json::from_str(
            r#"{"sub":"abc","role":"authenticated","app_metadata":{"role":"professional"}}"#,
        ).unwrap();
        assert_eq!(claims.marketplace_role().as_deref(), Some("professional"));

        let claims: JwtClaims = serde_json::from_str(
            r#"{"sub":"abc","role":"authenticated","tipo_usuario":"cliente"}"#,
        ).unwrap();
        assert_eq!(claims.marketplace_role().as_deref(), Some("cliente"));

        let claims: JwtClaims = serde_json::from_str(r#"{"sub":"abc","role":"admin"}"#).unwrap();
        assert_eq!(claims.marketplace_role().as_deref(), Some("admin"));
    }
}
