//! Back-office session resolution
//!
//! Authentication belongs to the host CMS; this crate only needs to know
//! which back-office user a request is for and whether that user is an
//! administrator. [`SessionResolver`] is the seam the host plugs into. The
//! header-based implementation serves deployments where an auth terminator
//! in front of the proxy stamps the resolved user onto the request.

use crate::error::SessionError;
// async_trait required for dyn-compatibility with Arc<dyn SessionResolver>
use async_trait::async_trait;
use axum::http::HeaderMap;

/// The back-office user a request is being served for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    pub id: i64,
    /// Administrators bypass all start node filtering
    pub admin: bool,
}

impl UserContext {
    pub fn new(id: i64) -> Self {
        Self { id, admin: false }
    }

    pub fn admin(id: i64) -> Self {
        Self { id, admin: true }
    }
}

/// Resolves the current back-office user from an inbound request
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserContext, SessionError>;
}

/// Default header names stamped by the auth terminator
pub const DEFAULT_USER_ID_HEADER: &str = "x-backoffice-user-id";
pub const DEFAULT_ADMIN_HEADER: &str = "x-backoffice-admin";

/// Session resolver that reads the user from trusted request headers
pub struct HeaderSessionResolver {
    user_id_header: String,
    admin_header: String,
}

impl HeaderSessionResolver {
    pub fn new(user_id_header: impl Into<String>, admin_header: impl Into<String>) -> Self {
        Self {
            user_id_header: user_id_header.into(),
            admin_header: admin_header.into(),
        }
    }
}

impl Default for HeaderSessionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_USER_ID_HEADER, DEFAULT_ADMIN_HEADER)
    }
}

#[async_trait]
impl SessionResolver for HeaderSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserContext, SessionError> {
        let raw = headers
            .get(&self.user_id_header)
            .ok_or_else(|| SessionError::MissingHeader {
                header: self.user_id_header.clone(),
            })?;

        let id = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| SessionError::InvalidHeader {
                header: self.user_id_header.clone(),
            })?;

        let admin = headers
            .get(&self.admin_header)
            .and_then(|v| v.to_str().ok())
            .map(|v| matches!(v.trim(), "1" | "true"))
            .unwrap_or(false);

        Ok(UserContext { id, admin })
    }
}
