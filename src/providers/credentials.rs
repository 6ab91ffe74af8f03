//! Session credentials supplied by the identity provider
//!
//! The client never owns the session. A [`CredentialProvider`] is injected
//! into the gateway once at startup and asked for the current token on
//! every single request, so rotation or sign-out elsewhere takes effect
//! on the next call.
//!
//! Tokens are NEVER logged. `Debug` output redacts them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::utils::constants::ENV_ACCESS_TOKEN;

/// Opaque bearer token with an optional expiry
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("access_token", &"***HIDDEN***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of the current session credential.
///
/// Return `None` when there is no live session; the gateway then sends the
/// request unauthenticated and lets the server decide.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn current_credential(&self) -> Option<SessionCredential>;
}

/// Anonymous access
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn current_credential(&self) -> Option<SessionCredential> {
        None
    }
}

/// In-memory session slot, updated by whoever owns the login flow
#[derive(Debug, Default)]
pub struct StaticCredentials {
    slot: RwLock<Option<SessionCredential>>,
}

impl StaticCredentials {
    pub fn new(credential: SessionCredential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }

    /// Replace the session (token refresh)
    pub fn set(&self, credential: SessionCredential) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    /// Drop the session (sign-out)
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn current_credential(&self) -> Option<SessionCredential> {
        let credential = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        if credential.is_expired() {
            debug!("🔑 Stored session expired, sending unauthenticated");
            return None;
        }
        Some(credential)
    }
}

/// Reads the token from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(ENV_ACCESS_TOKEN)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn current_credential(&self) -> Option<SessionCredential> {
        std::env::var(&self.var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(SessionCredential::new)
    }
}
