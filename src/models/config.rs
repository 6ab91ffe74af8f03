//! Configuration module for the Shield client
//!
//! Where the backend lives and which chains it understands. Uses constants
//! from utils/constants.rs, no hardcoded URLs here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::models::errors::{ShieldError, ShieldResult};
use crate::utils::constants::{API_PREFIX, DEFAULT_API_URL, ENV_API_URL, USER_AGENT};

/// Chains the analysis service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Ethereum,
    Polygon,
    Arbitrum,
    Base,
    Solana,
    Ton,
    Bitcoin,
}

impl Chain {
    pub const ALL: [Chain; 7] = [
        Chain::Ethereum,
        Chain::Polygon,
        Chain::Arbitrum,
        Chain::Base,
        Chain::Solana,
        Chain::Ton,
        Chain::Bitcoin,
    ];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Polygon => "polygon",
            Chain::Arbitrum => "arbitrum",
            Chain::Base => "base",
            Chain::Solana => "solana",
            Chain::Ton => "ton",
            Chain::Bitcoin => "bitcoin",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::Polygon => "Polygon",
            Chain::Arbitrum => "Arbitrum",
            Chain::Base => "Base",
            Chain::Solana => "Solana",
            Chain::Ton => "TON",
            Chain::Bitcoin => "Bitcoin",
        }
    }

    /// EVM chains have ERC-20 approvals to revoke
    pub fn is_evm(&self) -> bool {
        matches!(
            self,
            Chain::Ethereum | Chain::Polygon | Chain::Arbitrum | Chain::Base
        )
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Chain::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ShieldError::validation(format!("Unsupported chain: {}", s)))
    }
}

/// Backend location and client identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldConfig {
    /// Base URL of the backend, without trailing slash
    pub api_url: String,
    /// API-version prefix inserted before every endpoint path
    pub api_prefix: String,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var(ENV_API_URL)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(|url| trim_base(&url))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_prefix: API_PREFIX.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ShieldConfig {
    /// Load from environment and validate the base URL
    pub fn from_env() -> ShieldResult<Self> {
        let config = Self::default();
        config.validate()?;
        info!("🔧 Shield API: {}{}", config.api_url, config.api_prefix);
        Ok(config)
    }

    /// Config pointing at an explicit backend
    pub fn with_api_url(api_url: impl AsRef<str>) -> Self {
        Self {
            api_url: trim_base(api_url.as_ref()),
            ..Self::default()
        }
    }

    /// Base URL must be absolute http(s)
    pub fn validate(&self) -> ShieldResult<()> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| {
            ShieldError::invalid_config(format!("Invalid API URL '{}': {}", self.api_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ShieldError::invalid_config(format!(
                "Unsupported API URL scheme: {}",
                other
            ))),
        }
    }

    /// Resolve an endpoint path to an absolute URL.
    ///
    /// Absolute `http(s)://` paths are passed through untouched.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!("{}{}{}{}", self.api_url, self.api_prefix, separator, path)
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_parse() {
        assert_eq!("ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!(" Base ".parse::<Chain>().unwrap(), Chain::Base);
        assert!("dogecoin".parse::<Chain>().is_err());
    }

    #[test]
    fn test_chain_wire_format() {
        assert_eq!(serde_json::to_string(&Chain::Arbitrum).unwrap(), "\"arbitrum\"");
        let chain: Chain = serde_json::from_str("\"ton\"").unwrap();
        assert_eq!(chain, Chain::Ton);
        assert!(!Chain::Solana.is_evm());
    }

    #[test]
    fn test_resolve_paths() {
        let config = ShieldConfig::with_api_url("https://api.example.com/");
        assert_eq!(
            config.resolve("/shield/status/me"),
            "https://api.example.com/api/v1/shield/status/me"
        );
        assert_eq!(
            config.resolve("shield/status/me"),
            "https://api.example.com/api/v1/shield/status/me"
        );
        assert_eq!(
            config.resolve("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ShieldConfig::with_api_url("http://localhost:8000").validate().is_ok());
        assert!(ShieldConfig::with_api_url("localhost:8000/api").validate().is_err());
        assert!(ShieldConfig::with_api_url("ftp://example.com").validate().is_err());
    }
}
