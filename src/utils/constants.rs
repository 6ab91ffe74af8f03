//! Constants Module - Single Source of Truth
//!
//! Endpoint paths, defaults and thresholds shared by the gateway, the
//! normalizer and the revoke engine. Nothing else hardcodes these.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "RusterShield";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = concat!("RusterShield/", env!("CARGO_PKG_VERSION"));

// ============================================
// API LOCATION
// ============================================

/// Environment variable holding the backend base URL
pub const ENV_API_URL: &str = "SHIELD_API_URL";

/// Environment variable holding the bearer token (CLI only)
pub const ENV_ACCESS_TOKEN: &str = "SHIELD_ACCESS_TOKEN";

/// Backend used when nothing is configured (local dev server)
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Fixed API-version prefix between base URL and endpoint path
pub const API_PREFIX: &str = "/api/v1";

// ============================================
// ENDPOINTS
// ============================================

pub const PATH_ANALYZE_TRANSACTION: &str = "/shield/analyze-transaction";
pub const PATH_ANALYZE_CONTRACT: &str = "/shield/analyze-contract";
pub const PATH_GENERATE_RECEIPT: &str = "/shield/generate-receipt";
pub const PATH_EMERGENCY_REVOKE: &str = "/shield/emergency-revoke";
pub const PATH_STATUS_ME: &str = "/shield/status/me";

// ============================================
// SCORING
// ============================================

/// Upper bound of risk and trust scores
pub const MAX_SCORE: u8 = 100;

/// Trust score assumed when contract analysis omits both scores
pub const DEFAULT_TRUST_SCORE: i64 = 50;

/// Scores at or above this are shown as danger
pub const DANGER_SCORE_THRESHOLD: u8 = 70;

/// Scores at or above this (and below danger) are shown as warning
pub const WARNING_SCORE_THRESHOLD: u8 = 40;

/// Risk threshold used for emergency-revoke scans unless overridden
pub const DEFAULT_REVOKE_THRESHOLD: u8 = 50;

// ============================================
// STATUS DEFAULTS
// ============================================

/// Shield score shown when the overview has nothing better
pub const DEFAULT_SHIELD_SCORE: u8 = 85;

/// Clamp an upstream integer score into `[0, 100]`
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, MAX_SCORE as i64) as u8
}
