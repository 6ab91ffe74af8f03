//! Type definitions for the Shield client
//! Requests sent to the analysis service and the typed values the UI renders

use alloy_primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::models::config::Chain;
use crate::utils::constants::{
    clamp_score, DANGER_SCORE_THRESHOLD, DEFAULT_SHIELD_SCORE, WARNING_SCORE_THRESHOLD,
};

// ============================================
// Risk classification
// ============================================

/// Risk level classification reported by the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Lenient parse of an upstream label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "none" => Some(Self::None),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::None => "✅",
            RiskLevel::Low => "🟡",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
            RiskLevel::Critical => "💀",
        }
    }
}

/// Coloring band for a 0-100 score
/// - 0-39: Safe
/// - 40-69: Warning
/// - 70-100: Danger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Safe,
    Warning,
    Danger,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        if score >= DANGER_SCORE_THRESHOLD {
            Self::Danger
        } else if score >= WARNING_SCORE_THRESHOLD {
            Self::Warning
        } else {
            Self::Safe
        }
    }
}

/// Severity of a single warning or red flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Unknown labels are treated as informational
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Unified risk model
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub level: Severity,
    pub message: String,
}

/// Outcome of the service-side dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub success: bool,
    pub gas_used: u64,
    pub error: Option<String>,
}

/// Contract facts only present in contract-mode analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractProfile {
    pub address: Option<String>,
    pub chain: Option<String>,
    pub name: Option<String>,
    pub contract_type: Option<String>,
    pub trust_level: Option<String>,
    pub is_verified: bool,
    pub is_known_scam: bool,
    pub age_days: Option<u64>,
    pub tx_count: Option<u64>,
}

/// The single shape the UI renders for both analysis modes.
/// `risk_score` is always populated, derived when upstream omitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub trust_score: Option<u8>,
    pub warnings: Vec<Warning>,
    pub function_name: Option<String>,
    pub function_type: Option<String>,
    pub simulation: Option<Simulation>,
    pub ai_explanation: Option<String>,
    pub contract: Option<ContractProfile>,
}

impl RiskAssessment {
    pub fn band(&self) -> RiskBand {
        RiskBand::from_score(self.risk_score)
    }

    /// Highest warning severity, if any warning exists
    pub fn worst_severity(&self) -> Option<Severity> {
        self.warnings.iter().map(|w| w.level).max()
    }

    /// Pretty print the assessment
    pub fn summary(&self) -> String {
        let mut output = format!(
            "{} Risk: {} ({}/100)\n",
            self.risk_level.emoji(),
            self.risk_level.as_str().to_uppercase(),
            self.risk_score
        );
        if let Some(trust) = self.trust_score {
            output.push_str(&format!("   Trust: {}/100\n", trust));
        }
        if let Some(ref function) = self.function_name {
            output.push_str(&format!("   Function: {}\n", function));
        }
        if let Some(ref sim) = self.simulation {
            if sim.success {
                output.push_str(&format!("   Simulation: passes, est. gas {}\n", sim.gas_used));
            } else {
                output.push_str(&format!(
                    "   Simulation: reverts, {}\n",
                    sim.error.as_deref().unwrap_or("Unknown error")
                ));
            }
        }
        if !self.warnings.is_empty() {
            output.push_str("   Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("     - [{}] {}\n", warning.level, warning.message));
            }
        }
        if let Some(ref explanation) = self.ai_explanation {
            output.push_str(&format!("   {}\n", explanation));
        }
        output
    }
}

// ============================================
// Emergency revoke
// ============================================

/// A token allowance found by a revoke scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub token_address: String,
    pub token_name: String,
    pub spender: String,
    #[serde(default)]
    pub spender_name: Option<String>,
    /// Decimal string, may exceed u128 for unlimited approvals
    pub amount: String,
    #[serde(default)]
    pub is_unlimited: bool,
    #[serde(deserialize_with = "de_score")]
    pub risk_score: u8,
}

impl Approval {
    /// Name shown for the spender, falling back to a shortened address
    pub fn spender_label(&self) -> String {
        match self.spender_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => truncate_address(&self.spender, 6),
        }
    }
}

/// Unsigned transaction template. The user signs and submits it elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeCandidate {
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub description: String,
}

/// Raw emergency-revoke response
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeScanResponse {
    #[serde(default)]
    pub total_approvals: u64,
    #[serde(default)]
    pub risky_approvals: u64,
    #[serde(default = "default_at_risk")]
    pub total_at_risk_usd: String,
    #[serde(default)]
    pub approvals: Vec<Approval>,
    #[serde(default)]
    pub revoke_txs: Vec<RevokeCandidate>,
    #[serde(default)]
    pub ai_explanation: String,
}

fn default_at_risk() -> String {
    "$0".to_string()
}

// ============================================
// Receipts
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub gas_eth: String,
    pub gas_usd: String,
    pub value_eth: String,
    pub value_usd: String,
    pub total_eth: String,
    pub total_usd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Human-readable receipt for a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub chain: String,
    pub action_summary: String,
    #[serde(default)]
    pub svg_card: String,
    #[serde(default)]
    pub cost_breakdown: Option<CostBreakdown>,
    #[serde(default)]
    pub events: Vec<ReceiptEvent>,
    #[serde(default)]
    pub ai_summary: String,
}

impl Receipt {
    /// File name used when saving the SVG card
    pub fn svg_file_name(&self) -> String {
        let prefix: String = self.tx_hash.chars().take(10).collect();
        format!("receipt-{}.svg", prefix)
    }

    pub fn has_card(&self) -> bool {
        !self.svg_card.trim().is_empty()
    }
}

// ============================================
// Overview status
// ============================================

/// Dashboard event categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Transaction,
    Contract,
    Receipt,
    Revoke,
    Other(String),
}

impl EventKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "tx_analysis" => Self::Transaction,
            "contract_analysis" => Self::Contract,
            "receipt" => Self::Receipt,
            "revoke" => Self::Revoke,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EventKind::Transaction => "Transaction",
            EventKind::Contract => "Contract",
            EventKind::Receipt => "Receipt",
            EventKind::Revoke => "Revoke",
            EventKind::Other(raw) => raw,
        }
    }
}

/// One entry of the recent-activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldEvent {
    pub id: String,
    pub event_type: String,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub target_address: String,
    #[serde(default, deserialize_with = "de_nullable_score")]
    pub risk_score: u8,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub chain: String,
    pub created_at: DateTime<Utc>,
}

impl ShieldEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_event_type(&self.event_type)
    }

    pub fn band(&self) -> RiskBand {
        RiskBand::from_score(self.risk_score)
    }
}

/// Overview counters plus the most-recent-first activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShieldStatusSnapshot {
    pub shield_score: u8,
    pub transactions_analyzed: u64,
    pub threats_blocked: u64,
    pub receipts_generated: u64,
    pub recent_events: Vec<ShieldEvent>,
}

impl Default for ShieldStatusSnapshot {
    fn default() -> Self {
        Self {
            shield_score: DEFAULT_SHIELD_SCORE,
            transactions_analyzed: 0,
            threats_blocked: 0,
            receipts_generated: 0,
            recent_events: Vec::new(),
        }
    }
}

impl ShieldStatusSnapshot {
    /// False renders the "No activity yet" state
    pub fn has_activity(&self) -> bool {
        !self.recent_events.is_empty()
    }
}

// ============================================
// Requests
// ============================================

/// Body of POST /shield/analyze-transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub chain: Chain,
}

impl TransactionRequest {
    pub fn new(to: Address, chain: Chain) -> Self {
        Self {
            to,
            data: None,
            value: None,
            chain,
        }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    /// Value in wei as a decimal string
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Body of POST /shield/analyze-contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractRequest {
    pub address: Address,
    pub chain: Chain,
}

/// Body of POST /shield/generate-receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptRequest {
    pub tx_hash: B256,
    pub chain: Chain,
}

/// Body of POST /shield/emergency-revoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokeScanRequest {
    pub wallet_address: Address,
    pub chain: Chain,
    pub risk_threshold: u8,
}

// ============================================
// Helpers
// ============================================

/// `0x1234ab…89cdef` style shortening for display
pub fn truncate_address(address: &str, chars: usize) -> String {
    if address.len() <= chars * 2 + 2 || !address.is_ascii() {
        return address.to_string();
    }
    format!(
        "{}…{}",
        &address[..chars + 2],
        &address[address.len() - chars..]
    )
}

fn de_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

fn de_nullable_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map(clamp_score).unwrap_or(0))
}

fn de_nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
