//! Result Normalizer
//!
//! The analysis service answers in two shapes. Transaction analysis already
//! looks like a [`RiskAssessment`]; contract analysis reports a trust score
//! and red flags instead. This module folds both into one value so the UI
//! renders them the same way.
//!
//! Contract-mode derivation:
//! - `risk_score = risk_score ?? (100 - (trust_score ?? 50))`, clamped to 0-100
//! - `risk_level = risk_level ?? medium`
//! - each red flag `{severity, message}` becomes a warning, order kept
//!
//! Everything here is a pure function of its input.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::models::errors::{ShieldError, ShieldResult};
use crate::models::types::{
    ContractProfile, RiskAssessment, RiskLevel, Severity, Simulation, Warning,
};
use crate::utils::constants::{clamp_score, DEFAULT_TRUST_SCORE, MAX_SCORE};

/// Which endpoint produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Transaction,
    Contract,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Transaction => "transaction",
            AnalysisMode::Contract => "contract",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transaction" | "tx" => Ok(Self::Transaction),
            "contract" => Ok(Self::Contract),
            other => Err(ShieldError::validation(format!("Unknown analysis mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawWarning {
    pub level: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRedFlag {
    pub severity: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawSimulation {
    pub success: bool,
    pub gas_used: u64,
    pub error: Option<String>,
}

/// Payload of /shield/analyze-transaction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransactionRaw {
    pub risk_score: Option<i64>,
    pub risk_level: Option<String>,
    pub trust_score: Option<i64>,
    pub warnings: Vec<RawWarning>,
    pub function_name: Option<String>,
    pub function_type: Option<String>,
    pub simulation: Option<RawSimulation>,
    pub ai_explanation: Option<String>,
}

/// Payload of /shield/analyze-contract
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContractRaw {
    pub risk_score: Option<i64>,
    pub risk_level: Option<String>,
    pub trust_score: Option<i64>,
    pub trust_level: Option<String>,
    pub red_flags: Vec<RawRedFlag>,
    pub address: Option<String>,
    pub chain: Option<String>,
    pub contract_name: Option<String>,
    pub contract_type: Option<String>,
    pub is_verified: bool,
    pub is_known_scam: bool,
    pub age_days: Option<u64>,
    pub tx_count: Option<u64>,
    pub ai_explanation: Option<String>,
}

/// Tagged upstream payload
#[derive(Debug, Clone, PartialEq)]
pub enum RawAnalysis {
    Transaction(TransactionRaw),
    Contract(ContractRaw),
}

impl RawAnalysis {
    /// Decode a JSON body according to the endpoint that produced it
    pub fn from_json(mode: AnalysisMode, raw: &Value) -> ShieldResult<Self> {
        if !raw.is_object() {
            return Err(ShieldError::decode(format!(
                "Expected a JSON object for {} analysis",
                mode
            )));
        }
        let parsed = match mode {
            AnalysisMode::Transaction => Self::Transaction(TransactionRaw::deserialize(raw)?),
            AnalysisMode::Contract => Self::Contract(ContractRaw::deserialize(raw)?),
        };
        Ok(parsed)
    }

    pub fn mode(&self) -> AnalysisMode {
        match self {
            RawAnalysis::Transaction(_) => AnalysisMode::Transaction,
            RawAnalysis::Contract(_) => AnalysisMode::Contract,
        }
    }
}

/// Fold either payload into the unified risk model
pub fn normalize(raw: &RawAnalysis) -> RiskAssessment {
    match raw {
        RawAnalysis::Transaction(tx) => normalize_transaction(tx),
        RawAnalysis::Contract(contract) => normalize_contract(contract),
    }
}

/// Decode + normalize in one step
pub fn normalize_json(mode: AnalysisMode, raw: &Value) -> ShieldResult<RiskAssessment> {
    RawAnalysis::from_json(mode, raw).map(|parsed| normalize(&parsed))
}

/// `risk ?? (100 - (trust ?? 50))`, clamped
pub fn derive_risk_score(risk_score: Option<i64>, trust_score: Option<i64>) -> u8 {
    let raw = risk_score.unwrap_or_else(|| {
        i64::from(MAX_SCORE) - trust_score.unwrap_or(DEFAULT_TRUST_SCORE)
    });
    clamp_score(raw)
}

fn derive_risk_level(label: Option<&str>) -> RiskLevel {
    label.and_then(RiskLevel::from_label).unwrap_or(RiskLevel::Medium)
}

fn normalize_transaction(tx: &TransactionRaw) -> RiskAssessment {
    RiskAssessment {
        risk_score: derive_risk_score(tx.risk_score, tx.trust_score),
        risk_level: derive_risk_level(tx.risk_level.as_deref()),
        trust_score: tx.trust_score.map(clamp_score),
        warnings: tx
            .warnings
            .iter()
            .map(|w| Warning {
                level: Severity::from_label(w.level.as_deref().unwrap_or_default()),
                message: w.message.clone(),
            })
            .collect(),
        function_name: non_empty(&tx.function_name),
        function_type: non_empty(&tx.function_type),
        simulation: tx.simulation.as_ref().map(|sim| Simulation {
            success: sim.success,
            gas_used: sim.gas_used,
            error: non_empty(&sim.error),
        }),
        ai_explanation: non_empty(&tx.ai_explanation),
        contract: None,
    }
}

fn normalize_contract(contract: &ContractRaw) -> RiskAssessment {
    RiskAssessment {
        risk_score: derive_risk_score(contract.risk_score, contract.trust_score),
        risk_level: derive_risk_level(contract.risk_level.as_deref()),
        trust_score: contract.trust_score.map(clamp_score),
        warnings: contract
            .red_flags
            .iter()
            .map(|flag| Warning {
                level: Severity::from_label(flag.severity.as_deref().unwrap_or_default()),
                message: flag.message.clone(),
            })
            .collect(),
        function_name: None,
        function_type: None,
        simulation: None,
        ai_explanation: non_empty(&contract.ai_explanation),
        contract: Some(ContractProfile {
            address: non_empty(&contract.address),
            chain: non_empty(&contract.chain),
            name: non_empty(&contract.contract_name),
            contract_type: non_empty(&contract.contract_type),
            trust_level: non_empty(&contract.trust_level),
            is_verified: contract.is_verified,
            is_known_scam: contract.is_known_scam,
            age_days: contract.age_days,
            tx_count: contract.tx_count,
        }),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_scenario_unverified_source() {
        let raw = json!({
            "trust_score": 30,
            "red_flags": [{"severity": "high", "message": "unverified source"}]
        });
        let assessment = normalize_json(AnalysisMode::Contract, &raw).unwrap();

        assert_eq!(assessment.risk_score, 70);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.trust_score, Some(30));
        assert_eq!(assessment.warnings.len(), 1);
        assert_eq!(assessment.warnings[0].level, Severity::High);
        assert_eq!(assessment.warnings[0].message, "unverified source");
    }

    #[test]
    fn test_contract_without_any_score_is_fifty() {
        let assessment = normalize_json(AnalysisMode::Contract, &json!({})).unwrap();
        assert_eq!(assessment.risk_score, 50);
        assert_eq!(assessment.trust_score, None);
        assert!(assessment.warnings.is_empty());
    }

    #[test]
    fn test_derived_score_is_clamped() {
        for trust in [-40_i64, 0, 1, 30, 99, 100, 180] {
            let expected = (100 - trust).clamp(0, 100) as u8;
            assert_eq!(derive_risk_score(None, Some(trust)), expected, "trust {}", trust);
        }
        assert_eq!(derive_risk_score(Some(250), Some(10)), 100);
        assert_eq!(derive_risk_score(Some(-3), None), 0);
    }

    #[test]
    fn test_upstream_risk_score_wins() {
        let raw = json!({"risk_score": 12, "risk_level": "low", "trust_score": 10});
        let assessment = normalize_json(AnalysisMode::Contract, &raw).unwrap();
        assert_eq!(assessment.risk_score, 12);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_red_flag_order_preserved() {
        let raw = json!({
            "trust_score": 5,
            "red_flags": [
                {"severity": "medium", "message": "a"},
                {"severity": "critical", "message": "b"},
                {"severity": "weird", "message": "c"}
            ]
        });
        let assessment = normalize_json(AnalysisMode::Contract, &raw).unwrap();
        let messages: Vec<&str> = assessment.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages, ["a", "b", "c"]);
        assert_eq!(assessment.warnings[2].level, Severity::Info);
        assert_eq!(assessment.worst_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_transaction_passthrough() {
        let raw = json!({
            "risk_score": 85,
            "risk_level": "critical",
            "risk_color": "#ef4444",
            "function_name": "approve",
            "function_type": "approval",
            "simulation": {"success": false, "gas_used": 46000, "error": "execution reverted"},
            "warnings": [{"level": "critical", "message": "This grants UNLIMITED token spending to the spender."}],
            "ai_explanation": ""
        });
        let assessment = normalize_json(AnalysisMode::Transaction, &raw).unwrap();

        assert_eq!(assessment.risk_score, 85);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.trust_score, None);
        assert_eq!(assessment.function_name.as_deref(), Some("approve"));
        let sim = assessment.simulation.as_ref().unwrap();
        assert!(!sim.success);
        assert_eq!(sim.gas_used, 46000);
        assert_eq!(sim.error.as_deref(), Some("execution reverted"));
        assert_eq!(assessment.ai_explanation, None);
        assert!(assessment.contract.is_none());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = json!({
            "trust_score": 42,
            "trust_level": "caution",
            "address": "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            "is_verified": true,
            "red_flags": [{"severity": "low", "message": "Very few transactions"}],
            "ai_explanation": "Looks like a router."
        });
        let first = normalize_json(AnalysisMode::Contract, &raw).unwrap();
        let second = normalize_json(AnalysisMode::Contract, &raw).unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_contract_profile_filled() {
        let raw = json!({
            "trust_score": 90,
            "trust_level": "highly_trusted",
            "contract_name": "UniswapV2Router02",
            "is_verified": true,
            "age_days": 1500,
            "tx_count": 1000000
        });
        let assessment = normalize_json(AnalysisMode::Contract, &raw).unwrap();
        let profile = assessment.contract.unwrap();
        assert_eq!(profile.name.as_deref(), Some("UniswapV2Router02"));
        assert_eq!(profile.trust_level.as_deref(), Some("highly_trusted"));
        assert!(profile.is_verified);
        assert_eq!(assessment.risk_score, 10);
    }

    #[test]
    fn test_non_object_is_decode_error() {
        let err = normalize_json(AnalysisMode::Transaction, &json!([1, 2])).unwrap_err();
        assert_eq!(err.code, crate::models::errors::ErrorCode::Decode);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("contract".parse::<AnalysisMode>().unwrap(), AnalysisMode::Contract);
        assert!("wallet".parse::<AnalysisMode>().is_err());
        let raw = RawAnalysis::Contract(ContractRaw::default());
        assert_eq!(raw.mode(), AnalysisMode::Contract);
    }
}
