//! Ruster Shield Library
//!
//! Client core for the Shield transaction-safety service:
//! - Authenticated gateway to the analysis API
//! - One risk model for transaction and contract analysis
//! - Emergency revoke workflow with per-approval tracking
//! - Overview status with safe defaults

pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    normalize, normalize_json, AnalysisMode, ApprovalState, RawAnalysis, RevokeEngine,
    RevokeSession, ScanOutcome, ScanPhase, ShieldAnalyzer, StatusAggregator,
};
pub use models::{
    Approval, Chain, ContractRequest, ErrorCode, Receipt, ReceiptRequest, RevokeCandidate,
    RiskAssessment, RiskBand, RiskLevel, Severity, ShieldConfig, ShieldError, ShieldEvent,
    ShieldResult, ShieldStatusSnapshot, TransactionRequest, Warning,
};
pub use providers::{
    CredentialProvider, EnvCredentials, NoCredentials, SessionCredential, ShieldGateway,
    StaticCredentials,
};
pub use utils::{RevokeDecoder, ValidityScope, ValidityToken};
