//! Shield Analyzer - request/response operations of the dashboard
//!
//! Thin layer over the gateway: send the request, then hand the payload to
//! the normalizer so both analysis modes come back as a [`RiskAssessment`].

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::core::normalizer::{normalize_json, AnalysisMode};
use crate::models::errors::ShieldResult;
use crate::models::types::{
    ContractRequest, Receipt, ReceiptRequest, RiskAssessment, TransactionRequest,
};
use crate::providers::gateway::ShieldGateway;
use crate::utils::constants::{
    PATH_ANALYZE_CONTRACT, PATH_ANALYZE_TRANSACTION, PATH_GENERATE_RECEIPT,
};

#[derive(Clone)]
pub struct ShieldAnalyzer {
    gateway: Arc<ShieldGateway>,
}

impl ShieldAnalyzer {
    pub fn new(gateway: Arc<ShieldGateway>) -> Self {
        Self { gateway }
    }

    /// Assess an unsigned transaction before the user signs it
    pub async fn analyze_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ShieldResult<RiskAssessment> {
        info!("🔬 Analyzing transaction to {} on {}", request.to, request.chain);
        let raw: Value = self.gateway.post_json(PATH_ANALYZE_TRANSACTION, request).await?;
        let assessment = normalize_json(AnalysisMode::Transaction, &raw)?;
        info!(
            "{} Transaction risk {} ({})",
            assessment.risk_level.emoji(),
            assessment.risk_score,
            assessment.risk_level.as_str()
        );
        Ok(assessment)
    }

    /// Assess a contract address
    pub async fn analyze_contract(
        &self,
        request: &ContractRequest,
    ) -> ShieldResult<RiskAssessment> {
        info!("🔬 Analyzing contract {} on {}", request.address, request.chain);
        let raw: Value = self.gateway.post_json(PATH_ANALYZE_CONTRACT, request).await?;
        let assessment = normalize_json(AnalysisMode::Contract, &raw)?;
        info!(
            "{} Contract risk {} with {} red flags",
            assessment.risk_level.emoji(),
            assessment.risk_score,
            assessment.warnings.len()
        );
        Ok(assessment)
    }

    /// Human-readable receipt for a confirmed transaction
    pub async fn generate_receipt(&self, request: &ReceiptRequest) -> ShieldResult<Receipt> {
        info!("🧾 Generating receipt for {}", request.tx_hash);
        self.gateway.post_json(PATH_GENERATE_RECEIPT, request).await
    }
}
