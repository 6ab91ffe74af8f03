//! Emergency Revoke Session Engine
//!
//! One scan produces a [`RevokeSession`]: the approvals the wallet has
//! granted, the unsigned revoke transactions the backend prepared, and the
//! set of approvals the user has marked as revoked so far.
//!
//! ```text
//! engine:    Idle ──begin_scan──▶ Scanning ──finish_scan──▶ Scanned
//! approval:  Pending ──mark_revoked──▶ Revoked (terminal)
//! ```
//!
//! Marking is local bookkeeping only. Signing and submitting the revoke
//! transaction happens in the user's wallet, outside this crate.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::models::config::Chain;
use crate::models::errors::{ShieldError, ShieldResult};
use crate::models::types::{Approval, RevokeCandidate, RevokeScanRequest, RevokeScanResponse};
use crate::providers::gateway::ShieldGateway;
use crate::utils::constants::{MAX_SCORE, PATH_EMERGENCY_REVOKE};
use crate::utils::decoder::RevokeDecoder;
use crate::utils::validity::{ValidityScope, ValidityToken};

/// Local revoke state of one approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    Revoked,
}

/// Result of one scan plus the user's revoke progress against it
#[derive(Debug, Clone)]
pub struct RevokeSession {
    wallet: Address,
    chain: Chain,
    risk_threshold: u8,
    approvals: Vec<Approval>,
    candidates: Vec<RevokeCandidate>,
    revoked: BTreeSet<usize>,
    total_approvals: u64,
    total_at_risk_usd: String,
    ai_explanation: String,
    scanned_at: DateTime<Utc>,
}

impl RevokeSession {
    /// Run one emergency-revoke scan and open a fresh session from it.
    ///
    /// Exactly one POST is made. Nothing is carried over from any earlier
    /// session.
    pub async fn start_scan(
        gateway: &ShieldGateway,
        wallet: Address,
        chain: Chain,
        risk_threshold: u8,
    ) -> ShieldResult<Self> {
        validate_threshold(risk_threshold)?;
        if !chain.is_evm() {
            warn!("⚠️ {} has no ERC-20 approvals, scan will likely be empty", chain.name());
        }

        info!("🚨 Scanning approvals of {} on {}", wallet, chain);
        let request = RevokeScanRequest {
            wallet_address: wallet,
            chain,
            risk_threshold,
        };
        let response: RevokeScanResponse =
            gateway.post_json(PATH_EMERGENCY_REVOKE, &request).await?;

        let session = Self::from_response(wallet, chain, risk_threshold, response);
        info!(
            "🔍 {} approvals, {} risky, {} revoke txs prepared",
            session.approvals.len(),
            session.risky_count(),
            session.candidates.len()
        );
        Ok(session)
    }

    /// Open a session from an already decoded scan response
    pub fn from_response(
        wallet: Address,
        chain: Chain,
        risk_threshold: u8,
        response: RevokeScanResponse,
    ) -> Self {
        Self {
            wallet,
            chain,
            risk_threshold,
            total_approvals: response.total_approvals,
            approvals: response.approvals,
            candidates: response.revoke_txs,
            revoked: BTreeSet::new(),
            total_at_risk_usd: response.total_at_risk_usd,
            ai_explanation: response.ai_explanation,
            scanned_at: Utc::now(),
        }
    }

    /// Record that the user revoked approval `index`.
    ///
    /// Returns `true` when newly marked, `false` when it already was.
    pub fn mark_revoked(&mut self, index: usize) -> ShieldResult<bool> {
        if index >= self.approvals.len() {
            return Err(ShieldError::index_out_of_range(index, self.approvals.len()));
        }
        let inserted = self.revoked.insert(index);
        if inserted {
            debug!("✂️ Approval #{} marked revoked", index);
        }
        Ok(inserted)
    }

    pub fn wallet(&self) -> Address {
        self.wallet
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn risk_threshold(&self) -> u8 {
        self.risk_threshold
    }

    pub fn approvals(&self) -> &[Approval] {
        &self.approvals
    }

    pub fn candidates(&self) -> &[RevokeCandidate] {
        &self.candidates
    }

    pub fn revoked_indices(&self) -> &BTreeSet<usize> {
        &self.revoked
    }

    /// Approval count as reported by the server
    pub fn total_approvals(&self) -> u64 {
        self.total_approvals
    }

    pub fn total_at_risk_usd(&self) -> &str {
        &self.total_at_risk_usd
    }

    pub fn ai_explanation(&self) -> Option<&str> {
        Some(self.ai_explanation.trim()).filter(|s| !s.is_empty())
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    pub fn is_risky(&self, index: usize) -> bool {
        self.approvals
            .get(index)
            .is_some_and(|a| a.risk_score >= self.risk_threshold)
    }

    pub fn risky_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.approvals.len()).filter(|&i| self.is_risky(i))
    }

    pub fn risky_count(&self) -> usize {
        self.risky_indices().count()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    pub fn pending_count(&self) -> usize {
        self.approvals.len() - self.revoked.len()
    }

    pub fn approval_state(&self, index: usize) -> Option<ApprovalState> {
        if index >= self.approvals.len() {
            None
        } else if self.revoked.contains(&index) {
            Some(ApprovalState::Revoked)
        } else {
            Some(ApprovalState::Pending)
        }
    }

    /// True once every risky approval has been marked
    pub fn all_risky_revoked(&self) -> bool {
        self.risky_indices().all(|i| self.revoked.contains(&i))
    }

    /// The prepared transaction that zeroes approval `index`, if any
    pub fn candidate_for(&self, index: usize) -> Option<&RevokeCandidate> {
        let approval = self.approvals.get(index)?;
        self.candidates
            .iter()
            .find(|candidate| RevokeDecoder::is_revoke_of(candidate, approval))
    }
}

fn validate_threshold(risk_threshold: u8) -> ShieldResult<()> {
    if risk_threshold > MAX_SCORE {
        return Err(ShieldError::validation(format!(
            "Risk threshold must be between 0 and {}, got {}",
            MAX_SCORE, risk_threshold
        )));
    }
    Ok(())
}

/// Where the engine is in its scan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Scanned,
}

/// What happened to a finished scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Applied,
    Discarded,
}

/// Revoke workflow state for one view.
///
/// Scans do not cancel each other: when two overlap, whichever finishes
/// last is what the view shows. Only [`RevokeEngine::teardown`] makes
/// in-flight results stale.
#[derive(Debug, Default)]
pub struct RevokeEngine {
    scope: ValidityScope,
    session: Option<RevokeSession>,
    in_flight: usize,
}

impl RevokeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ScanPhase {
        if self.in_flight > 0 {
            ScanPhase::Scanning
        } else if self.session.is_some() {
            ScanPhase::Scanned
        } else {
            ScanPhase::Idle
        }
    }

    pub fn session(&self) -> Option<&RevokeSession> {
        self.session.as_ref()
    }

    /// Enter `Scanning`. The shown session is cleared right away.
    pub fn begin_scan(&mut self) -> ValidityToken {
        self.session = None;
        self.in_flight += 1;
        self.scope.token()
    }

    /// Apply the outcome of a scan started with [`RevokeEngine::begin_scan`]
    pub fn finish_scan(
        &mut self,
        token: ValidityToken,
        result: ShieldResult<RevokeSession>,
    ) -> ShieldResult<ScanOutcome> {
        if !token.is_valid() {
            debug!("🗑️ Scan finished after teardown, dropping it");
            return Ok(ScanOutcome::Discarded);
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        let session = result?;
        self.session = Some(session);
        Ok(ScanOutcome::Applied)
    }

    /// begin → scan → finish, for callers that await inline
    pub async fn scan(
        &mut self,
        gateway: &ShieldGateway,
        wallet: Address,
        chain: Chain,
        risk_threshold: u8,
    ) -> ShieldResult<ScanOutcome> {
        let token = self.begin_scan();
        let result = RevokeSession::start_scan(gateway, wallet, chain, risk_threshold).await;
        self.finish_scan(token, result)
    }

    pub fn mark_revoked(&mut self, index: usize) -> ShieldResult<bool> {
        self.session
            .as_mut()
            .ok_or_else(ShieldError::no_active_session)?
            .mark_revoked(index)
    }

    /// Drop everything and make outstanding scans stale
    pub fn teardown(&mut self) {
        self.scope.invalidate();
        self.session = None;
        self.in_flight = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ShieldConfig;
    use crate::models::errors::ErrorCode;
    use crate::providers::credentials::NoCredentials;
    use serde_json::json;
    use std::str::FromStr;
    use std::sync::Arc;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const SPENDER_A: &str = "0x1111111254EEB25477B68fb85Ed929f73A960582";
    const SPENDER_B: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";

    fn wallet() -> Address {
        Address::from_str(WALLET).unwrap()
    }

    fn approval(token: &str, spender: &str, score: i64) -> serde_json::Value {
        json!({
            "token_address": token,
            "token_name": "TKN",
            "spender": spender,
            "spender_name": null,
            "amount": "1000",
            "is_unlimited": false,
            "risk_score": score
        })
    }

    fn response(scores: &[i64]) -> RevokeScanResponse {
        let approvals: Vec<_> = scores
            .iter()
            .map(|&s| approval(USDT, SPENDER_A, s))
            .collect();
        serde_json::from_value(json!({
            "total_approvals": scores.len(),
            "risky_approvals": 0,
            "total_at_risk_usd": "$1,200",
            "approvals": approvals,
            "revoke_txs": [],
            "ai_explanation": ""
        }))
        .unwrap()
    }

    fn session(scores: &[i64]) -> RevokeSession {
        RevokeSession::from_response(wallet(), Chain::Ethereum, 50, response(scores))
    }

    #[test]
    fn test_risky_count_uses_scan_threshold() {
        let s = session(&[80, 30, 60]);
        assert_eq!(s.risky_count(), 2);
        assert!(s.is_risky(0));
        assert!(!s.is_risky(1));
        assert!(s.is_risky(2));
        assert!(!s.is_risky(3));
    }

    #[test]
    fn test_session_keeps_scan_parameters() {
        let before = Utc::now();
        let s = RevokeSession::from_response(wallet(), Chain::Base, 65, response(&[80, 30]));

        assert_eq!(s.wallet(), wallet());
        assert_eq!(s.chain(), Chain::Base);
        assert_eq!(s.risk_threshold(), 65);
        assert_eq!(s.total_approvals(), 2);
        assert_eq!(s.total_at_risk_usd(), "$1,200");
        assert!(s.candidates().is_empty());
        assert!(s.scanned_at() >= before && s.scanned_at() <= Utc::now());
        assert_eq!(s.risky_count(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let s = session(&[50, 49]);
        assert_eq!(s.risky_count(), 1);
    }

    #[test]
    fn test_mark_revoked_is_idempotent() {
        let mut s = session(&[80, 30, 60]);
        assert!(s.mark_revoked(0).unwrap());
        assert!(!s.mark_revoked(0).unwrap());
        assert_eq!(s.revoked_count(), 1);
        assert_eq!(s.pending_count(), 2);
        assert_eq!(s.approval_state(0), Some(ApprovalState::Revoked));
        assert_eq!(s.approval_state(1), Some(ApprovalState::Pending));
        assert_eq!(s.approval_state(3), None);
    }

    #[test]
    fn test_mark_out_of_range_fails() {
        let mut s = session(&[80, 30, 60]);
        let err = s.mark_revoked(3).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionIndexOutOfRange);
        assert!(s.revoked_indices().is_empty());

        let mut empty = session(&[]);
        assert!(empty.mark_revoked(0).is_err());
    }

    #[test]
    fn test_all_risky_revoked() {
        let mut s = session(&[80, 30, 60]);
        assert!(!s.all_risky_revoked());
        s.mark_revoked(0).unwrap();
        s.mark_revoked(2).unwrap();
        assert!(s.all_risky_revoked());
        assert!(session(&[10]).all_risky_revoked());
    }

    #[test]
    fn test_candidate_for_matches_token_and_spender() {
        let revoke_b = RevokeDecoder::encode_revoke(Address::from_str(SPENDER_B).unwrap());
        let revoke_a = RevokeDecoder::encode_revoke(Address::from_str(SPENDER_A).unwrap());
        let response: RevokeScanResponse = serde_json::from_value(json!({
            "approvals": [
                approval(USDT, SPENDER_A, 90),
                approval(USDC, SPENDER_B, 75),
                approval(USDC, SPENDER_A, 10)
            ],
            "revoke_txs": [
                {"to": USDC, "data": revoke_b.to_string(), "description": "Revoke 0x7a250d56… from TKN"},
                {"to": USDT, "data": revoke_a.to_string(), "description": "Revoke 0x11111112… from TKN"}
            ]
        }))
        .unwrap();
        let s = RevokeSession::from_response(wallet(), Chain::Ethereum, 50, response);

        assert_eq!(s.candidate_for(0).unwrap().to, USDT);
        assert_eq!(s.candidate_for(1).unwrap().to, USDC);
        assert!(s.candidate_for(2).is_none());
        assert!(s.candidate_for(9).is_none());
        assert_eq!(s.total_at_risk_usd(), "$0");
        assert!(s.ai_explanation().is_none());
    }

    #[tokio::test]
    async fn test_threshold_above_max_rejected_before_request() {
        // nothing listens on this port; a request would fail as Transport
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let gateway = ShieldGateway::new(
            ShieldConfig::with_api_url(format!("http://127.0.0.1:{}", port)),
            Arc::new(NoCredentials),
        )
        .unwrap();

        let err = RevokeSession::start_scan(&gateway, wallet(), Chain::Ethereum, 101)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[test]
    fn test_engine_requires_session_to_mark() {
        let mut engine = RevokeEngine::new();
        assert_eq!(engine.phase(), ScanPhase::Idle);
        let err = engine.mark_revoked(0).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoActiveSession);
    }

    #[test]
    fn test_engine_new_scan_starts_clean() {
        let mut engine = RevokeEngine::new();

        let token = engine.begin_scan();
        assert_eq!(engine.phase(), ScanPhase::Scanning);
        engine.finish_scan(token, Ok(session(&[80, 30, 60]))).unwrap();
        assert_eq!(engine.phase(), ScanPhase::Scanned);
        engine.mark_revoked(0).unwrap();
        engine.mark_revoked(2).unwrap();
        assert_eq!(engine.session().unwrap().revoked_count(), 2);

        let token = engine.begin_scan();
        assert!(engine.session().is_none());
        engine.finish_scan(token, Ok(session(&[80, 30, 60]))).unwrap();
        assert!(engine.session().unwrap().revoked_indices().is_empty());
    }

    #[test]
    fn test_engine_last_finished_scan_wins() {
        let mut engine = RevokeEngine::new();
        let first = engine.begin_scan();
        let second = engine.begin_scan();

        let outcome = engine.finish_scan(second, Ok(session(&[90]))).unwrap();
        assert_eq!(outcome, ScanOutcome::Applied);
        assert_eq!(engine.phase(), ScanPhase::Scanning);

        let outcome = engine.finish_scan(first, Ok(session(&[10, 20]))).unwrap();
        assert_eq!(outcome, ScanOutcome::Applied);
        assert_eq!(engine.phase(), ScanPhase::Scanned);
        assert_eq!(engine.session().unwrap().approvals().len(), 2);
    }

    #[test]
    fn test_engine_discards_after_teardown() {
        let mut engine = RevokeEngine::new();
        let token = engine.begin_scan();
        engine.teardown();

        let outcome = engine.finish_scan(token, Ok(session(&[80]))).unwrap();
        assert_eq!(outcome, ScanOutcome::Discarded);
        assert!(engine.session().is_none());
        assert_eq!(engine.phase(), ScanPhase::Idle);

        let token = engine.begin_scan();
        engine.teardown();
        let outcome = engine
            .finish_scan(token, Err(ShieldError::transport("Connection failed")))
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Discarded);
    }

    #[test]
    fn test_engine_surfaces_scan_failure() {
        let mut engine = RevokeEngine::new();
        let token = engine.begin_scan();
        let err = engine
            .finish_scan(token, Err(ShieldError::from_response(500, b"{}")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed (500)");
        assert_eq!(engine.phase(), ScanPhase::Idle);
    }
}
