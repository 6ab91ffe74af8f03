//! Status Aggregator
//!
//! Builds the overview snapshot from GET /shield/status/me. Field-level
//! defaults apply to whatever the server leaves out, and malformed feed
//! entries are dropped one by one instead of failing the whole snapshot.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::errors::{ShieldError, ShieldResult};
use crate::models::types::{ShieldEvent, ShieldStatusSnapshot};
use crate::providers::gateway::ShieldGateway;
use crate::utils::constants::{clamp_score, PATH_STATUS_ME};

/// Fetches and shapes the overview snapshot
#[derive(Clone)]
pub struct StatusAggregator {
    gateway: Arc<ShieldGateway>,
}

impl StatusAggregator {
    pub fn new(gateway: Arc<ShieldGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch the snapshot. Request failures propagate.
    pub async fn fetch_status(&self) -> ShieldResult<ShieldStatusSnapshot> {
        let raw = self.gateway.get_json::<Value>(PATH_STATUS_ME).await?;
        shape_snapshot(&raw)
    }

    /// Fetch the snapshot, falling back to the empty one on any failure
    pub async fn fetch_status_or_default(&self) -> ShieldStatusSnapshot {
        match self.fetch_status().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("⚠️ Status unavailable [{}]: {}, showing defaults", e.code_str(), e);
                ShieldStatusSnapshot::default()
            }
        }
    }
}

/// Turn a raw status body into a snapshot with defaults applied.
///
/// `null` is treated as an empty object. Anything else that is not an
/// object is a decode error.
pub fn shape_snapshot(raw: &Value) -> ShieldResult<ShieldStatusSnapshot> {
    let empty = serde_json::Map::new();
    let fields = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(ShieldError::decode("Status response is not an object")),
    };

    let defaults = ShieldStatusSnapshot::default();
    let counter = |name: &str, fallback: u64| {
        fields
            .get(name)
            .and_then(Value::as_u64)
            .unwrap_or(fallback)
    };

    let shield_score = fields
        .get("shield_score")
        .and_then(Value::as_i64)
        .map(clamp_score)
        .unwrap_or(defaults.shield_score);

    let mut recent_events: Vec<ShieldEvent> = fields
        .get("recent_events")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(decode_event).collect())
        .unwrap_or_default();
    // stable, so equal timestamps keep server order
    recent_events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let snapshot = ShieldStatusSnapshot {
        shield_score,
        transactions_analyzed: counter("transactions_analyzed", defaults.transactions_analyzed),
        threats_blocked: counter("threats_blocked", defaults.threats_blocked),
        receipts_generated: counter("receipts_generated", defaults.receipts_generated),
        recent_events,
    };
    debug!(
        "📊 Shield score {} with {} recent events",
        snapshot.shield_score,
        snapshot.recent_events.len()
    );
    Ok(snapshot)
}

fn decode_event(entry: &Value) -> Option<ShieldEvent> {
    match serde_json::from_value::<ShieldEvent>(entry.clone()) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("⚠️ Skipping malformed status event: {}", e);
            None
        }
    }
}
