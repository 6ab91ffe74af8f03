//! Ruster Shield - command-line front end for the Shield API
//!
//! Analyze a transaction or contract before signing, fetch a readable
//! receipt, scan a wallet for risky approvals, or show the overview.
//! The bearer token is read from SHIELD_ACCESS_TOKEN on every request.

use alloy_primitives::{Address, Bytes, B256};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ruster_shield::models::truncate_address;
use ruster_shield::utils::{APP_NAME, APP_VERSION, DEFAULT_REVOKE_THRESHOLD};
use ruster_shield::{
    ApprovalState, Chain, ContractRequest, EnvCredentials, ReceiptRequest, RevokeEngine,
    RiskAssessment, ShieldAnalyzer, ShieldConfig, ShieldGateway, StatusAggregator,
    TransactionRequest,
};

/// ruster_shield - transaction safety checks from the terminal
#[derive(Parser, Debug)]
#[command(name = "ruster_shield")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides SHIELD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assess an unsigned transaction
    AnalyzeTx {
        /// Destination address
        #[arg(long)]
        to: Address,

        /// Hex calldata
        #[arg(long)]
        data: Option<Bytes>,

        /// Value in wei
        #[arg(long)]
        value: Option<String>,

        #[arg(long, default_value = "ethereum")]
        chain: Chain,
    },

    /// Assess a contract address
    AnalyzeContract {
        address: Address,

        #[arg(long, default_value = "ethereum")]
        chain: Chain,
    },

    /// Generate a human-readable receipt
    Receipt {
        tx_hash: B256,

        #[arg(long, default_value = "ethereum")]
        chain: Chain,

        /// Directory to save the SVG card into
        #[arg(long)]
        svg_out: Option<PathBuf>,
    },

    /// Scan a wallet for risky token approvals
    Revoke {
        wallet: Address,

        #[arg(long, default_value = "ethereum")]
        chain: Chain,

        /// Approvals scoring at or above this are risky (0-100)
        #[arg(long, default_value_t = DEFAULT_REVOKE_THRESHOLD)]
        threshold: u8,

        /// Indices already revoked in the wallet, comma separated
        #[arg(long, value_delimiter = ',')]
        revoked: Vec<usize>,
    },

    /// Show the overview counters and recent activity
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let cli = Cli::parse();
    info!("🛡️ {} v{}", APP_NAME, APP_VERSION);

    let config = match cli.api_url {
        Some(url) => {
            let config = ShieldConfig::with_api_url(url);
            config.validate()?;
            config
        }
        None => ShieldConfig::from_env()?,
    };
    let gateway = Arc::new(ShieldGateway::new(config, Arc::new(EnvCredentials::default()))?);

    match cli.command {
        Commands::AnalyzeTx {
            to,
            data,
            value,
            chain,
        } => {
            let mut request = TransactionRequest::new(to, chain);
            if let Some(data) = data {
                request = request.with_data(data);
            }
            if let Some(value) = value {
                request = request.with_value(value);
            }
            let assessment = ShieldAnalyzer::new(gateway)
                .analyze_transaction(&request)
                .await?;
            print_assessment(&assessment);
        }

        Commands::AnalyzeContract { address, chain } => {
            let assessment = ShieldAnalyzer::new(gateway)
                .analyze_contract(&ContractRequest { address, chain })
                .await?;
            print_assessment(&assessment);
            if let Some(profile) = &assessment.contract {
                println!(
                    "   Verified: {}   Known scam: {}",
                    if profile.is_verified { "yes" } else { "no" },
                    if profile.is_known_scam { "YES" } else { "no" }
                );
            }
        }

        Commands::Receipt {
            tx_hash,
            chain,
            svg_out,
        } => {
            let receipt = ShieldAnalyzer::new(gateway)
                .generate_receipt(&ReceiptRequest { tx_hash, chain })
                .await?;

            println!("\n🧾 {}", receipt.action_summary);
            if let Some(cost) = &receipt.cost_breakdown {
                println!("   Gas:   {} ETH ({})", cost.gas_eth, cost.gas_usd);
                println!("   Value: {} ETH ({})", cost.value_eth, cost.value_usd);
                println!("   Total: {} ETH ({})", cost.total_eth, cost.total_usd);
            }
            for event in &receipt.events {
                println!("   • {} @ {}", event.name, truncate_address(&event.address, 4));
            }
            if !receipt.ai_summary.is_empty() {
                println!("\n   {}", receipt.ai_summary);
            }

            if let Some(dir) = svg_out {
                if receipt.has_card() {
                    let path = dir.join(receipt.svg_file_name());
                    std::fs::write(&path, &receipt.svg_card)
                        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
                    println!("   ✅ Card saved to: {}", path.display());
                } else {
                    warn!("⚠️ Receipt has no SVG card to save");
                }
            }
        }

        Commands::Revoke {
            wallet,
            chain,
            threshold,
            revoked,
        } => {
            let mut engine = RevokeEngine::new();
            engine.scan(&gateway, wallet, chain, threshold).await?;
            for index in revoked {
                engine.mark_revoked(index)?;
            }
            let Some(session) = engine.session() else {
                return Ok(());
            };

            println!(
                "\n🚨 Emergency revoke scan for {} on {} ({})",
                truncate_address(&session.wallet().to_string(), 4),
                session.chain().name(),
                session.scanned_at().format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!(
                "   Approvals: {} (server reported {})   Risky (>= {}): {}   At risk: {}",
                session.approvals().len(),
                session.total_approvals(),
                session.risk_threshold(),
                session.risky_count(),
                session.total_at_risk_usd()
            );
            for (index, approval) in session.approvals().iter().enumerate() {
                let state = match session.approval_state(index) {
                    Some(ApprovalState::Revoked) => "revoked",
                    _ if session.is_risky(index) => "RISKY",
                    _ => "ok",
                };
                println!(
                    "   [{}] {:>3}/100 {:<8} {} -> {}{}",
                    index,
                    approval.risk_score,
                    state,
                    approval.token_name,
                    approval.spender_label(),
                    if approval.is_unlimited { " (unlimited)" } else { "" }
                );
                let pending = session.approval_state(index) == Some(ApprovalState::Pending);
                if pending && session.is_risky(index) {
                    if let Some(candidate) = session.candidate_for(index) {
                        println!(
                            "        ↳ {} (to {}, data {})",
                            candidate.description, candidate.to, candidate.data
                        );
                    }
                }
            }
            if session.all_risky_revoked() {
                println!("\n   ✅ All risky approvals revoked");
            } else {
                println!(
                    "\n   {} revoked, {} pending",
                    session.revoked_count(),
                    session.pending_count()
                );
            }
            if let Some(explanation) = session.ai_explanation() {
                println!("\n   {}", explanation);
            }
        }

        Commands::Status => {
            let snapshot = StatusAggregator::new(gateway).fetch_status_or_default().await;
            println!("\n🛡️ Shield score: {}/100", snapshot.shield_score);
            println!("   Transactions analyzed: {}", snapshot.transactions_analyzed);
            println!("   Threats blocked:       {}", snapshot.threats_blocked);
            println!("   Receipts generated:    {}", snapshot.receipts_generated);

            if !snapshot.has_activity() {
                println!("\n   No activity yet");
            }
            for event in &snapshot.recent_events {
                println!(
                    "   {} {:<11} {:>3} {} {}",
                    event.created_at.format("%Y-%m-%d %H:%M"),
                    event.kind().label(),
                    event.risk_score,
                    event.chain,
                    truncate_address(&event.target_address, 4)
                );
            }
        }
    }

    Ok(())
}

fn print_assessment(assessment: &RiskAssessment) {
    println!();
    print!("{}", assessment.summary());
}
