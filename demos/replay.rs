//! Replay example
//!
//! This example demonstrates:
//! - Persisting compiled IR keyed by its hash
//! - Replaying a past decision from stored IR and facts alone
//! - Rejecting stored IR that was altered after compilation

use std::collections::HashMap;
use warden_sdk::{FactSnapshot, PolicyEngine, PolicyIr, SdkError};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Replay Example ===\n");

    // Stand-in for an external IR store
    let mut store: HashMap<String, String> = HashMap::new();

    let live = PolicyEngine::default();
    let report = live.install_source(
        r#"policy p1 { mode: ENFORCE; clause c1: cost_usd > 100 -> BLOCK("over budget") }"#,
    )?;
    if let Some(ir) = live.policy(&report.ir_hash) {
        store.insert(report.ir_hash.clone(), ir.to_canonical_json()?);
    }

    let facts = FactSnapshot::from_json(r#"{"cost_usd": 150}"#)?;
    let decision = live.decide(&report.ir_hash, &facts)?;
    println!("Live decision: {} intent(s)", decision.intents.len());

    // Later, somewhere else: only the stored IR and the facts are available
    let stored = store
        .get(&report.ir_hash)
        .ok_or_else(|| anyhow::anyhow!("IR {} not in store", report.ir_hash))?;
    let ir = PolicyIr::from_json(stored)?;
    let replayed = PolicyEngine::default().replay(&ir, &facts)?;
    println!(
        "Replayed decision matches: {}",
        replayed == decision.evaluation
    );

    // Altered IR is refused
    let tampered = PolicyIr::from_json(&stored.replace("100.0", "1000.0"))?;
    match PolicyEngine::default().replay(&tampered, &facts) {
        Err(SdkError::Runtime(e)) => println!("Tampered IR rejected: {}", e),
        Err(e) => return Err(e.into()),
        Ok(_) => anyhow::bail!("tampered IR was accepted"),
    }

    Ok(())
}
