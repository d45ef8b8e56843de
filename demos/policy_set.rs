//! Policy set example
//!
//! This example demonstrates:
//! - Configuring the engine from YAML
//! - Installing several policies at once
//! - Reporting conflicts between policies
//! - Running every policy in dependency order

use warden_sdk::{EngineConfig, FactSnapshot, PolicyEngineBuilder};

const CONFIG: &str = r#"
strict_metrics: false
known_metrics: [resource, cost_usd, toxicity, tokens, pii_detected]
"#;

const POLICIES: &str = r#"
policy safety {
    mode: ENFORCE;
    category: SAFETY;
    clause toxic: toxicity > 0.9 -> BLOCK("toxic output") halt;
}

policy privacy {
    mode: ENFORCE;
    category: PRIVACY;
    clause pii: pii_detected == true -> REQUIRE_APPROVAL("contains personal data");
}

policy budget {
    mode: ENFORCE;
    category: OPERATIONAL;
    scope: { resource: "llm" };
    clause hard_cap: cost_usd > 1000 -> BLOCK("over hard cap") halt;
}

policy open_llm {
    category: ROUTING;
    scope: { resource: "llm" };
    depends_on: [budget];
    clause anything: true -> ALLOW;
}
"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("warden_sdk=info".parse()?),
        )
        .init();

    println!("=== Policy Set Example ===\n");

    let engine = PolicyEngineBuilder::new()
        .with_config(EngineConfig::from_yaml(CONFIG)?)
        .add_source(POLICIES)
        .build()?;

    for ir in engine.policies() {
        println!("installed {} ({})", ir.policy_id, &ir.ir_hash[..12]);
    }

    println!("\nConflicts:");
    for conflict in engine.conflicts() {
        println!("  [{}] {}", conflict.conflict_type, conflict.explanation);
    }

    let requests = [
        r#"{"resource": "llm", "cost_usd": 12, "toxicity": 0.1, "pii_detected": false}"#,
        r#"{"resource": "llm", "cost_usd": 12, "toxicity": 0.2, "pii_detected": true}"#,
        r#"{"resource": "llm", "cost_usd": 4000, "toxicity": 0.1, "pii_detected": false}"#,
        r#"{"resource": "search", "toxicity": 0.95}"#,
    ];

    for (i, request) in requests.iter().enumerate() {
        let facts = FactSnapshot::from_json(request)?;
        let trace = engine.evaluate_all(&facts)?;
        println!("\nRequest {}: ran {:?}", i + 1, trace.executed_nodes());
        if let Some(node) = &trace.halted_at {
            println!("  halted at {}", node);
        }
        for intent in engine.intents(&trace) {
            println!(
                "  {} <- {}.{}",
                intent.intent_type, intent.payload.policy_id, intent.payload.clause_id
            );
        }
    }

    Ok(())
}
