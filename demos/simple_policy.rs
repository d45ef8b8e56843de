//! Simple policy example
//!
//! This example demonstrates:
//! - Compiling one policy from source text
//! - Inspecting the compiled IR and its content hash
//! - Evaluating the policy and turning the result into intents

use warden_compiler::Compiler;
use warden_parser::{parse_policy, to_dsl};
use warden_runtime::{evaluate, FactSnapshot, IntentEmitter};

const SOURCE: &str = r#"
policy spend_guard {
    version: "2";
    mode: ENFORCE;
    category: OPERATIONAL;
    clause hard_cap: cost_usd > 100 -> BLOCK("cost above 100 USD");
    clause heavy: tokens >= 50000 AND model == "large" -> REQUIRE_APPROVAL, WARN("heavy request");
}
"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("warden_runtime=debug".parse()?),
        )
        .init();

    println!("=== Simple Policy Example ===\n");

    let ast = parse_policy(SOURCE)?;
    println!("Normalized source:\n{}", to_dsl(&ast));

    let compilation = Compiler::new().compile(&ast)?;
    for warning in &compilation.warnings {
        println!("warning: {}", warning);
    }
    for diagnostic in &compilation.diagnostics {
        println!("optimizer: {}", diagnostic);
    }

    let ir = compilation.ir;
    println!("IR hash: {}", ir.ir_hash);
    println!("Instructions: {}", ir.instruction_count());
    println!("{}\n", serde_json::to_string_pretty(&ir)?);

    let facts = FactSnapshot::from_json(r#"{"cost_usd": 42.5, "tokens": 64000, "model": "large"}"#)?;
    let result = evaluate(&ir, &facts)?;
    println!("Matched clauses: {:?}", result.matched_clauses());

    for intent in IntentEmitter::new().emit(&result) {
        println!(
            "  {} from {}.{} (advisory: {}){}",
            intent.intent_type,
            intent.payload.policy_id,
            intent.payload.clause_id,
            intent.payload.advisory,
            intent
                .payload
                .message
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );
    }

    Ok(())
}
