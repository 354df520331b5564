// decide.rs - Evaluate one request against a deployment.
//
// The input file is a DecisionInput as JSON:
//
//   {
//     "token": {"sub": "user_alice", "claims": {"roles": ["dev"]}},
//     "request": {"component": "backend"},
//     "mcp": {"method": "tools/call", "tool": "query"}
//   }
//
// Prints the decision (allow + deny reasons), or the full layer trace with
// --trace. Deny reasons are shown here because this is an operator tool.

use std::path::Path;

use anyhow::Context;
use authz_policy::{AuthzTables, DecisionEngine, DecisionInput, DecisionTrace};

pub fn execute(
    config: &Path,
    tables: Option<&Path>,
    input: &Path,
    trace: bool,
) -> anyhow::Result<()> {
    let result = evaluate(config, tables, input)?;
    let json = if trace {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.decision)?
    };
    println!("{}", json);
    Ok(())
}

fn evaluate(config: &Path, tables: Option<&Path>, input: &Path) -> anyhow::Result<DecisionTrace> {
    let (deployment, compiled) = super::load_compiled(config)?;

    let tables = match tables {
        Some(path) => AuthzTables::load(path)
            .with_context(|| format!("failed to load tables {}", path.display()))?,
        None => AuthzTables::default(),
    };

    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read input {}", input.display()))?;
    let input: DecisionInput = serde_json::from_str(&raw)
        .with_context(|| format!("invalid decision input {}", input.display()))?;

    let trace = DecisionEngine::new().decide_with_trace(
        compiled.artifact(),
        deployment.mode,
        &tables,
        &input,
    );
    tracing::debug!(allow = trace.decision.allow, steps = trace.steps.len(), "evaluated");
    Ok(trace)
}
