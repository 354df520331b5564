// compile.rs - Compile a deployment config into its policy artifact.
//
// Private and org deployments print the artifact (rule source + data) as
// pretty JSON. Custom deployments echo their opaque policy; public
// deployments have nothing to compile and print their mode only.

use std::path::Path;

use anyhow::Context;
use authz_policy::CompiledPolicy;

pub fn execute(config: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let (deployment, compiled) = super::load_compiled(config)?;
    let rendered = render(&compiled)?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                mode = %deployment.mode,
                output = %path.display(),
                "compiled policy written"
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn render(compiled: &CompiledPolicy) -> anyhow::Result<String> {
    let json = match compiled {
        CompiledPolicy::Artifact(artifact) => artifact.to_json()?,
        CompiledPolicy::Custom(custom) => serde_json::to_string_pretty(custom)?,
        CompiledPolicy::Open => serde_json::to_string_pretty(&serde_json::json!({
            "mode": "public"
        }))?,
    };
    Ok(json)
}
