pub mod compile;
pub mod decide;
pub mod digest;

use std::path::Path;

use anyhow::Context;
use authz_policy::{CompiledPolicy, DeploymentConfig};

/// Load and compile a deployment config.
pub(crate) fn load_compiled(config: &Path) -> anyhow::Result<(DeploymentConfig, CompiledPolicy)> {
    let deployment = DeploymentConfig::load(config)
        .with_context(|| format!("failed to load deployment config {}", config.display()))?;
    let compiled = deployment
        .compile()
        .with_context(|| format!("failed to compile {} deployment", deployment.mode))?;
    Ok((deployment, compiled))
}
