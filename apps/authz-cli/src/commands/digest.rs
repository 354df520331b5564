// digest.rs - Print the SHA-256 digest of a deployment's compiled artifact.

use std::path::Path;

use authz_policy::CompiledPolicy;

pub fn execute(config: &Path) -> anyhow::Result<()> {
    let (deployment, compiled) = super::load_compiled(config)?;
    match compiled {
        CompiledPolicy::Artifact(artifact) => {
            println!("{}", artifact.digest());
            Ok(())
        }
        CompiledPolicy::Open | CompiledPolicy::Custom(_) => {
            anyhow::bail!("{} deployments compile to no artifact", deployment.mode)
        }
    }
}
