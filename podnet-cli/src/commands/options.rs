use anyhow::{Context, Result};

use podnet_options::build_attachment_options;

use crate::cli::SandboxArgs;
use crate::commands::load_sandbox;

/// Print the attachment options as JSON
pub async fn execute(args: &SandboxArgs) -> Result<()> {
    let (id, sandbox) = load_sandbox(args).await?;

    let options = build_attachment_options(id.as_str(), &sandbox)
        .context("Failed to build attachment options")?;
    let json = options.to_json().context("Failed to render options")?;

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
