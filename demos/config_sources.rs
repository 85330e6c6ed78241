//! Configured Sources Example
//!
//! Builds a merged client from a TOML source list, bounded by the configured
//! initialization timeout. Set `FLAGMESH_CONFIG` to load your own file.

use flagmesh::flagmesh_config::{FileFormat, MeshConfig};
use flagmesh::prelude::*;

const SOURCES: &str = r#"
init_timeout_ms = 3000

[[sources]]
label = "Production"

[[sources.flags]]
key = "checkout-v2"
default_variation = false

[[sources.flags.targeting]]
variation = true

[[sources.flags.targeting.conditions]]
attribute = "email"
operator = "ends_with"
values = ["@company.com"]

[[sources]]
label = "Experiments"

[[sources.flags]]
key = "button-color"
default_variation = "red"
variations = ["red", "blue"]

[sources.flags.rollout]
percentage = 50
variation = "blue"
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    flagmesh::flagmesh_log::init()?;

    let config = match std::env::var("FLAGMESH_CONFIG") {
        Ok(_) => MeshConfig::from_env()?,
        Err(_) => MeshConfig::parse(SOURCES, FileFormat::Toml)?,
    };

    let flags = config.build_merged()?;
    match config.init_timeout() {
        Some(timeout) => flags.initialize_with_timeout(timeout).await?,
        None => flags.initialize().await?,
    }
    tracing::info!(sources = ?flags.labels(), "flag sources ready");

    for email in ["dev@company.com", "someone@example.com"] {
        let ctx = EvaluationContext::new(email).with_attribute("email", email);

        let checkout = flags.bool_variation("checkout-v2", &ctx, false).await?;
        let color = flags.string_variation("button-color", &ctx, "red").await?;
        println!("{email}: checkout-v2={checkout} button-color={color}");
    }

    Ok(())
}
