//! Namespaced Client Example
//!
//! Clients kept side by side and addressed by project. There is no
//! fallthrough: the caller says which project owns each flag.

use flagmesh::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    flagmesh::flagmesh_log::init()?;

    println!("\n=== Namespaced Client Example ===\n");

    let flags = NamespacedFlagClient::new()
        .with_client(
            "project-a",
            Arc::new(InMemoryFlagClient::new().with_flag(FeatureFlag::boolean("flag-a", true))),
        )
        .with_client(
            "project-b",
            Arc::new(InMemoryFlagClient::new().with_flag(FeatureFlag::boolean("flag-b", true))),
        );
    flags.initialize().await?;

    let ctx = EvaluationContext::new("123");

    let flag_a = flags.variation("project-a", "flag-a", &ctx, false).await?;
    println!("FLAG A: {:?}", flag_a);

    let flag_b = flags.variation("project-b", "flag-b", &ctx, false).await?;
    println!("FLAG B: {:?}", flag_b);

    // Asking the wrong project is an error, not a silent default.
    if let Err(err) = flags.variation("project-a", "flag-b", &ctx, false).await {
        println!("FLAG B in project-a: {}", err);
    }

    Ok(())
}
