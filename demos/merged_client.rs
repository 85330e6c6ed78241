//! Merged Client Example
//!
//! Two projects behind one evaluation interface. Shows fallthrough, key
//! collisions, and what happens when no project has the flag.

use flagmesh::prelude::*;
use std::sync::Arc;

fn project_a() -> InMemoryFlagClient {
    InMemoryFlagClient::new()
        .with_flag(FeatureFlag::string("flag-a", "A-VALUE"))
        .with_flag(FeatureFlag::boolean("my-feature", true))
}

fn project_b() -> InMemoryFlagClient {
    InMemoryFlagClient::new()
        .with_flag(FeatureFlag::string("flag-b", "B-VALUE"))
        .with_flag(FeatureFlag::boolean("my-feature", false))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    flagmesh::flagmesh_log::init()?;

    println!("\n=== Merged Client Example ===\n");

    let flags = MergedFlagClient::builder()
        .client("Project A", Arc::new(project_a()))
        .client("Project B", Arc::new(project_b()))
        .build();
    flags.initialize().await?;

    let ctx = EvaluationContext::new("123");

    // 1. Each flag lives in exactly one project
    println!("1. Unambiguous keys:");
    let flag_a = flags.variation_detail("flag-a", &ctx, "DEFAULT").await?;
    println!("   FLAG A: {:?} (from {})", flag_a.value, flag_a.label);
    let flag_b = flags.variation_detail("flag-b", &ctx, "DEFAULT").await?;
    println!("   FLAG B: {:?} (from {})\n", flag_b.value, flag_b.label);

    // 2. Both projects define the key: the first registered client wins
    println!("2. Colliding key:");
    let my_feature = flags.variation_detail("my-feature", &ctx, false).await?;
    println!(
        "   MY FEATURE: {:?} (from {}, Project B was never asked)\n",
        my_feature.value, my_feature.label
    );

    // 3. No project has the key: the last client's error comes back
    println!("3. Missing key:");
    match flags.variation("flag-c", &ctx, "DEFAULT").await {
        Ok(value) => println!("   FLAG C: {:?}", value),
        Err(err) => println!("   FLAG C: error from the last client: {}", err),
    }

    println!("\n=== Example Complete ===\n");
    Ok(())
}
