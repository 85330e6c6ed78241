//! Integration tests for flagmesh-config

use flagmesh_config::*;
use flagmesh_features::{EvaluationContext, InitError, ResolverError};
use std::fs;

const PROJECT_A: &str = r#"[
    {"key": "flag-a", "default_variation": "A-VALUE"},
    {"key": "my-feature", "default_variation": true}
]"#;

const PROJECT_B: &str = r#"[
    {"key": "flag-b", "default_variation": "B-VALUE"},
    {"key": "my-feature", "default_variation": false}
]"#;

const MESH: &str = r#"
init_timeout_ms = 2000

[[sources]]
label = "Project A"
flags_file = "project-a.json"

[[sources]]
label = "Project B"
flags_file = "project-b.json"
"#;

fn write_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("project-a.json"), PROJECT_A).unwrap();
    fs::write(dir.path().join("project-b.json"), PROJECT_B).unwrap();
    fs::write(dir.path().join("flagmesh.toml"), MESH).unwrap();
    dir
}

#[tokio::test]
async fn test_merged_client_from_file() {
    let dir = write_fixture();
    let config = MeshConfig::load(dir.path().join("flagmesh.toml")).unwrap();

    let merged = config.build_merged().unwrap();
    merged
        .initialize_with_timeout(config.init_timeout().unwrap())
        .await
        .unwrap();

    let ctx = EvaluationContext::new("123");
    assert_eq!(
        merged.string_variation("flag-a", &ctx, "DEFAULT").await.unwrap(),
        "A-VALUE"
    );
    assert_eq!(
        merged.string_variation("flag-b", &ctx, "DEFAULT").await.unwrap(),
        "B-VALUE"
    );
    // Declared first in the file, so Project A wins the collision.
    assert!(merged.bool_variation("my-feature", &ctx, false).await.unwrap());

    let err = merged
        .string_variation("missing", &ctx, "DEFAULT")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::Source(_)));
}

#[tokio::test]
async fn test_namespaced_client_from_file() {
    let dir = write_fixture();
    let config = MeshConfig::load(dir.path().join("flagmesh.toml")).unwrap();

    let namespaced = config.build_namespaced().unwrap();
    namespaced.initialize().await.unwrap();

    let ctx = EvaluationContext::new("123");
    let value = namespaced
        .variation("Project B", "my-feature", &ctx, true)
        .await
        .unwrap();
    assert_eq!(value.as_bool(), Some(false));
}

#[test]
fn test_invalid_flag_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), "{ not an array").unwrap();
    fs::write(
        dir.path().join("flagmesh.json"),
        r#"{"sources": [{"label": "Broken", "flags_file": "broken.json"}]}"#,
    )
    .unwrap();

    let config = MeshConfig::load(dir.path().join("flagmesh.json")).unwrap();
    let err = config.build_merged().unwrap_err();

    assert!(matches!(err, ConfigError::SourceError { ref label, .. } if label == "Broken"));
}

#[tokio::test]
async fn test_uninitialized_build_is_not_ready() {
    let dir = write_fixture();
    let merged = MeshConfig::load(dir.path().join("flagmesh.toml"))
        .unwrap()
        .build_merged()
        .unwrap();

    let ctx = EvaluationContext::new("123");
    assert!(matches!(
        merged.variation("flag-a", &ctx, "DEFAULT").await,
        Err(ResolverError::NotReady)
    ));

    merged.initialize().await.unwrap();
    assert!(matches!(
        merged.initialize().await,
        Err(InitError::AlreadyInitialized)
    ));
}
