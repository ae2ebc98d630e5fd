//! Integration test that generates run-report.schema.json
//!
//! Run with: cargo test -p fakerprobe-core --test generate_schema

use fakerprobe_core::report::generate_schema;
use std::path::Path;

#[test]
fn write_schema_file() {
    let schema = generate_schema();

    // Write to workspace root
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap();
    let schema_path = workspace_root.join("run-report.schema.json");

    std::fs::write(&schema_path, &schema).expect("failed to write schema file");

    let content = std::fs::read_to_string(&schema_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(
        parsed.get("title").and_then(|v| v.as_str()),
        Some("RunReport")
    );

    // Every outcome tag is described
    for tag in ["passed", "failed", "observed", "error"] {
        assert!(content.contains(&format!("\"{tag}\"")), "missing outcome {tag}");
    }
}
