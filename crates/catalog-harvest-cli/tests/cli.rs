//! Integration tests for the catalog-harvest binary.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};

// ─────────────────────── helpers ───────────────────────

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_catalog-harvest"));
    cmd.env_remove("CATALOG_HARVEST_CONFIG").env("RUST_LOG", "warn");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to spawn catalog-harvest")
}

/// Zero-delay config with one brand page and one keyword page.
fn write_config(dir: &Path) -> std::path::PathBuf {
    let config = json!({
        "catalog": {
            "brand": [{ "label": "nike", "url": "https://shop.test/nike" }],
            "keyword": [{ "label": "shoes", "url": "https://shop.test/shoes" }]
        },
        "target_count": 2,
        "cooldown_ms": 0,
        "settle_ms": 0,
        "hydrate_delay_ms": 0,
        "post_load_delay": { "brand_ms": 0, "keyword_ms": 0 },
        "output_dir": dir.join("out")
    });
    let path = dir.join("harvest.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

/// Fixture with a nike page only; the keyword page is unreachable.
fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let card = |id: &str, watermark: Option<&str>| -> Value {
        let mut nodes = json!({
            ".product-brand": { "text": "Nike" },
            ".product-discountedPrice": { "text": "Rs. 2499" },
            "picture source": {
                "attributes": { "srcset": format!("https://img.test/{id}.webp 1x") }
            }
        });
        if let Some(text) = watermark {
            nodes[".product-waterMark"] = json!({ "text": text });
        }
        json!({ "attributes": { "id": id }, "nodes": nodes })
    };
    let fixture = json!({
        "https://shop.test/nike": {
            "cards": [card("1", Some("AD")), card("2", None), card("3", None)]
        }
    });
    let path = dir.join("site.json");
    std::fs::write(&path, fixture.to_string()).unwrap();
    path
}

// ─────────────────────── tests ───────────────────────

#[test]
fn test_replay_writes_results_and_skips_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let fixture = write_fixture(dir.path());

    let out = run(bin().arg("--config").arg(&config).arg("replay").arg(&fixture));
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let csv_path = dir.path().join("out").join("brand_nike.csv");
    let text = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1,Nike,,https://img.test/1.webp,Rs. 2499,,,,,Advertisement,brand");
    assert_eq!(lines[2], "2,Nike,,https://img.test/2.webp,Rs. 2499,,,,,Organic,brand");

    assert!(!dir.path().join("out").join("keyword_shoes.csv").exists());
    assert!(String::from_utf8_lossy(&out.stdout).contains("brand_nike.csv"));
}

#[test]
fn test_replay_with_nothing_harvested_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let fixture = write_fixture(dir.path());

    let out = run(bin()
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(&fixture)
        .args(["--kind", "keyword"]));
    assert!(!out.status.success());
}

#[test]
fn test_targets_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let out = run(bin().arg("--config").arg(&config).args(["targets", "--json"]));
    assert!(out.status.success());

    let targets: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(targets[0]["kind"], "brand");
    assert_eq!(targets[0]["label"], "nike");
    assert_eq!(targets[1]["kind"], "keyword");
}

#[test]
fn test_outputs_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let fixture = write_fixture(dir.path());
    run(bin().arg("--config").arg(&config).arg("replay").arg(&fixture));

    let out = run(bin().arg("--config").arg(&config).arg("outputs"));
    let listing = String::from_utf8_lossy(&out.stdout);
    assert!(listing.contains("brand_nike.csv"));
    assert!(listing.contains("1 file(s)"));

    let csv_path = dir.path().join("out").join("brand_nike.csv");
    let out = run(bin().arg("preview").arg(&csv_path).args(["--limit", "1"]));
    let preview = String::from_utf8_lossy(&out.stdout);
    assert!(preview.starts_with("product_id\tbrand"));
    assert!(preview.contains("Total rows: 2"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"retry_budget": 0}"#).unwrap();

    let out = run(bin().arg("--config").arg(&path).arg("targets"));
    assert!(!out.status.success());
}
