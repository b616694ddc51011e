// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::tempdir;

fn run_cli(config_root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_st-opinfo"))
        .arg("--config-root")
        .arg(config_root)
        .args(args)
        .env_remove("SPIRAL_CONFIG_BASE")
        .env_remove("SPIRAL_CONFIG_SITE")
        .env_remove("SPIRAL_CONFIG_RUN")
        .env_remove("SPIRAL_TRACE_CHROME")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "cli failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn lists_builtin_operators_sorted() {
    let dir = tempdir().unwrap();
    let stdout = stdout_of(&run_cli(dir.path(), &["ops", "list"]));
    let names: Vec<&str> = stdout.lines().collect();

    assert_eq!(names.len(), 6);
    assert!(names.contains(&"PadV3"));
    assert!(names.contains(&"AdaptiveMaxPool2D"));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let tbe = stdout_of(&run_cli(dir.path(), &["ops", "list", "--imply-type", "tbe"]));
    assert!(tbe.trim().is_empty());
}

#[test]
fn show_prints_op_info_record() {
    let dir = tempdir().unwrap();
    let stdout = stdout_of(&run_cli(dir.path(), &["ops", "show", "AdaptiveMaxPool2D"]));
    let record: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(record["op_name"], "AdaptiveMaxPool2D");
    assert_eq!(record["imply_type"], "AiCPU");
    assert_eq!(record["outputs"][1]["name"], "argmax");
    assert_eq!(record["dtype_format"].as_array().unwrap().len(), 6);
}

#[test]
fn select_skips_omitted_optional_input() {
    let dir = tempdir().unwrap();
    let stdout = stdout_of(&run_cli(
        dir.path(),
        &[
            "ops",
            "select",
            "PadV3",
            "--input",
            "U16_Default",
            "--input",
            "I64_Default",
            "--input",
            "_",
        ],
    ));
    let selection: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(selection["op_name"], "PadV3");
    assert_eq!(selection["combination_index"], 18);
    assert_eq!(selection["outputs"], json!([["uint16", "DefaultFormat"]]));
}

#[test]
fn unsupported_selection_fails() {
    let dir = tempdir().unwrap();
    let output = run_cli(
        dir.path(),
        &["ops", "select", "AdaptiveMaxPool2D", "--input", "I8_Default"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));

    let missing = run_cli(dir.path(), &["ops", "show", "Conv9D"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("Conv9D"));
}

#[test]
fn exported_catalog_reloads_without_builtins() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("out").join("catalog.json");
    stdout_of(&run_cli(
        dir.path(),
        &["ops", "export", "--output", catalog.to_str().unwrap()],
    ));

    let builtin = stdout_of(&run_cli(dir.path(), &["ops", "list"]));
    let reloaded = stdout_of(&run_cli(
        dir.path(),
        &[
            "--no-builtin",
            "--catalog",
            catalog.to_str().unwrap(),
            "ops",
            "list",
        ],
    ));
    assert_eq!(builtin, reloaded);

    let doubled = run_cli(
        dir.path(),
        &["--catalog", catalog.to_str().unwrap(), "ops", "list"],
    );
    assert!(!doubled.status.success());
}

#[test]
fn config_layers_drive_registry_and_metrics() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("base.toml"),
        "[opinfo]\nbuiltin_catalog = true\n\n[metrics]\nnum_labels = 2\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("run.json"),
        r#"{ "opinfo": { "builtin_catalog": false }, "metrics": { "num_labels": 3 } }"#,
    )
    .unwrap();

    let names = stdout_of(&run_cli(dir.path(), &["ops", "list"]));
    assert!(names.trim().is_empty());

    let samples = dir.path().join("samples.json");
    fs::write(&samples, r#"[{ "result": 0.5, "target": 2 }]"#).unwrap();
    let stdout = stdout_of(&run_cli(
        dir.path(),
        &["metrics", "summarize", "--input", samples.to_str().unwrap()],
    ));
    let summary: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["num_labels"], 3);
    assert_eq!(summary["class_counts"], json!([0, 0, 1]));
}

#[test]
fn configured_catalogs_resolve_against_config_root() {
    let dir = tempdir().unwrap();
    let exported = dir.path().join("ops.json");
    stdout_of(&run_cli(
        dir.path(),
        &["ops", "export", "--output", exported.to_str().unwrap()],
    ));
    fs::write(
        dir.path().join("site.toml"),
        "[opinfo]\nbuiltin_catalog = false\ncatalogs = [\"ops.json\"]\n",
    )
    .unwrap();

    let names = stdout_of(&run_cli(dir.path(), &["ops", "list"]));
    assert_eq!(names.lines().count(), 6);
    assert!(names.lines().any(|name| name == "PadV3"));
}

#[test]
fn summarize_aggregates_per_label() {
    let dir = tempdir().unwrap();
    let samples = dir.path().join("samples.json");
    let report = dir.path().join("summary.json");
    fs::write(
        &samples,
        r#"[
            { "result": 1.0, "target": 0 },
            { "result": 3.0, "target": 0 },
            { "result": [2.0], "target": [1] }
        ]"#,
    )
    .unwrap();

    stdout_of(&run_cli(
        dir.path(),
        &[
            "metrics",
            "summarize",
            "--input",
            samples.to_str().unwrap(),
            "--num-labels",
            "3",
            "--explainer",
            "saliency",
            "--output",
            report.to_str().unwrap(),
        ],
    ));

    let summary: Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(summary["explainer"], "saliency");
    assert_eq!(summary["samples"], 3);
    assert_eq!(summary["performance"], 2.0);
    assert_eq!(summary["class_performances"], json!([2.0, 2.0, 0.0]));
}

#[test]
fn summarize_rejects_out_of_range_label() {
    let dir = tempdir().unwrap();
    let samples = dir.path().join("samples.json");
    fs::write(&samples, r#"[{ "result": 0.1, "target": 5 }]"#).unwrap();

    let output = run_cli(
        dir.path(),
        &[
            "metrics",
            "summarize",
            "--input",
            samples.to_str().unwrap(),
            "--num-labels",
            "3",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("sample 0"));
}
