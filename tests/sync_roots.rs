//! `lsync sync` runner across real workspace roots

use std::path::{Path, PathBuf};

use launch_sync::{run_sync, Reporter};
use lsync_app::config::{save_settings, IntegrationKind, Settings};
use lsync_app::ContextOverride;
use lsync_core::jsonc::parse_value;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

const LAUNCH: &str = r#"{
    "version": "0.2.0",
    "configurations": [
        {
            // Linux only
            "name": "debug app",
            "presentation": {
                "cmake": [
                    { "type": "preset-include", "value": "debug" },
                    { "type": "kit-match", "value": "^gcc-1[23]$" }
                ]
            }
        },
        {
            "name": "release app",
            "presentation": {
                "hidden": false,
                "cmake": [{ "type": "match", "value": "rel" }]
            }
        }
    ]
}
"#;

fn root_with_launch() -> TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("CMakeLists.txt"), "project(app)\n").unwrap();
    std::fs::create_dir(dir.path().join(".vscode")).unwrap();
    std::fs::write(dir.path().join(".vscode/launch.json"), LAUNCH).unwrap();
    dir
}

fn hidden_flags(root: &Path) -> Vec<Value> {
    let text = std::fs::read_to_string(root.join(".vscode/launch.json")).unwrap();
    let value = parse_value(&text).unwrap();
    value["configurations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["presentation"]["hidden"].clone())
        .collect()
}

fn roots(dirs: &[&TempDir]) -> Vec<PathBuf> {
    dirs.iter().map(|d| d.path().to_path_buf()).collect()
}

#[tokio::test]
async fn kit_override_updates_every_root() {
    let first = root_with_launch();
    let second = root_with_launch();
    let overrides = ContextOverride {
        kit: Some("gcc-12".to_string()),
        ..Default::default()
    };

    let summary = run_sync(roots(&[&first, &second]), overrides, Reporter::new(true))
        .await
        .unwrap();

    assert_eq!(summary.updated, 2);
    assert!(!summary.has_failures());
    for dir in [&first, &second] {
        assert_eq!(hidden_flags(dir.path()), vec![json!(false), json!(true)]);
    }
    let text = std::fs::read_to_string(first.path().join(".vscode/launch.json")).unwrap();
    assert!(text.contains("// Linux only"));
}

#[tokio::test]
async fn repeated_sync_is_a_no_op() {
    let dir = root_with_launch();
    let overrides = ContextOverride {
        build_preset: Some("release".to_string()),
        ..Default::default()
    };

    run_sync(roots(&[&dir]), overrides.clone(), Reporter::new(true))
        .await
        .unwrap();
    let before = std::fs::read(dir.path().join(".vscode/launch.json")).unwrap();

    let summary = run_sync(roots(&[&dir]), overrides, Reporter::new(true))
        .await
        .unwrap();
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(
        std::fs::read(dir.path().join(".vscode/launch.json")).unwrap(),
        before
    );
}

#[tokio::test]
async fn broken_root_is_counted_and_others_proceed() {
    let broken = root_with_launch();
    std::fs::write(broken.path().join(".vscode/launch.json"), "{ \"configurations\": [").unwrap();
    let good = root_with_launch();
    let empty = tempdir().unwrap();
    let overrides = ContextOverride {
        configure_preset: Some("debug".to_string()),
        ..Default::default()
    };

    let summary = run_sync(roots(&[&broken, &good, &empty]), overrides, Reporter::new(true))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.absent, 1);
    assert_eq!(hidden_flags(good.path()), vec![json!(false), json!(true)]);
}

#[tokio::test]
async fn static_source_without_selection_hides_managed_entries() {
    let dir = root_with_launch();
    let mut settings = Settings::default();
    settings.integration.source = IntegrationKind::Static;
    save_settings(dir.path(), &settings).unwrap();

    let summary = run_sync(roots(&[&dir]), ContextOverride::default(), Reporter::new(true))
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(hidden_flags(dir.path()), vec![json!(true), json!(true)]);
}

#[tokio::test]
async fn state_file_source_reads_current_selection() {
    let dir = root_with_launch();
    std::fs::create_dir_all(dir.path().join(".lsync")).unwrap();
    std::fs::write(
        dir.path().join(".lsync/state.json"),
        r#"{ "buildPreset": "__defaultBuildPreset__", "configurePreset": "rel-with-debug" }"#,
    )
    .unwrap();

    run_sync(roots(&[&dir]), ContextOverride::default(), Reporter::new(true))
        .await
        .unwrap();

    // Placeholder build preset falls through to the configure preset
    assert_eq!(hidden_flags(dir.path()), vec![json!(false), json!(false)]);
}

#[cfg(unix)]
#[tokio::test]
async fn command_source_runs_query_commands() {
    let dir = root_with_launch();
    let mut settings = Settings::default();
    settings.integration.source = IntegrationKind::Command;
    settings.integration.commands.kit = vec![
        "sh".to_string(),
        "-c".to_string(),
        "printf 'gcc-13\\n'".to_string(),
    ];
    save_settings(dir.path(), &settings).unwrap();

    let summary = run_sync(roots(&[&dir]), ContextOverride::default(), Reporter::new(true))
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(hidden_flags(dir.path()), vec![json!(false), json!(true)]);
}

#[tokio::test]
async fn command_source_without_commands_is_fatal() {
    let dir = root_with_launch();
    let mut settings = Settings::default();
    settings.integration.source = IntegrationKind::Command;
    save_settings(dir.path(), &settings).unwrap();

    let err = run_sync(roots(&[&dir]), ContextOverride::default(), Reporter::new(true))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".vscode/launch.json")).unwrap(),
        LAUNCH
    );
}
