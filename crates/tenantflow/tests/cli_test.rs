#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// 設定ファイルや環境変数の影響を受けないコマンドを作る
fn tenantflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tenantflow").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("TENANTFLOW_CONFIG_PATH")
        .env_remove("AWS_ACC_ID")
        .env_remove("REGION")
        .env_remove("AWS_REGION")
        .env_remove("QUICKSIGHT_ADMIN_ID")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("kinds"))
        .stdout(predicate::str::contains("--region"))
        .stdout(predicate::str::contains("--profile"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tenantflow"));
}

/// createコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_create_help() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .args(["create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<KIND>"))
        .stdout(predicate::str::contains("--params"))
        .stdout(predicate::str::contains("--interval-ms"))
        .stdout(predicate::str::contains("--max-attempts"));
}

/// kindsコマンドで標準のディスパッチテーブルが表示されることを確認
#[test]
fn test_kinds_lists_dispatch_table() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .arg("kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("data-set"))
        .stdout(predicate::str::contains("describe-data-set"))
        .stdout(predicate::str::contains("athena-query"))
        .stdout(predicate::str::contains("SUCCEEDED"))
        .stdout(predicate::str::contains("5000ms × 100回"))
        .stdout(predicate::str::contains("role-policy"));
}

/// 設定ファイルの上書きがkindsに反映されることを確認
#[test]
fn test_kinds_reflects_config_overrides() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("tenantflow.yaml"),
        "overrides:\n  iam-role:\n    interval_ms: 250\n    max_attempts: 4\n",
    )
    .unwrap();

    tenantflow(&dir)
        .arg("kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("250ms × 4回"));
}

/// 不正な上書き設定はエラーになることを確認
#[test]
fn test_invalid_override_kind() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("tenantflow.yaml"),
        "overrides:\n  widget:\n    max_attempts: 4\n",
    )
    .unwrap();

    tenantflow(&dir)
        .arg("kinds")
        .assert()
        .failure()
        .stderr(predicate::str::contains("overrides.widget"));
}

/// 未知のリソース種別はエラーになることを確認
#[test]
fn test_create_unknown_kind() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .args(["create", "widget", "--params", "params.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource kind 'widget'"));
}

/// パラメータファイルが無い場合はエラーになることを確認
#[test]
fn test_create_missing_params_file() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .args(["create", "data-set", "--params", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

/// パラメータがオブジェクトでない場合はエラーになることを確認
#[test]
fn test_create_rejects_non_object_params() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("params.json"), "[1, 2, 3]").unwrap();

    tenantflow(&dir)
        .args(["create", "data-set", "--params", "params.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("オブジェクト"));
}

/// アカウントIDが無い場合はAWSを呼ぶ前にエラーになることを確認
#[test]
fn test_create_requires_account_id() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("params.json"),
        r#"{"DataSetId": "emissions", "Name": "Emissions"}"#,
    )
    .unwrap();

    tenantflow(&dir)
        .args(["create", "data-set", "--params", "params.json", "--region", "ap-southeast-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("account_id"));
}

/// プランファイルが無い場合はエラーになることを確認
#[test]
fn test_apply_missing_plan() {
    let dir = TempDir::new().unwrap();
    tenantflow(&dir)
        .args(["apply", "missing-plan.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing-plan.yaml"));
}

/// 不正なプランファイルはエラーになることを確認
#[test]
fn test_apply_invalid_plan() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("plan.yaml"),
        "steps:\n  - kind: widget\n    params: {}\n",
    )
    .unwrap();

    tenantflow(&dir)
        .args(["apply", "plan.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid plan"));
}
