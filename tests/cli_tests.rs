//! CLI integration tests

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn hivision(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hivision").unwrap();
    cmd.env("HIVISION_CONFIG", config.join("config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("screenshot"))
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn record_help_shows_options() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .args(["record", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--region"))
        .stdout(predicate::str::contains("--max-duration"))
        .stdout(predicate::str::contains("--no-timestamp"))
        .stdout(predicate::str::contains("test-pattern"));
}

#[test]
fn version_output() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hivision"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_honors_override() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(dir.path().to_string_lossy().as_ref()));
}

#[cfg(target_os = "linux")]
#[test]
fn config_path_follows_xdg() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("hivision")
        .unwrap()
        .env_remove("HIVISION_CONFIG")
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hivision/config.toml"));
}

#[test]
fn config_set_get_list_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .args(["config", "set", "quality", "ultra"])
        .assert()
        .success();
    hivision(dir.path())
        .args(["config", "set", "region", "follow:640x360"])
        .assert()
        .success();

    hivision(dir.path())
        .args(["config", "get", "quality"])
        .assert()
        .success()
        .stdout("ultra\n");
    hivision(dir.path())
        .args(["config", "get", "fps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(not set)"));
    hivision(dir.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("follow:640x360"))
        .stdout(predicate::str::contains("max_duration"));

    let saved = fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("quality = \"ultra\""));
}

#[test]
fn config_init_only_once() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path()).args(["config", "init"]).assert().success();
    hivision(dir.path())
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn records_test_pattern_to_y4m() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clip.y4m");
    hivision(dir.path())
        .args(["record", "--source", "test-pattern", "--codec", "i444"])
        .args(["--region", "0,0,64x48", "--fps", "10", "--max-duration", "1s"])
        .arg("--output")
        .arg(&output)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("clip.y4m"));

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"YUV4MPEG2 W64 H48 F10:1"));
    let info = hivision::infrastructure::read_y4m_info(&output).unwrap();
    assert!(info.frames >= 1);
}

#[test]
fn screenshot_from_test_pattern() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .args(["screenshot", "--source", "test-pattern", "--region", "10,10,32x24"])
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Screenshots"));

    let shots: Vec<_> = fs::read_dir(dir.path().join("Screenshots"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(shots.len(), 1);
    let image = image::open(&shots[0]).unwrap();
    assert_eq!((image.width(), image.height()), (32, 24));
}

#[test]
fn malformed_region_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .args(["record", "--source", "test-pattern", "--region", "0,0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("region"));
}

#[test]
fn region_larger_than_screen_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    hivision(dir.path())
        .args(["record", "--source", "test-pattern", "--codec", "i444"])
        .args(["--region", "0,0,4000x4000"])
        .arg("--output")
        .arg(dir.path().join("big.y4m"))
        .assert()
        .code(2);
    assert!(!dir.path().join("big.y4m").exists());
}
