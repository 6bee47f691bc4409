//! CLI behavior tests for rota-queue

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    config_path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let catalog_path = dir.path().join("items.csv");
        std::fs::write(
            &catalog_path,
            "title,date,image_url\n\
             Old Mill,1922,https://assets.example/0.tif\n\
             Stone Bridge,1934,https://assets.example/1.tif\n\
             Water Tower,ca. 1940,https://assets.example/2.tif\n",
        )
        .unwrap();

        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
[catalog]
path = "{catalog}"

[queue]
path = "{queue}"
"#,
                catalog = catalog_path.display(),
                queue = dir.path().join("order.txt").display(),
            ),
        )
        .unwrap();

        Self { dir, config_path }
    }

    fn queue_path(&self) -> std::path::PathBuf {
        self.dir.path().join("order.txt")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("rota-queue").unwrap();
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }
}

#[test]
fn status_with_no_state_reports_regeneration() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 item(s)"))
        .stdout(predicate::str::contains("next run regenerates"));
}

#[test]
fn status_reports_next_up_from_persisted_order() {
    let fixture = Fixture::new();
    std::fs::write(fixture.queue_path(), "1\n0\n").unwrap();

    fixture
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("pending:  2 of 3"))
        .stdout(predicate::str::contains("stone bridge, 1934"));
}

#[test]
fn show_lists_pending_in_order() {
    let fixture = Fixture::new();
    std::fs::write(fixture.queue_path(), "2\n0\n").unwrap();

    let expected = "2\twater tower, ca. 1940\n0\told mill, 1922\n";
    fixture
        .cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::eq(expected));
}

#[test]
fn reset_requires_confirmation() {
    let fixture = Fixture::new();
    std::fs::write(fixture.queue_path(), "1\n").unwrap();

    fixture
        .cmd()
        .arg("reset")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("--yes"));

    // State untouched without confirmation.
    assert_eq!(std::fs::read_to_string(fixture.queue_path()).unwrap(), "1\n");
}

#[test]
fn reset_with_yes_clears_state() {
    let fixture = Fixture::new();
    std::fs::write(fixture.queue_path(), "1\n2\n").unwrap();

    fixture
        .cmd()
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared"));

    assert_eq!(std::fs::read_to_string(fixture.queue_path()).unwrap(), "");
}

#[test]
fn missing_config_is_fatal() {
    let mut cmd = Command::cargo_bin("rota-queue").unwrap();
    cmd.env("ROTACAST_CONFIG", "/nonexistent/rotacast-config.toml");
    cmd.arg("status")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
