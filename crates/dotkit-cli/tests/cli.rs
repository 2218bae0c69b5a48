use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// `dotkit` with an isolated home, bundled root, and project directory.
fn dotkit(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dotkit").unwrap();
    cmd.env("HOME", temp_dir.path().join("home"))
        .env("DOTKIT_BUNDLED_ROOT", temp_dir.path().join("bundled"))
        .env_remove("DOTKIT_LOG")
        .env_remove("DOTKIT_PACKAGE_PATH")
        .env_remove("DOTKIT_HOOK_TIMEOUT")
        .arg("--project")
        .arg(temp_dir.path().join("project"));
    cmd
}

fn bundle_demo_kit(temp_dir: &TempDir) {
    let kit = temp_dir.path().join("bundled/kits/demo");
    write(
        &kit.join("kit.yaml"),
        "name: demo\nversion: 1.0.0\ndescription: Demo kit\nartifacts:\n  agent:\n    - agents/a.md\n  hook:\n    - hooks\n",
    );
    write(&kit.join("agents/a.md"), "# Agent A\n");
    write(
        &kit.join("hooks/hooks.yaml"),
        "kit_id: demo\nkit_version: 1.0.0\nhooks:\n  - name: greet\n    lifecycle: SessionStart\n    script: greet.sh\n",
    );
    write(&kit.join("hooks/greet.sh"), "echo \"hello from $DOTKIT_KIT_ID\"\n");
}

fn write_hooks(temp_dir: &TempDir, kit: &str, manifest: &str, scripts: &[(&str, &str)]) {
    let dir = temp_dir.path().join("project/.claude/hooks").join(kit);
    write(&dir.join("hooks.yaml"), manifest);
    for (name, body) in scripts {
        write(&dir.join(name), body);
    }
}

#[test]
fn test_route_exits_zero_when_hooks_fail() {
    let temp_dir = TempDir::new().unwrap();
    write_hooks(
        &temp_dir,
        "demo",
        "kit_id: demo\nkit_version: 1\nhooks:\n  - name: fails\n    lifecycle: Stop\n    script: fails.sh\n  - name: after\n    lifecycle: Stop\n    script: after.sh\n",
        &[("fails.sh", "exit 2\n"), ("after.sh", "echo after\n")],
    );

    dotkit(&temp_dir)
        .args(["route", "Stop"])
        .write_stdin("{\"session_id\": \"abc\"}")
        .assert()
        .success()
        .stdout("after\n");
}

#[test]
fn test_route_exits_zero_for_unknown_lifecycle() {
    let temp_dir = TempDir::new().unwrap();

    dotkit(&temp_dir)
        .args(["route", "OnBoot"])
        .write_stdin("{}")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_install_list_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    bundle_demo_kit(&temp_dir);
    let project = temp_dir.path().join("project");

    dotkit(&temp_dir)
        .args(["install", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("agents/a.md"));

    assert!(project.join(".claude/agents/a.md").is_file());
    assert!(project.join(".claude/hooks/demo/hooks.yaml").is_file());
    assert!(project.join(".dotkit/config.yaml").is_file());

    dotkit(&temp_dir)
        .args(["install", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    dotkit(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("managed"));

    dotkit(&temp_dir)
        .args(["route", "SessionStart"])
        .write_stdin("")
        .assert()
        .success()
        .stdout("hello from demo\n");

    dotkit(&temp_dir).args(["remove", "demo"]).assert().success();
    assert!(!project.join(".claude/agents/a.md").exists());
    assert!(!project.join(".claude/hooks/demo").exists());
}

#[test]
fn test_hook_toggle_and_search() {
    let temp_dir = TempDir::new().unwrap();
    bundle_demo_kit(&temp_dir);

    dotkit(&temp_dir)
        .arg("search")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo").and(predicate::str::contains("Demo kit")));

    dotkit(&temp_dir).args(["install", "demo"]).assert().success();

    dotkit(&temp_dir)
        .args(["hook", "disable", "demo", "greet"])
        .assert()
        .success();

    dotkit(&temp_dir)
        .args(["route", "SessionStart"])
        .write_stdin("{}")
        .assert()
        .success()
        .stdout("");

    dotkit(&temp_dir)
        .args(["hook", "enable", "demo", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greet"));
}
