use assert_cmd::Command;
use predicates::prelude::*;

fn podnet() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_podnet"));
    for var in ["CNI_BIN", "CNI_CONF", "CNI_NETNS", "DRYRUN", "CNI_MAX_CONF_NUM"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_command() {
    podnet()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("options"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn test_version_command() {
    podnet()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("podnet"));
}

#[test]
fn test_invalid_command() {
    podnet()
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_options_for_demo_sandbox() {
    podnet()
        .arg("options")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"K8S_POD_NAME\": \"pod\""))
        .stdout(predicate::str::contains("\"K8S_POD_INFRA_CONTAINER_ID\": \"sandbox_id\""))
        .stdout(predicate::str::contains("\"ingressRate\": 209715200"))
        .stdout(predicate::str::contains("\"hostPort\": 18080"));
}

#[test]
fn test_options_rejects_bad_bandwidth() {
    let dir = tempfile::tempdir().unwrap();
    let sandbox = dir.path().join("sandbox.json");
    std::fs::write(
        &sandbox,
        r#"{"annotations": {"kubernetes.io/ingress-bandwidth": "2P"}}"#,
    )
    .unwrap();

    podnet()
        .arg("options")
        .arg("--sandbox")
        .arg(&sandbox)
        .assert()
        .failure()
        .stderr(predicate::str::contains("resource is unreasonably large (> 1Pbit)"));
}

#[test]
fn test_setup_fails_without_plugin_dirs() {
    let dir = tempfile::tempdir().unwrap();

    podnet()
        .arg("setup")
        .arg("--bin-dir")
        .arg(dir.path().join("missing"))
        .arg("--conf-dir")
        .arg(dir.path())
        .arg("--netns")
        .arg("/proc/self/ns/net")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to initialize network manager"));
}

#[test]
fn test_setup_dry_run() {
    let bin = tempfile::tempdir().unwrap();
    let conf = tempfile::tempdir().unwrap();

    let output = podnet()
        .arg("setup")
        .arg("--bin-dir")
        .arg(bin.path())
        .arg("--conf-dir")
        .arg(conf.path())
        .arg("--netns")
        .arg("/proc/self/ns/net")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(result["interfaces"]["lo"].is_object());
    assert_eq!(result["interfaces"]["eth0"]["ipConfigs"][0]["ip"], "10.88.0.2");
}

#[test]
fn test_setup_reads_env() {
    let bin = tempfile::tempdir().unwrap();
    let conf = tempfile::tempdir().unwrap();

    podnet()
        .arg("setup")
        .env("CNI_BIN", bin.path())
        .env("CNI_CONF", conf.path())
        .env("CNI_NETNS", "/proc/self/ns/net")
        .env("DRYRUN", "false")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"eth0\""));
}

#[test]
fn test_setup_missing_netns() {
    let bin = tempfile::tempdir().unwrap();
    let conf = tempfile::tempdir().unwrap();

    podnet()
        .arg("setup")
        .arg("--bin-dir")
        .arg(bin.path())
        .arg("--conf-dir")
        .arg(conf.path())
        .arg("--netns")
        .arg(bin.path().join("no-such-netns"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_health_reports_missing_dirs() {
    let dir = tempfile::tempdir().unwrap();

    podnet()
        .arg("health")
        .arg("--bin-dir")
        .arg(dir.path().join("bin"))
        .arg("--conf-dir")
        .arg(dir.path())
        .arg("--netns")
        .arg("/proc/self/ns/net")
        .assert()
        .failure()
        .stdout(predicate::str::contains("NOT FOUND"))
        .stderr(predicate::str::contains("1 check(s) failed"));
}

#[test]
fn test_setup_accepts_largest_max_conf_num() {
    let bin = tempfile::tempdir().unwrap();
    let conf = tempfile::tempdir().unwrap();

    podnet()
        .arg("setup")
        .arg("--bin-dir")
        .arg(bin.path())
        .arg("--conf-dir")
        .arg(conf.path())
        .arg("--netns")
        .arg("/proc/self/ns/net")
        .arg("--max-conf-num")
        .arg(usize::MAX.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"eth0\""));
}
