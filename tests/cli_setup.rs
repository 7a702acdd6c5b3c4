use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const BASELINE: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
<host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
</nmaprun>
"#;

const NODE_ONE_UP: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
<host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
<host><status state="up"/>
<address addr="10.0.0.11" addrtype="ipv4"/>
<address addr="52:54:00:12:34:56" addrtype="mac"/>
<hostnames><hostname name="node-1.lan" type="PTR"/></hostnames>
</host>
</nmaprun>
"#;

/// Fake `nmap` that prints `first` on its first run and `later` afterwards.
#[cfg(unix)]
fn fake_nmap(dir: &Path, first: &str, later: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let first_path = dir.join("first.xml");
    let later_path = dir.join("later.xml");
    fs::write(&first_path, first).expect("write first report");
    fs::write(&later_path, later).expect("write later report");

    let script = dir.join("fake-nmap");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\nif [ -f \"{state}\" ]; then\n  cat \"{later}\"\nelse\n  touch \"{state}\"\n  cat \"{first}\"\nfi\n",
            state = dir.join("probed").display(),
            later = later_path.display(),
            first = first_path.display(),
        ),
    )
    .expect("write script");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod script");
    script
}

fn write_config(dir: &TempDir, nmap: &Path, machines: &str) -> PathBuf {
    let path = dir.path().join("cluster_config.yml");
    fs::write(
        &path,
        format!(
            "network_config:\n  subnet: 10.0.0.0/24\nmachines:\n{machines}setup:\n  nmap_path: \"{}\"\n  probe_timeout_secs: 10\n  inventory_path: \"{}\"\n",
            nmap.display(),
            dir.path().join("inventory.yml").display()
        ),
    )
    .expect("write config");
    path
}

fn setup_cmd() -> Command {
    let mut cmd = Command::cargo_bin("rccr-setup").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_config_exits_non_zero() {
    let dir = tempdir().expect("tempdir");
    setup_cmd()
        .arg(dir.path().join("absent.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn config_without_machines_exits_non_zero() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cluster_config.yml");
    fs::write(&path, "network_config:\n  subnet: 10.0.0.0/24\nmachines: []\n").expect("write");

    setup_cmd()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no machines are defined"));
}

#[cfg(unix)]
#[test]
fn maps_node_and_writes_inventory() {
    let dir = tempdir().expect("tempdir");
    let nmap = fake_nmap(dir.path(), BASELINE, NODE_ONE_UP);
    let config = write_config(
        &dir,
        &nmap,
        "  - name: node-1\n    ip: 10.0.0.10\n    role: manager\n    containers: [registry]\n",
    );
    let output = dir.path().join("hosts.yml");

    setup_cmd()
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .write_stdin("\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("node-1 -> 10.0.0.11 mapped"))
        .stdout(predicate::str::contains("differs from configured IP 10.0.0.10"));

    let inventory = fs::read_to_string(&output).expect("inventory written");
    assert!(inventory.contains("ansible_host: 10.0.0.11"));
    assert!(inventory.contains("managers:"));
    assert!(!dir.path().join("inventory.yml").exists());
}

#[cfg(unix)]
#[test]
fn non_utf8_keystrokes_still_answer_prompts() {
    let dir = tempdir().expect("tempdir");
    let nmap = fake_nmap(dir.path(), BASELINE, NODE_ONE_UP);
    let config = write_config(&dir, &nmap, "  - name: node-1\n    ip: 10.0.0.11\n    role: worker\n");
    let output = dir.path().join("hosts.yml");

    setup_cmd()
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .write_stdin(b"\xff\xfe\ny\n".to_vec())
        .assert()
        .success()
        .stdout(predicate::str::contains("node-1 -> 10.0.0.11 mapped"));

    assert!(fs::read_to_string(&output)
        .expect("inventory written")
        .contains("ansible_host: 10.0.0.11"));
}

#[cfg(unix)]
#[test]
fn declining_final_confirmation_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let nmap = fake_nmap(dir.path(), BASELINE, NODE_ONE_UP);
    let config = write_config(&dir, &nmap, "  - name: node-1\n    ip: 10.0.0.11\n    role: worker\n");

    setup_cmd()
        .arg(&config)
        .write_stdin("\nn\n")
        .assert()
        .failure();

    assert!(!dir.path().join("inventory.yml").exists());
    assert!(!dir.path().join("inventory.partial.yml").exists());
}

#[cfg(unix)]
#[test]
fn abandoned_node_keeps_partial_inventory() {
    let dir = tempdir().expect("tempdir");
    let nmap = fake_nmap(dir.path(), BASELINE, NODE_ONE_UP);
    let config = write_config(
        &dir,
        &nmap,
        "  - name: node-1\n    ip: 10.0.0.11\n    role: manager\n  - name: node-2\n    ip: 10.0.0.12\n    role: worker\n  - name: node-3\n    ip: 10.0.0.13\n    role: worker\n",
    );

    setup_cmd()
        .arg(&config)
        .write_stdin("\n\nn\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("No new host was detected"))
        .stdout(predicate::str::contains("[3/3]").not());

    assert!(!dir.path().join("inventory.yml").exists());
    let partial = fs::read_to_string(dir.path().join("inventory.partial.yml")).expect("partial");
    assert!(partial.contains("node-1"));
    assert!(!partial.contains("node-2:"));
}
