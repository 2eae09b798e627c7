//! Integration tests for the CLI binary.
//!
//! Verifies that the `msa` binary responds to basic flags and can drive a
//! request/approve/revoke cycle against a temporary ledger directory.
//!
//! This test is registered as a [[test]] in the makerspace-access-cli crate
//! so that CARGO_BIN_EXE_msa is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `msa` binary.
fn msa_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_msa"))
}

/// Run `msa` against `dir` as `user` with `role`.
fn msa(dir: &Path, user: &str, role: &str, args: &[&str]) -> Output {
    msa_binary()
        .arg("--data-dir")
        .arg(dir)
        .args(["--user", user, "--role", role])
        .args(args)
        .env_remove("MSA_GRANT_VALIDITY_DAYS")
        .output()
        .expect("failed to execute msa")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "msa should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Pull the value following `label` out of the CLI's `Label: value` lines.
fn field(stdout: &str, label: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(label))
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| panic!("no '{label}' line in output: {stdout}"))
}

#[test]
fn cli_responds_to_help() {
    let output = msa_binary()
        .arg("--help")
        .output()
        .expect("failed to execute msa --help");

    assert!(
        output.status.success(),
        "msa --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("msa") || stdout.contains("Usage"),
        "msa --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = msa_binary()
        .arg("--version")
        .output()
        .expect("failed to execute msa --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0.3") || stdout.contains("msa"),
        "msa --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = msa_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute msa");

    assert!(
        !output.status.success(),
        "msa should fail on an unknown flag"
    );
}

#[test]
fn cli_request_approve_revoke_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path();

    // Admin adds a skill.
    let out = stdout_of(&msa(
        data,
        "admin",
        "admin",
        &[
            "skill", "add", "--name", "Laser Cutter Safety", "--level", "basic", "--equipment",
            "laser-01",
        ],
    ));
    let skill_id = field(&out, "Skill ID:");
    assert!(skill_id.starts_with("skill_"));

    // Locked before certification.
    let denied = stdout_of(&msa(data, "alice", "member", &["access", "check", "laser-01"]));
    assert!(denied.contains("DENIED"), "got: {denied}");
    assert!(denied.contains("Laser Cutter Safety"));

    // Alice requests the skill.
    let out = stdout_of(&msa(
        data,
        "alice",
        "member",
        &["request", "create", "--skill", &skill_id],
    ));
    let request_id = field(&out, "Request ID:");
    assert!(request_id.starts_with("sreq_"));

    // Alice cannot approve her own request.
    let self_approve = msa(data, "alice", "member", &["request", "approve", &request_id]);
    assert!(!self_approve.status.success());
    assert!(String::from_utf8_lossy(&self_approve.stderr).contains("skills:approve"));

    // Staff approves.
    let out = stdout_of(&msa(data, "sam", "staff", &["request", "approve", &request_id]));
    let grant_id = field(&out, "Grant ID:");
    assert!(grant_id.starts_with("grant_"));
    assert!(out.contains("never"));

    // A second approval fails and issues nothing.
    let again = msa(data, "sam", "staff", &["request", "approve", &request_id]);
    assert!(!again.status.success());

    let allowed = stdout_of(&msa(data, "alice", "member", &["access", "check", "laser-01"]));
    assert!(allowed.contains("ALLOWED"), "got: {allowed}");

    let json = stdout_of(&msa(
        data,
        "alice",
        "member",
        &["access", "check", "laser-01", "--json"],
    ));
    let decision: serde_json::Value = serde_json::from_str(&json).expect("decision JSON");
    assert_eq!(decision["can_access"], serde_json::Value::Bool(true));

    // Staff may not revoke; admin may.
    let staff_revoke = msa(data, "sam", "staff", &["grant", "revoke", &grant_id]);
    assert!(!staff_revoke.status.success());

    let out = stdout_of(&msa(
        data,
        "admin",
        "admin",
        &["grant", "revoke", &grant_id, "--reason", "safety_violation"],
    ));
    assert!(out.contains("safety_violation"));

    let denied = stdout_of(&msa(
        data,
        "admin",
        "admin",
        &["access", "check", "laser-01", "--member", "alice"],
    ));
    assert!(denied.contains("DENIED"), "got: {denied}");

    let grants = stdout_of(&msa(
        data,
        "admin",
        "admin",
        &["grant", "list", "--member", "alice", "--verbose"],
    ));
    assert!(grants.contains("revoked"));
}

#[test]
fn cli_members_cannot_sweep_or_check_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path();

    let sweep = msa(data, "alice", "member", &["grant", "sweep"]);
    assert!(!sweep.status.success(), "members must not sweep grants");
    assert!(String::from_utf8_lossy(&sweep.stderr).contains("grants:sweep"));

    let peek = msa(
        data,
        "alice",
        "member",
        &["access", "check", "laser-01", "--member", "bob"],
    );
    assert!(!peek.status.success(), "members must not check other members");
    assert!(String::from_utf8_lossy(&peek.stderr).contains("access:check_any"));

    let list = msa(data, "alice", "member", &["access", "list", "--member", "bob"]);
    assert!(!list.status.success());

    // Their own access and an admin sweep still work.
    let own = stdout_of(&msa(data, "alice", "member", &["access", "check", "laser-01"]));
    assert!(own.contains("ALLOWED"), "got: {own}");
    let swept = stdout_of(&msa(data, "admin", "admin", &["grant", "sweep"]));
    assert!(swept.contains("Expired 0 grant(s)"));
}
