use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("verta-gate").expect("binary built")
}

#[test]
fn pack_validate_accepts_a_well_formed_pack() {
    bin()
        .args(["pack", "validate", "--path", "tests/fixtures/pack_require_approval.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn pack_publish_prints_a_stable_content_hash() {
    let first = bin()
        .args(["pack", "publish", "--path", "tests/fixtures/pack_require_approval.json"])
        .output()
        .expect("run");
    let second = bin()
        .args(["pack", "publish", "--path", "tests/fixtures/pack_require_approval.json"])
        .output()
        .expect("run");
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout, "content hash must be deterministic");
    let stdout = String::from_utf8(first.stdout).unwrap();
    assert!(stdout.contains("contentHash"));
}

#[test]
fn evaluate_passes_when_the_approval_obligation_is_satisfied() {
    bin()
        .args([
            "--fixture",
            "evaluate",
            "--pr-context",
            "tests/fixtures/pr_context_approved.json",
            "--pack",
            "tests/fixtures/pack_require_approval.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"conclusion\": \"success\""));
}

#[test]
fn evaluate_fails_when_the_approval_obligation_is_unmet() {
    bin()
        .args([
            "--fixture",
            "evaluate",
            "--pr-context",
            "tests/fixtures/pr_context_unapproved.json",
            "--pack",
            "tests/fixtures/pack_require_approval.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"conclusion\": \"failure\""));
}

#[test]
fn doctor_reports_missing_github_token_in_fixture_mode() {
    bin()
        .args(["--fixture", "doctor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config: loaded"));
}
