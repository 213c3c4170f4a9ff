use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn chainsim() -> Command {
    Command::cargo_bin("chainsim-cli").unwrap()
}

#[test]
fn pow_mines_and_verifies_a_short_chain() {
    chainsim()
        .args(["pow", "--blocks", "1", "--difficulty", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("block 1: nonce"))
        .stdout(predicate::str::contains("verification passed"));
}

#[test]
fn pow_rejects_a_difficulty_beyond_the_digest_width() {
    chainsim()
        .args(["pow", "--blocks", "1", "--difficulty", "65"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid difficulty"));
}

#[test]
fn pos_reports_rounds_tally_and_verification() {
    chainsim()
        .args(["pos", "--rounds", "3", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("round 1:"))
        .stdout(predicate::str::contains("proposals per validator:"))
        .stdout(predicate::str::contains("total stake: 1800"))
        .stdout(predicate::str::contains("verification passed"));
}

#[test]
fn pos_json_emits_the_full_chain() {
    let assert = chainsim()
        .args(["pos", "--rounds", "2", "--seed", "1", "--json"])
        .assert()
        .success();

    let output = assert.get_output();
    let chain: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocks = chain["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0]["previous_hash"], "0");
}

#[test]
fn pos_loads_validators_from_a_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"[{"address":"erin","stake":700},{"address":"frank","stake":300}]"#)
        .unwrap();

    chainsim()
        .args(["pos", "--rounds", "2", "--seed", "3", "--validators-file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("erin"))
        .stdout(predicate::str::contains("frank"));
}

#[test]
fn pos_fails_when_the_whole_set_has_zero_stake() {
    chainsim()
        .args(["pos", "--rounds", "1", "--validators", "a=0,b=0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no eligible stake"));
}

#[test]
fn malformed_validator_spec_is_rejected_at_parse_time() {
    chainsim()
        .args(["pos", "--validators", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected addr=stake"));
}
