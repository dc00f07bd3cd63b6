use std::io::Write;
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::tempdir;

#[test]
fn assembles_a_file_and_derives_the_output_path() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("prog.asm");
    std::fs::write(&input_path, "out 'A'\nhalt\n").unwrap();

    Command::cargo_bin("synasm")
        .unwrap()
        .arg(&input_path)
        .current_dir(dir.path())
        .assert()
        .success();

    let output_path = dir.path().join("prog.bin");
    let bytes = std::fs::read(output_path).unwrap();
    assert_eq!(bytes, vec![19, 0, 65, 0, 0, 0]);
}

#[test]
fn exits_with_one_on_a_diagnostic_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("bad.asm");
    std::fs::write(&input_path, "jnz ra\n").unwrap();

    Command::cargo_bin("synasm")
        .unwrap()
        .arg(&input_path)
        .current_dir(dir.path())
        .assert()
        .code(1);

    assert!(!dir.path().join("bad.bin").exists());
}

#[test]
fn exits_with_two_when_the_input_is_missing() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("synasm")
        .unwrap()
        .arg(dir.path().join("missing.asm"))
        .assert()
        .code(2);
}

#[test]
fn an_explicit_output_argument_is_honored() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("prog.asm");
    let output_path = dir.path().join("out.img");
    std::fs::write(&input_path, "halt\n").unwrap();

    Command::cargo_bin("synasm")
        .unwrap()
        .arg(&input_path)
        .arg(&output_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&output_path).unwrap(), vec![0, 0]);
}

#[test]
fn a_prior_output_file_is_preserved_as_a_bak_path() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("prog.asm");
    let output_path = dir.path().join("prog.bin");
    std::fs::write(&input_path, "halt\n").unwrap();
    let mut prior = std::fs::File::create(&output_path).unwrap();
    prior.write_all(b"stale").unwrap();
    drop(prior);

    Command::cargo_bin("synasm")
        .unwrap()
        .arg(&input_path)
        .current_dir(dir.path())
        .assert()
        .success();

    assert_eq!(std::fs::read(&output_path).unwrap(), vec![0, 0]);
    let bak_path = dir.path().join("prog.bin.bak");
    assert_eq!(std::fs::read(bak_path).unwrap(), b"stale");
}
