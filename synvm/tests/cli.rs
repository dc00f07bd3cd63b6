use std::io::Write;
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::tempdir;

fn write_program(dir: &std::path::Path, name: &str, words: &[u16]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for word in words {
        file.write_all(&word.to_le_bytes()).unwrap();
    }
    path
}

#[test]
fn runs_print_then_halt_and_writes_stdout() {
    let dir = tempdir().unwrap();
    let program = write_program(dir.path(), "prog.bin", &[19, 65, 0]);

    let output = Command::cargo_bin("synvm")
        .unwrap()
        .arg(&program)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, b"A");
}

#[test]
fn dump_on_exit_writes_a_full_state_image() {
    let dir = tempdir().unwrap();
    let program = write_program(dir.path(), "prog.bin", &[0]);
    let dump_path = dir.path().join("dump.bin");

    Command::cargo_bin("synvm")
        .unwrap()
        .arg(&program)
        .arg("--dump-on-exit")
        .arg(&dump_path)
        .assert()
        .success();

    let bytes = std::fs::read(&dump_path).unwrap();
    assert_eq!(bytes.len(), synacore::serialize::STATE_LEN);
}

#[test]
fn a_missing_program_file_exits_nonzero() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("synvm")
        .unwrap()
        .arg(dir.path().join("missing.bin"))
        .assert()
        .failure();
}

#[test]
fn resumes_from_a_saved_state_dump() {
    let dir = tempdir().unwrap();
    let program = write_program(dir.path(), "prog.bin", &[0]);
    let dump_path = dir.path().join("dump.bin");

    Command::cargo_bin("synvm")
        .unwrap()
        .arg(&program)
        .arg("--dump-on-exit")
        .arg(&dump_path)
        .assert()
        .success();

    Command::cargo_bin("synvm")
        .unwrap()
        .arg(&program)
        .arg("--load-state")
        .arg(&dump_path)
        .assert()
        .success();
}
