extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn renders_the_home_view_to_a_png() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("home.png");
    Command::cargo_bin("floodbrot")
        .unwrap()
        .args(&["-o", output.to_str().unwrap()])
        .args(&["--size", "48x36", "--iterations", "200", "--threads", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("48x36"));
    assert!(output.exists());
}

#[test]
fn renders_a_zoomed_view() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("zoom.png");
    Command::cargo_bin("floodbrot")
        .unwrap()
        .args(&["-o", output.to_str().unwrap()])
        .args(&["--size", "40x40", "--iterations", "200", "--strategy", "bfs"])
        .args(&["--centre", "-0.75,0.1", "--side", "0.5"])
        .args(&["--zoom", "10,10:30,30", "--zoom", "2,2:3,3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("too narrow"));
    assert!(output.exists());
}

#[test]
fn rejects_an_unknown_strategy() {
    Command::cargo_bin("floodbrot")
        .unwrap()
        .args(&["-o", "never.png", "--strategy", "sideways"])
        .assert()
        .failure();
}

#[test]
fn requires_an_output() {
    Command::cargo_bin("floodbrot")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("output"));
}
