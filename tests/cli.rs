//! Binary-level checks for the CLI surface.

use assert_cmd::Command;
use predicates::prelude::*;

fn distkit() -> Command {
    Command::cargo_bin("distkit").unwrap()
}

#[test]
fn help_lists_the_pipeline_subcommands() {
    distkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("dist")
                .and(predicate::str::contains("release"))
                .and(predicate::str::contains("install"))
                .and(predicate::str::contains("test")),
        );
}

#[test]
fn dist_without_a_descriptor_is_a_handled_abort() {
    let dir = tempfile::tempdir().unwrap();
    distkit()
        .current_dir(dir.path())
        .args(["--no-install", "dist", "--no-test"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("dist.toml"));
}

#[test]
fn new_scaffolds_a_project_skeleton() {
    let dir = tempfile::tempdir().unwrap();
    distkit()
        .current_dir(dir.path())
        .args(["new", "My::Thing"])
        .assert()
        .success();

    let root = dir.path().join("My-Thing");
    assert!(root.join("dist.toml").exists());
    assert!(root.join("prereqs.toml").exists());
    assert!(root.join("Changes").exists());
    assert!(root.join("lib/My/Thing.mod").exists());
}

#[test]
fn scaffolded_project_still_needs_an_author() {
    let dir = tempfile::tempdir().unwrap();
    distkit()
        .current_dir(dir.path())
        .args(["new", "My::Thing"])
        .assert()
        .success();

    distkit()
        .current_dir(dir.path().join("My-Thing"))
        .args(["--no-install", "dist", "--no-test"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("author"));
}

#[test]
fn full_dist_run_produces_the_archive() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("lib")).unwrap();
    std::fs::write(
        root.join("dist.toml"),
        "main_module = \"Solo\"\nversion = \"0.2.0\"\nabstract = \"solo\"\nauthor = \"a\"\nlicense = \"MIT\"\n",
    )
    .unwrap();
    std::fs::write(root.join("lib/Solo.mod"), "body\n").unwrap();

    distkit()
        .current_dir(root)
        .args(["--no-install", "dist", "--no-test"])
        .assert()
        .success();

    assert!(root.join("Solo-v0.2.0.tar.gz").exists());
    assert!(root.join("build.sh").exists());
}

#[test]
fn unknown_plugin_is_an_unclean_failure() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(
        root.join("dist.toml"),
        "main_module = \"Solo\"\nversion = \"0.2.0\"\nabstract = \"solo\"\nauthor = \"a\"\nlicense = \"MIT\"\n\n[NoSuchPlugin]\n",
    )
    .unwrap();

    distkit()
        .current_dir(root)
        .args(["--no-install", "dist", "--no-test"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("distkit::plugin::NoSuchPlugin"));
}
