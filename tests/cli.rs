#![cfg(unix)]

mod common;

use common::{TestProject, read_json};
use predicates::prelude::*;
use predicates::str::contains;

#[test]
fn failed_build_mirrors_exit_code_and_prints_crash_report() {
    let project = TestProject::new();
    project.stub_python(
        "echo 'Nuitka: compiling' \n\
         echo 'FATAL: C compiler exploded' >&2\n\
         echo 'Traceback: backend crashed in codegen' > build/nuitka-crash-report.txt\n\
         exit 1",
    );

    project
        .cmd()
        .arg("--no-package")
        .assert()
        .code(1)
        .stdout(contains("--include-package=app"))
        .stderr(contains("FATAL: C compiler exploded"))
        .stderr(contains("Traceback: backend crashed in codegen"))
        .stderr(contains("failed with exit code 1"));

    let report = read_json(&project.build_dir().join("pyship-report.json"));
    assert_eq!(report["exit_code"], 1);
}

#[test]
fn missing_packaging_tools_are_skipped_with_exit_zero() {
    let project = TestProject::new();
    project.stub_python("echo built > build/EXECUTABLE");

    project
        .cmd()
        .args(["--version-string", "2.3.1"])
        .assert()
        .success()
        .stdout(contains("Executable:"))
        .stderr(contains("deb package skipped: dpkg-deb not found"))
        .stderr(contains("arch package skipped: makepkg not found"));

    let report = read_json(&project.build_dir().join("pyship-report.json"));
    assert_eq!(report["version"], "2.3.1");
    assert_eq!(report["packages"][0], "app");
    assert_eq!(report["data_dirs"][0], "assets");
    assert_eq!(report["package_outcomes"][0]["status"], "skipped");
    assert_eq!(report["package_outcomes"][1]["status"], "skipped");
}

#[test]
fn successful_build_shows_captured_stderr() {
    let project = TestProject::new();
    project.stub_python(
        "echo 'Nuitka-Options: Used command line options' >&2\n\
         echo 'Nuitka: Successfully created build/EXECUTABLE'\n\
         echo built > build/EXECUTABLE",
    );

    project
        .cmd()
        .arg("--no-package")
        .assert()
        .success()
        .stdout(contains("--- Compiler output ---"))
        .stdout(contains("Successfully created build/EXECUTABLE"))
        .stdout(contains("--- Compiler stderr ---"))
        .stdout(contains("    Nuitka-Options: Used command line options"));
}

#[test]
fn streaming_shows_compiler_lines_as_they_arrive() {
    let project = TestProject::new();
    project.stub_python(
        "echo 'step one'\n\
         echo 'careful' >&2\n\
         echo 'step two'\n\
         echo built > build/EXECUTABLE",
    );

    project
        .cmd()
        .args(["--stream", "--no-package"])
        .assert()
        .success()
        .stdout(contains("[stdout] step one").and(contains("[stdout] step two")))
        .stderr(contains("[stderr] careful"));
}

#[test]
fn encryption_writes_payload_and_key() {
    let project = TestProject::new();
    project.stub_python("echo built > build/EXECUTABLE");

    project
        .cmd()
        .args(["--encrypt-data", "--no-package"])
        .assert()
        .success()
        .stdout(contains("Encrypted payload:"));

    assert!(project.build_dir().join("payload.enc").is_file());
    let key = std::fs::read_to_string(project.build_dir().join("payload.key")).unwrap();
    assert_eq!(key.trim().len(), 64);
}

#[test]
fn jit_mode_reaches_the_command() {
    let project = TestProject::new();
    project.stub_python("echo built > build/EXECUTABLE");

    project
        .cmd()
        .args(["--jit", "enable", "--no-package"])
        .assert()
        .success()
        .stdout(contains("--module-parameter=torch-disable-jit=no"));
}

#[test]
fn unknown_jit_mode_is_a_usage_error() {
    let project = TestProject::new();
    project.stub_python("exit 0");

    project
        .cmd()
        .args(["--jit", "sometimes"])
        .assert()
        .code(2)
        .stderr(contains("sometimes"));
}

#[test]
fn bad_version_is_a_config_error() {
    let project = TestProject::new();
    project.stub_python("echo should-not-run > ran.txt");

    project
        .cmd()
        .args(["--version-string", "1.0-beta"])
        .assert()
        .code(2)
        .stderr(contains("configuration error"));

    assert!(!project.root.join("ran.txt").exists());
}

#[test]
fn missing_entry_is_a_config_error() {
    let project = TestProject::new();
    project.stub_python("exit 0");
    std::fs::remove_file(project.root.join("main.py")).unwrap();

    project
        .cmd()
        .assert()
        .code(2)
        .stderr(contains("entry file"));
}
