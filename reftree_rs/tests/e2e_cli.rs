//! End-to-End CLI tests for reftree.
//!
//! Developed with 💀 by The Loctree Team (c)2025

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::PathBuf;

/// Get path to the fixture Python project
fn fixture_root() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/pyproj")
        .display()
        .to_string()
}

fn shapes_py() -> String {
    format!("{}/shapes.py", fixture_root())
}

/// Get a command pointing to the reftree binary
fn reftree() -> Command {
    cargo_bin_cmd!("reftree")
}

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        reftree()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("reftree"))
            .stdout(predicate::str::contains("--max-depth"))
            .stdout(predicate::str::contains("--downstream-only"));
    }

    #[test]
    fn shows_version() {
        reftree()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn missing_positionals_fail_with_hint() {
        reftree()
            .assert()
            .failure()
            .stderr(predicate::str::contains("expected <file> <entity>"));
    }

    #[test]
    fn conflicting_direction_filters_fail() {
        let shapes = shapes_py();
        reftree()
            .args([
                shapes.as_str(),
                "Circle",
                "class",
                "--upstream-only",
                "--downstream-only",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cannot combine"));
    }

    #[test]
    fn unknown_entity_kind_fails() {
        let shapes = shapes_py();
        reftree()
            .args([shapes.as_str(), "Circle", "module"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown entity kind"));
    }
}

mod tree_builds {
    use super::*;

    #[test]
    fn builds_bidirectional_tree_for_fixture_class() {
        let shapes = shapes_py();
        let root = fixture_root();
        reftree()
            .args([
                shapes.as_str(),
                "Circle",
                "class",
                "--root",
                root.as_str(),
                "--color",
                "never",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependency tree for: Circle (class)"))
            .stdout(predicate::str::contains(
                "validate (function) [internal_reference]",
            ))
            .stdout(predicate::str::contains("Shape (class) [internal_reference]"))
            .stdout(predicate::str::contains("render (function) [function_call]"));
    }

    #[test]
    fn max_depth_zero_keeps_only_the_target() {
        let shapes = shapes_py();
        reftree()
            .args([shapes.as_str(), "Circle", "class", "-d", "0", "--color", "never"])
            .assert()
            .success()
            .stdout(predicate::str::contains("(none)"))
            .stdout(predicate::str::contains("render").not());
    }

    #[test]
    fn upstream_only_hides_downstream_section() {
        let shapes = shapes_py();
        let root = fixture_root();
        reftree()
            .args([
                shapes.as_str(),
                "Circle",
                "class",
                "--upstream-only",
                "--root",
                root.as_str(),
                "--color",
                "never",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("UPSTREAM"))
            .stdout(predicate::str::contains("DOWNSTREAM").not())
            .stdout(predicate::str::contains("render").not());
    }

    #[test]
    fn list_format_numbers_dependencies() {
        let shapes = shapes_py();
        let root = fixture_root();
        reftree()
            .args([
                shapes.as_str(),
                "Circle",
                "class",
                "-f",
                "list",
                "--root",
                root.as_str(),
                "--color",
                "never",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("All dependencies for: Circle (class)"))
            .stdout(predicate::str::contains("1. "));
    }

    #[test]
    fn missing_entity_reports_suggestion() {
        let shapes = shapes_py();
        reftree()
            .args([shapes.as_str(), "Circel", "class"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"))
            .stderr(predicate::str::contains("did you mean 'Circle'"));
    }
}

mod json_output {
    use super::*;

    #[test]
    fn json_tree_is_valid_and_carries_the_registry() {
        let shapes = shapes_py();
        let root = fixture_root();
        let output = reftree()
            .args([shapes.as_str(), "Circle", "class", "--json", "--root", root.as_str()])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let json: serde_json::Value =
            serde_json::from_slice(&output).expect("stdout is valid JSON");
        assert_eq!(json["target"]["name"], "Circle");
        assert_eq!(json["target"]["depth"], 0);
        assert_eq!(json["target"]["dependency_kind"], "target");
        let registry = json["node_registry"].as_object().expect("registry object");
        assert!(registry.len() >= 4, "expected Circle, Shape, validate, render");
        assert!(
            json["downstream"]
                .as_array()
                .expect("downstream array")
                .iter()
                .any(|n| n["name"] == "render" && n["dependency_kind"] == "function_call")
        );
    }
}

mod report_files {
    use super::*;

    #[test]
    fn writes_report_to_output_file() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let report = tmp.path().join("circle.txt").display().to_string();
        let shapes = shapes_py();
        let root = fixture_root();

        reftree()
            .args([
                shapes.as_str(),
                "Circle",
                "class",
                "-o",
                report.as_str(),
                "--root",
                root.as_str(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("saved to"));

        let written = std::fs::read_to_string(&report).expect("report written");
        assert!(written.contains("Dependency tree for: Circle (class)"));
    }
}
