use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_apidoc")))
}

const DOC: &str = r#"// <apidoc version="1.0.0">
// <title>Pets</title>
// <mimetype>application/json</mimetype>
// <tag name="pets" title="Pet store"/>
// </apidoc>
package main
"#;

const LIST: &str = r#"// <api method="GET" summary="list pets">
// <tag>pets</tag>
// <path path="/pets"/>
// <response status="200" type="string" summary="ok"/>
// </api>
func list() {}
"#;

const MISSING_SUMMARY: &str = r#"package main

// <api method="POST">
// <path path="/pets"/>
// </api>
func create() {}
"#;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

// -- build --

#[test]
fn build_writes_xml_to_stdout() {
    let dir = project(&[("main.go", DOC), ("pets.go", LIST)]);

    let assert = cmd().arg("build").arg(dir.path()).assert().success();
    let out = stdout_of(&assert);
    assert!(out.starts_with("<?xml"));
    assert!(out.contains(r#"<apidoc apidoc="1.0.0" created=""#), "{out}");
    assert!(out.contains(r#" version="1.0.0">"#), "{out}");
    assert!(out.contains(r#"<api method="GET" summary="list pets">"#), "{out}");
}

#[test]
fn build_writes_json_file() {
    let dir = project(&[("main.go", DOC), ("pets.go", LIST)]);
    let out = dir.path().join("out/doc.json");

    cmd()
        .args(["build", "-f", "json", "-o"])
        .arg(&out)
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(value["apidoc"], "1.0.0");
    assert_eq!(value["apis"][0]["path"]["path"], "/pets");
}

#[test]
fn build_filters_by_tag_and_overrides_version() {
    let birds = LIST.replace("pets", "birds");
    let doc = DOC.replace(
        r#"// <tag name="pets" title="Pet store"/>"#,
        "// <tag name=\"pets\" title=\"Pet store\"/>\n// <tag name=\"birds\" title=\"Birds\"/>",
    );
    let dir = project(&[("main.go", doc.as_str()), ("pets.go", LIST), ("birds.go", birds.as_str())]);

    let assert = cmd()
        .args(["build", "-f", "json", "--tag", "birds", "--doc-version", "3.1.4"])
        .arg(dir.path())
        .assert()
        .success();
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(value["version"], "3.1.4");
    assert_eq!(value["tags"].as_array().unwrap().len(), 1);
    assert_eq!(value["apis"].as_array().unwrap().len(), 1);
    assert_eq!(value["apis"][0]["path"]["path"], "/birds");
    assert!(value["created"].is_string());
}

#[test]
fn build_rejects_invalid_version_override() {
    let dir = project(&[("main.go", DOC)]);
    cmd()
        .args(["build", "--doc-version", "latest"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid document version: latest"));
}

#[test]
fn build_rejects_unknown_format() {
    let dir = project(&[("main.go", DOC)]);
    cmd()
        .args(["build", "-f", "yaml"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format: yaml"));
}

#[test]
fn build_still_writes_output_with_errors() {
    let dir = project(&[("main.go", DOC), ("pets.go", LIST), ("bad.go", MISSING_SUMMARY)]);
    cmd()
        .arg("build")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("list pets"))
        .stderr(predicate::str::contains("summary: is required"));
}

// -- check --

#[test]
fn check_passes_clean_sources() {
    let dir = project(&[("main.go", DOC), ("pets.go", LIST)]);
    cmd().arg("check").arg(dir.path()).assert().success().stderr(predicate::str::is_empty());
}

#[test]
fn check_fails_with_positioned_diagnostics() {
    let dir = project(&[("main.go", DOC), ("bad.go", MISSING_SUMMARY)]);
    cmd()
        .arg("check")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("summary: is required at"))
        // reported at the closing tag
        .stderr(predicate::str::contains("bad.go:5:4"))
        .stderr(predicate::str::contains("1 error(s) found"));
}

#[test]
fn check_localizes_diagnostics() {
    let dir = project(&[("main.go", DOC), ("bad.go", MISSING_SUMMARY)]);
    cmd()
        .args(["check", "--locale", "zh-Hans"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("summary: 不能为空 位于"));
}

#[test]
fn check_strict_mode() {
    let source = "// <api method=\"GET\" summary=\"s\" colour=\"red\"><path path=\"/s\"/></api>\n";
    let dir = project(&[("main.go", DOC), ("s.go", source)]);

    cmd().arg("check").arg(dir.path()).assert().success();
    cmd()
        .args(["check", "--strict"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn explicit_language_and_recursion() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/main.go"), DOC).unwrap();
    fs::write(dir.path().join("nested/pets.go"), LIST).unwrap();

    // Nothing to read at the top level without -r.
    cmd()
        .args(["build", "--lang", "go"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no go source files"));

    cmd()
        .args(["build", "--lang", "go", "-r"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("/pets"));
}

#[test]
fn undetectable_language_asks_for_lang() {
    let dir = project(&[("notes.unknownext", "")]);
    cmd()
        .arg("check")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("pass --lang"));
}

#[test]
fn unsupported_language_is_an_error() {
    let dir = project(&[("main.go", DOC)]);
    cmd()
        .args(["check", "--lang", "cobol"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported language: cobol"));
}

#[test]
fn paths_are_required() {
    cmd().arg("check").assert().failure();
}

// -- lang --

#[test]
fn lang_lists_languages() {
    cmd()
        .arg("lang")
        .assert()
        .success()
        .stdout(predicate::str::contains("rust"))
        .stdout(predicate::str::contains("go"))
        .stdout(predicate::str::contains("php"));
}
