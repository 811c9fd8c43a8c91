use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Create an extension directory holding a single language:
/// ```
/// extensions/
///   lang-<id>/
///     package.json
///     language-configuration.json
/// ```
fn install_language(root: &Path, id: &str, extension: &str, comments: &str) -> PathBuf {
    let extensions = root.join("extensions");
    let dir = extensions.join(format!("lang-{id}"));
    fs::create_dir_all(&dir).expect("Failed to create extension dir");
    fs::write(
        dir.join("package.json"),
        format!(
            r#"{{
  "name": "lang-{id}",
  "contributes": {{
    "languages": [
      {{
        "id": "{id}",
        "extensions": ["{extension}"],
        "configuration": "./language-configuration.json",
      }},
    ],
  }},
}}"#
        ),
    )
    .expect("Failed to write manifest");
    fs::write(dir.join("language-configuration.json"), comments).expect("Failed to write language configuration");
    extensions
}

fn rust_project() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let extensions = install_language(
        temp_dir.path(),
        "rust",
        ".rs",
        r#"{
  // line and block comments
  "comments": { "lineComment": "//", "blockComment": ["/*", "*/"] },
}"#,
    );
    let source = temp_dir.path().join("main.rs");
    fs::write(&source, "// one two three four five six\nfn main() {}\n").expect("Failed to write source");
    (temp_dir, extensions, source)
}

#[test]
fn test_wrap_rewrites_file() {
    let (_temp_dir, extensions, source) = rust_project();

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("--no-config")
        .arg("--line-width")
        .arg("20")
        .arg("--extension-dir")
        .arg(&extensions)
        .arg(&source);

    cmd.assert().success().stdout(predicate::str::contains("1 of 1 files wrapped"));

    let content = fs::read_to_string(&source).expect("Failed to read source");
    assert_eq!(content, "// one two three\n// four five six\nfn main() {}\n");
}

#[test]
fn test_check_reports_without_writing() {
    let (_temp_dir, extensions, source) = rust_project();

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("--check")
        .arg("--no-config")
        .arg("-w")
        .arg("20")
        .arg("--extension-dir")
        .arg(&extensions)
        .arg(&source);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Would wrap"));

    let content = fs::read_to_string(&source).expect("Failed to read source");
    assert_eq!(content, "// one two three four five six\nfn main() {}\n");
}

#[test]
fn test_check_passes_when_comments_fit() {
    let (_temp_dir, extensions, source) = rust_project();

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("--check")
        .arg("--no-config")
        .arg("-w")
        .arg("80")
        .arg("--extension-dir")
        .arg(&extensions)
        .arg(&source);

    cmd.assert().success();
}

#[test]
fn test_diff_output() {
    let (_temp_dir, extensions, source) = rust_project();

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("--diff")
        .arg("--color")
        .arg("never")
        .arg("--no-config")
        .arg("-w")
        .arg("20")
        .arg("--extension-dir")
        .arg(&extensions)
        .arg(&source);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("-// one two three four five six"))
        .stdout(predicate::str::contains("+// four five six"));

    let content = fs::read_to_string(&source).expect("Failed to read source");
    assert!(content.starts_with("// one two three four five six\n"));
}

#[test]
fn test_wrap_stdin() {
    let (_temp_dir, extensions, _source) = rust_project();

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("-")
        .arg("--language")
        .arg("rust")
        .arg("--no-config")
        .arg("-w")
        .arg("20")
        .arg("--extension-dir")
        .arg(&extensions)
        .write_stdin("// one two three four five\n");

    cmd.assert().success().stdout("// one two three\n// four five\n");
}

#[test]
fn test_stdin_requires_language() {
    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap").arg("-").arg("--no-config").write_stdin("// text\n");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("--language is required"));
}

fn check_command(extensions: &Path, line_width: &str) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("--check")
        .arg("--no-config")
        .arg("-w")
        .arg(line_width)
        .arg("--language")
        .arg("rust")
        .arg("--extension-dir")
        .arg(extensions);
    cmd
}

#[test]
fn test_check_agrees_on_stdin_and_files_for_crlf_input() {
    let (temp_dir, extensions, _source) = rust_project();
    let untouched = "fn main() {}\r\nlet x = 1;\n// ok\n";
    let needs_wrap = "// one two three four five six\r\nfn main() {}\r\n";

    for (content, expected_code) in [(untouched, 0), (needs_wrap, 1)] {
        let file = temp_dir.path().join("crlf.rs");
        fs::write(&file, content).expect("Failed to write source");

        check_command(&extensions, "20").arg(&file).assert().code(expected_code);
        check_command(&extensions, "20")
            .arg("-")
            .write_stdin(content)
            .assert()
            .code(expected_code);

        assert_eq!(fs::read_to_string(&file).expect("Failed to read source"), content);
    }
}

#[test]
fn test_wrap_keeps_crlf_terminators() {
    let (temp_dir, extensions, _source) = rust_project();
    let file = temp_dir.path().join("crlf.rs");
    fs::write(&file, "// one two three four five six\r\nfn main() {}\n").expect("Failed to write source");

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("-q")
        .arg("--no-config")
        .arg("-w")
        .arg("20")
        .arg("--extension-dir")
        .arg(&extensions)
        .arg(&file);
    cmd.assert().success();

    assert_eq!(
        fs::read_to_string(&file).expect("Failed to read source"),
        "// one two three\r\n// four five six\r\nfn main() {}\n"
    );
}

#[test]
fn test_config_file_sets_line_width_and_language_override() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let extensions = install_language(
        temp_dir.path(),
        "python",
        ".py",
        r##"{ "comments": { "lineComment": "#" } }"##,
    );
    let config = temp_dir.path().join(".comment-wrapper.toml");
    fs::write(
        &config,
        format!(
            "line-width = 15\nextension-dirs = [{:?}]\n\n[languages]\npyi = \"python\"\n",
            extensions.display().to_string()
        ),
    )
    .expect("Failed to write config");

    let stub = temp_dir.path().join("stub.pyi");
    fs::write(&stub, "# short one\n# two\nx: int\n").expect("Failed to write stub");

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap").arg("--config").arg(&config).arg("-q").arg(&stub);
    cmd.assert().success();

    let content = fs::read_to_string(&stub).expect("Failed to read stub");
    assert_eq!(content, "# short one two\nx: int\n");
}

#[test]
fn test_invalid_config_is_tool_error() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let config = temp_dir.path().join("broken.toml");
    fs::write(&config, "line-width = [").expect("Failed to write config");

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap").arg("--config").arg(&config).arg(temp_dir.path());

    cmd.assert().code(2).stderr(predicate::str::contains("Config error"));
}

#[test]
fn test_unparsable_language_configuration_makes_no_edits() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let extensions = install_language(temp_dir.path(), "go", ".go", "{ \"comments\": ");
    let source = temp_dir.path().join("main.go");
    let original = "// one two three four five six\npackage main\n";
    fs::write(&source, original).expect("Failed to write source");

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("wrap")
        .arg("--check")
        .arg("--no-config")
        .arg("-w")
        .arg("20")
        .arg("--extension-dir")
        .arg(&extensions)
        .arg(&source);

    cmd.assert().success();
    assert_eq!(fs::read_to_string(&source).expect("Failed to read source"), original);
}

#[test]
fn test_languages_lists_comment_markers() {
    let (_temp_dir, extensions, _source) = rust_project();

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("languages")
        .arg("--color")
        .arg("never")
        .arg("--no-config")
        .arg("--extension-dir")
        .arg(&extensions);

    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^rust\s+//\s+/\* \*/$").unwrap());
}

#[test]
fn test_schema_describes_config() {
    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.arg("schema");

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Schema is not JSON");
    assert_eq!(schema["title"], "Config");
    assert!(schema["properties"]["line-width"].is_object());
    assert!(schema["properties"]["extension-dirs"].is_object());
}

#[test]
fn test_config_shows_effective_line_width() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.current_dir(temp_dir.path()).arg("config").arg("--no-config");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No configuration file found"))
        .stdout(predicate::str::contains("line-width = 80"));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.current_dir(temp_dir.path()).arg("init");
    cmd.assert().success();

    let content = fs::read_to_string(temp_dir.path().join(".comment-wrapper.toml")).expect("Config was not created");
    assert!(content.contains("line-width"));

    let mut cmd = cargo_bin_cmd!("comment-wrapper");
    cmd.current_dir(temp_dir.path()).arg("init");
    cmd.assert().code(2);
}
