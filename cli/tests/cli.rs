use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const APPLICATION: &str = r#"
version = "1.0";
application:
{
  window:
  {
    title = "My Application";
    size = { w = 640; h = 480; };
  };
  misc:
  {
    pi = 3.141592654;
    bigint = 9223372036854775807L;
    columns = [ "Last Name", "First Name", "MI" ];
    bitmask = 0x1FC3;
  };
};
"#;

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write test file");
}

fn application(dir: &TempDir) -> PathBuf {
    let input = dir.path().join("app.cfg");
    write_file(&input, APPLICATION);
    input
}

#[test]
fn prints_string_setting() {
    let dir = TempDir::new().expect("tempdir");
    let input = application(&dir);

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["application", "window", "title"])
        .assert()
        .success()
        .stdout("My Application\n");
}

#[test]
fn prints_typed_settings() {
    let dir = TempDir::new().expect("tempdir");
    let input = application(&dir);

    for (kind, path, expected) in [
        ("int", ["application", "misc", "bitmask"], "8131\n"),
        ("hex", ["application", "misc", "bitmask"], "0x1FC3\n"),
        ("bigint", ["application", "misc", "bigint"], "9223372036854775807\n"),
        ("float", ["application", "misc", "pi"], "3.141592654\n"),
    ] {
        cargo_bin_cmd!("cfgget")
            .arg(&input)
            .args(path)
            .args(["--type", kind])
            .assert()
            .success()
            .stdout(expected);
    }
}

#[test]
fn missing_setting_prints_zero_value() {
    let dir = TempDir::new().expect("tempdir");
    let input = application(&dir);

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["application", "nope", "--type", "int"])
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn exists_sets_exit_code() {
    let dir = TempDir::new().expect("tempdir");
    let input = application(&dir);

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["application", "misc", "columns", "2", "--exists"])
        .assert()
        .success()
        .stdout("true\n");

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["application", "misc", "columns", "3", "--exists"])
        .assert()
        .code(1)
        .stdout("false\n");
}

#[test]
fn json_output_for_groups() {
    let dir = TempDir::new().expect("tempdir");
    let input = application(&dir);

    let expected = "{\n  \"w\": 640,\n  \"h\": 480\n}\n";
    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["application", "window", "size", "-t", "json"])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn includes_resolve_next_to_the_file() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("main.cfg");
    write_file(&input, "@include \"extra/*.cfg\"\nname = \"main\";");
    fs::create_dir(dir.path().join("extra")).expect("mkdir");
    write_file(&dir.path().join("extra").join("a.cfg"), "port = 8080;");

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["port", "--type", "int"])
        .assert()
        .success()
        .stdout("8080\n");
}

#[test]
fn include_dir_overrides_base() {
    let dir = TempDir::new().expect("tempdir");
    let shared = TempDir::new().expect("tempdir");
    let input = dir.path().join("main.cfg");
    write_file(&input, "@include \"shared.cfg\";");
    write_file(&shared.path().join("shared.cfg"), "level = 3;");

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .arg("--include-dir")
        .arg(shared.path())
        .args(["level", "-t", "int"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn syntax_error_exits_with_two() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("broken.cfg");
    write_file(&input, "a = 1;\nb = ;\n");

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .arg("a")
        .assert()
        .code(2)
        .stderr(contains("broken.cfg:2:5:").and(contains("cannot parse config")));
}

#[test]
fn missing_file_exits_with_two() {
    let dir = TempDir::new().expect("tempdir");

    cargo_bin_cmd!("cfgget")
        .arg(dir.path().join("absent.cfg"))
        .assert()
        .code(2)
        .stderr(contains("cannot read"));
}

#[test]
fn strict_mode_requires_terminators() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("loose.cfg");
    write_file(&input, "a = 1\nb = 2\n");

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["b", "-t", "int"])
        .assert()
        .success()
        .stdout("2\n");

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["b", "--strict"])
        .assert()
        .code(2)
        .stderr(contains("missing ';'"));
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let input = application(&dir);

    cargo_bin_cmd!("cfgget")
        .arg(&input)
        .args(["version", "-v"])
        .assert()
        .success()
        .stdout("1.0\n")
        .stderr(contains("parsing config file"));
}
