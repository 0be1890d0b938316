//! End-to-end runs of the ysds-lint binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const UNSORTED: &str = "<?php\n$a = ['b', 'a'];\necho implode(',', $a);\n";
const SORTED: &str = "<?php\n$a = ['a', 'b'];\necho implode(',', $a);\n";

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".ysds-lint.toml"),
        "[rules]\nenabled = [\"YSDS/ordered_array\"]\n\n[paths]\ninclude = [\"src\"]\n",
    )
    .unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();
    fs::write(temp.path().join("src/a.php"), UNSORTED).unwrap();
    temp
}

fn ysds_lint(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ysds-lint"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_check_mode_reports_changes() {
    let temp = project();

    let output = ysds_lint(temp.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+ $a = ['a', 'b'];"), "{stdout}");
    assert_eq!(fs::read_to_string(temp.path().join("src/a.php")).unwrap(), UNSORTED);
}

#[test]
fn test_fix_mode_rewrites_files() {
    let temp = project();

    let output = ysds_lint(temp.path(), &["--fix"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(temp.path().join("src/a.php")).unwrap(), SORTED);

    let again = ysds_lint(temp.path(), &[]);
    assert_eq!(again.status.code(), Some(0));
}

#[test]
fn test_json_output() {
    let temp = project();

    let output = ysds_lint(temp.path(), &["--format", "json", "src"]);

    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["files_with_changes"], 1);
    assert_eq!(json["files"][0]["edits"][0]["rule"], "YSDS/ordered_array");
    assert_eq!(json["files"][0]["edits"][0]["line"], 2);
}

#[test]
fn test_diff_output() {
    let temp = project();

    let output = ysds_lint(temp.path(), &["--format", "diff"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-$a = ['b', 'a'];\n+$a = ['a', 'b'];\n"), "{stdout}");
}

#[test]
fn test_rule_flag_overrides_config() {
    let temp = project();

    let output = ysds_lint(temp.path(), &["--rule", "YSDS/ban_types"]);
    assert_eq!(output.status.code(), Some(0));

    let unknown = ysds_lint(temp.path(), &["--rule", "YSDS/nope"]);
    assert_eq!(unknown.status.code(), Some(1));
}

#[test]
fn test_php_cs_fixer_config() {
    let temp = project();
    fs::write(
        temp.path().join(".php-cs-fixer.dist.php"),
        "<?php\nreturn (new PhpCsFixer\\Config())\n    ->setRules(['YSDS/replace_strings' => ['replacements' => ['implode' => 'join']]])\n    ->setFinder(PhpCsFixer\\Finder::create()->in(__DIR__ . '/src'));\n",
    )
    .unwrap();

    let output = ysds_lint(temp.path(), &["--fix", "--config", ".php-cs-fixer.dist.php"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(temp.path().join("src/a.php")).unwrap(),
        "<?php\n$a = ['b', 'a'];\necho join(',', $a);\n"
    );
}

#[test]
fn test_list_rules() {
    let temp = TempDir::new().unwrap();

    let output = ysds_lint(temp.path(), &["--list-rules"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("YSDS/variable_never_read"));
    assert!(stdout.contains("YSDS/php_unit_assert_same"));
}
