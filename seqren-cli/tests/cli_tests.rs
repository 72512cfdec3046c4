use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// `seqren` running in `dir` with its undo log inside `dir`.
fn seqren(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("seqren").unwrap();
    cmd.current_dir(dir.path())
        .env("SEQREN_UNDO_LOG", dir.path().join("test.undo.log"))
        .env_remove("NO_COLOR")
        .arg("--on-error")
        .arg("abort");
    cmd
}

fn photos(dir: &TempDir) {
    dir.child("c.jpg").write_str("c").unwrap();
    dir.child("a.jpg").write_str("a").unwrap();
    dir.child("b.jpg").write_str("b").unwrap();
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("seqren").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sequence-numbered batch renames"));
}

#[test]
fn test_version_subcommand() {
    let mut cmd = Command::cargo_bin("seqren").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seqren 0.1.0"));
}

#[test]
fn test_version_subcommand_json() {
    let mut cmd = Command::cargo_bin("seqren").unwrap();
    cmd.args(["version", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"\{"name":"seqren","version":"0\.1\.0"\}"#).unwrap());
}

#[test]
fn test_rename_missing_args() {
    let mut cmd = Command::cargo_bin("seqren").unwrap();
    cmd.arg("rename")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_rename_dry_run_changes_nothing() {
    let temp = TempDir::new().unwrap();
    photos(&temp);

    seqren(&temp)
        .args(["rename", "c.jpg", "a.jpg", "b.jpg", "--pattern", "IMG_###", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IMG_001.jpg"))
        .stdout(predicate::str::contains("Dry run: 3 files would be renamed"));

    temp.child("a.jpg").assert(predicate::path::exists());
    temp.child("IMG_001.jpg").assert(predicate::path::missing());
    temp.child("test.undo.log").assert(predicate::path::missing());
}

#[test]
fn test_rename_undo_redo() {
    let temp = TempDir::new().unwrap();
    photos(&temp);

    seqren(&temp)
        .args(["rename", "c.jpg", "a.jpg", "b.jpg", "-p", "IMG_###"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 3 files"));

    // Counter order follows the order on the command line.
    temp.child("IMG_001.jpg").assert("c");
    temp.child("IMG_002.jpg").assert("a");
    temp.child("IMG_003.jpg").assert("b");
    temp.child("test.undo.log")
        .assert(predicate::str::starts_with("<RENAME [3] "));

    seqren(&temp)
        .arg("undo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Undid rename"));
    temp.child("a.jpg").assert("a");
    temp.child("IMG_001.jpg").assert(predicate::path::missing());

    seqren(&temp).arg("redo").assert().success();
    temp.child("IMG_001.jpg").assert("c");
    temp.child("a.jpg").assert(predicate::path::missing());
}

#[test]
fn test_rename_swap_through_intermediate() {
    let temp = TempDir::new().unwrap();
    temp.child("1.txt").write_str("one").unwrap();
    temp.child("2.txt").write_str("two").unwrap();

    // 2.txt becomes 1.txt while 1.txt becomes 2.txt.
    seqren(&temp)
        .args(["rename", "2.txt", "1.txt", "-p", "#", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""staged":1"#));

    temp.child("1.txt").assert("two");
    temp.child("2.txt").assert("one");
    temp.child("2[1].txt").assert(predicate::path::missing());
}

#[test]
fn test_rename_json_output() {
    let temp = TempDir::new().unwrap();
    photos(&temp);

    let output = seqren(&temp)
        .args(["rename", "a.jpg", "b.jpg", "-p", "shot_%02d", "--start", "7", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["operation"], "rename");
    assert_eq!(json["renames"].as_array().unwrap().len(), 2);
    assert_eq!(json["next_counter"], 9);
    temp.child("shot_07.jpg").assert("a");
    temp.child("shot_08.jpg").assert("b");
}

#[test]
fn test_rename_recursive() {
    let temp = TempDir::new().unwrap();
    temp.child("album/b.png").write_str("b").unwrap();
    temp.child("album/a.png").write_str("a").unwrap();

    seqren(&temp)
        .args(["rename", "-r", "album", "-p", "pic_#"])
        .assert()
        .success();

    temp.child("album/pic_1.png").assert("a");
    temp.child("album/pic_2.png").assert("b");
}

#[test]
fn test_rename_keeps_foreign_files() {
    let temp = TempDir::new().unwrap();
    temp.child("a.txt").write_str("a").unwrap();
    temp.child("n_1.txt").write_str("foreign").unwrap();

    seqren(&temp).args(["rename", "a.txt", "-p", "n_#"]).assert().success();

    temp.child("n_1.txt").assert("foreign");
    temp.child("n_1_(2).txt").assert("a");
}

#[test]
fn test_invalid_pattern_exit_code() {
    let temp = TempDir::new().unwrap();
    temp.child("a.txt").write_str("a").unwrap();

    seqren(&temp)
        .args(["rename", "a.txt", "-p", "static"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid pattern"));
    temp.child("a.txt").assert(predicate::path::exists());
}

#[test]
fn test_missing_file_exit_code() {
    let temp = TempDir::new().unwrap();

    seqren(&temp)
        .args(["rename", "nope.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("File not found: nope.txt"));
}

#[test]
fn test_undo_with_empty_history() {
    let temp = TempDir::new().unwrap();

    seqren(&temp)
        .arg("undo")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Nothing to undo"));
}

#[test]
fn test_history_lists_batches() {
    let temp = TempDir::new().unwrap();
    photos(&temp);

    seqren(&temp).args(["rename", "a.jpg", "b.jpg", "-p", "x#"]).assert().success();

    let output = seqren(&temp).args(["history", "--output", "json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["stack"], "undo");
    assert_eq!(entries[0]["kind"], "RENAME");
    assert_eq!(entries[0]["commands"], 2);

    seqren(&temp).arg("undo").assert().success();
    seqren(&temp)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("redo"));
}

#[test]
fn test_touch_readonly_and_undo() {
    let temp = TempDir::new().unwrap();
    temp.child("doc.txt").write_str("text").unwrap();
    let path = temp.path().join("doc.txt");

    seqren(&temp)
        .args(["touch", "doc.txt", "--readonly", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("read-only"));
    assert!(!std::fs::metadata(&path).unwrap().permissions().readonly());

    seqren(&temp)
        .args(["touch", "doc.txt", "--readonly", "--modified", "2024-01-02T03:04:05Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Touched 1 files"));
    let metadata = std::fs::metadata(&path).unwrap();
    assert!(metadata.permissions().readonly());
    let modified: chrono::DateTime<chrono::Utc> = metadata.modified().unwrap().into();
    assert_eq!(modified.to_rfc3339(), "2024-01-02T03:04:05+00:00");

    seqren(&temp).arg("undo").assert().success();
    assert!(!std::fs::metadata(&path).unwrap().permissions().readonly());
}

#[test]
fn test_touch_bad_time_is_rejected() {
    let temp = TempDir::new().unwrap();
    temp.child("doc.txt").write_str("text").unwrap();

    seqren(&temp)
        .args(["touch", "doc.txt", "--modified", "whenever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time"));
}

#[test]
fn test_next_seq() {
    let temp = TempDir::new().unwrap();
    temp.child("shot.png").write_str("").unwrap();
    temp.child("pic1.png").write_str("").unwrap();

    seqren(&temp)
        .args(["next-seq", "shot.png", "-p", "pic#"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_parse_seq() {
    let temp = TempDir::new().unwrap();

    seqren(&temp)
        .args(["parse-seq", "IMG_0042.jpg", "-p", "IMG_####"])
        .assert()
        .success()
        .stdout("42\n");

    seqren(&temp)
        .args(["parse-seq", "holiday.jpg", "-p", "IMG_####", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""counter":null"#));
}

#[test]
fn test_operation_log_file() {
    let temp = TempDir::new().unwrap();
    photos(&temp);

    seqren(&temp)
        .args(["--log-file", "ops.log", "rename", "a.jpg", "-p", "z#"])
        .assert()
        .success();

    temp.child("ops.log")
        .assert(predicate::str::contains("Renaming 1 files with pattern 'z#'"));
}

#[test]
fn test_operation_log_enabled_in_config() {
    let temp = TempDir::new().unwrap();
    photos(&temp);
    temp.child(".seqren/config.toml")
        .write_str("[log]\nenabled = true\n")
        .unwrap();

    seqren(&temp).args(["rename", "b.jpg", "-p", "y#"]).assert().success();

    temp.child(".seqren/operations.log")
        .assert(predicate::str::contains("Renaming 1 files with pattern 'y#'"));
}

#[test]
fn test_completions_to_stdout() {
    let mut cmd = Command::cargo_bin("seqren").unwrap();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seqren"));
}
