use assert_fs::TempDir;
use predicates::prelude::predicate;
use rstest::rstest;

mod common;

use crate::common::command::{
    diff_work_dir, greeter_after, greeter_hunks, run_stitch_command, work_dir,
};
use crate::common::file::{FileSpec, write_file, write_generated_file};

#[rstest]
fn show_unified_diff_for_a_modified_file(
    diff_work_dir: TempDir,
    greeter_hunks: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected_output = format!("--- a/old.txt\n+++ b/new.txt\n{greeter_hunks}");

    let actual_output = run_stitch_command(diff_work_dir.path(), &["diff", "old.txt", "new.txt"])
        .assert()
        .success();
    let stdout = actual_output.get_output().stdout.clone();
    let actual_output = String::from_utf8(stdout)?;

    pretty_assertions::assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn patience_diff_agrees_with_myers_on_duplicate_heavy_input(
    diff_work_dir: TempDir,
    greeter_hunks: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected_output = format!("--- a/old.txt\n+++ b/new.txt\n{greeter_hunks}");

    let actual_output = run_stitch_command(
        diff_work_dir.path(),
        &["diff", "old.txt", "new.txt", "--patience"],
    )
    .assert()
    .success();
    let stdout = actual_output.get_output().stdout.clone();
    let actual_output = String::from_utf8(stdout)?;

    pretty_assertions::assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn a_narrow_context_tightens_the_hunk_window(
    diff_work_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected_output = "--- a/old.txt\n+++ b/new.txt\n@@ -4,5 +4,3 @@\n     println!(\"{greeting}\");\n-    println!(\"{greeting}\");\n-    println!(\"{greeting}\");\n-    log_visit(&name);\n+    record_visit(&name);\n     println!(\"bye\");\n";

    let actual_output = run_stitch_command(
        diff_work_dir.path(),
        &["diff", "old.txt", "new.txt", "--context", "1"],
    )
    .assert()
    .success();
    let stdout = actual_output.get_output().stdout.clone();
    let actual_output = String::from_utf8(stdout)?;

    pretty_assertions::assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn identical_files_print_a_notice_instead_of_a_diff(
    work_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let generated = write_generated_file(work_dir.path());
    let name = generated
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap()
        .to_string();
    let copy = FileSpec::new(work_dir.path().join("copy.txt"), generated.content.clone());
    write_file(copy);

    run_stitch_command(work_dir.path(), &["diff", &name, "copy.txt"])
        .assert()
        .success()
        .stdout(predicate::eq(format!(
            "files {name} and copy.txt are identical\n"
        )));

    Ok(())
}

#[rstest]
fn the_stat_flag_prints_change_counts_instead_of_hunks(
    diff_work_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_stitch_command(
        diff_work_dir.path(),
        &["diff", "old.txt", "new.txt", "--stat"],
    )
    .assert()
    .success()
    .stdout(predicate::eq("1 additions, 3 deletions\n"));

    Ok(())
}

#[rstest]
fn diff_fails_for_a_missing_file(work_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_stitch_command(work_dir.path(), &["diff", "missing.txt", "other.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read missing.txt"));

    Ok(())
}

#[rstest]
fn apply_prints_the_patched_content_to_stdout(
    diff_work_dir: TempDir,
    greeter_hunks: String,
    greeter_after: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let patch = FileSpec::new(
        diff_work_dir.path().join("patch.diff"),
        format!("--- a/old.txt\n+++ b/new.txt\n{greeter_hunks}"),
    );
    write_file(patch);

    run_stitch_command(diff_work_dir.path(), &["apply", "old.txt", "patch.diff"])
        .assert()
        .success()
        .stdout(predicate::eq(greeter_after));

    Ok(())
}

#[rstest]
fn apply_writes_the_patched_file_with_the_output_flag(
    diff_work_dir: TempDir,
    greeter_hunks: String,
    greeter_after: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let patch = FileSpec::new(
        diff_work_dir.path().join("patch.diff"),
        format!("--- a/old.txt\n+++ b/new.txt\n{greeter_hunks}"),
    );
    write_file(patch);

    run_stitch_command(
        diff_work_dir.path(),
        &["apply", "old.txt", "patch.diff", "-o", "out.txt"],
    )
    .assert()
    .success()
    .stdout(predicate::eq("patched old.txt -> out.txt\n"));

    let patched = std::fs::read_to_string(diff_work_dir.path().join("out.txt"))?;
    pretty_assertions::assert_eq!(patched, greeter_after);

    Ok(())
}

#[rstest]
fn apply_rejects_a_patch_with_no_hunks(
    work_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    write_file(FileSpec::new(
        work_dir.path().join("target.txt"),
        "hello\n".to_string(),
    ));
    write_file(FileSpec::new(
        work_dir.path().join("notes.txt"),
        "these are notes\nnot a diff\n".to_string(),
    ));

    run_stitch_command(work_dir.path(), &["apply", "target.txt", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no hunks found in notes.txt"));

    Ok(())
}

#[rstest]
fn apply_rejects_a_patch_against_the_wrong_target(
    diff_work_dir: TempDir,
    greeter_hunks: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let patch = FileSpec::new(
        diff_work_dir.path().join("patch.diff"),
        format!("--- a/old.txt\n+++ b/new.txt\n{greeter_hunks}"),
    );
    write_file(patch);

    // the patch was computed against old.txt, so new.txt cannot take it
    run_stitch_command(diff_work_dir.path(), &["apply", "new.txt", "patch.diff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "could not apply patch.diff to new.txt",
        ));

    Ok(())
}

#[rstest]
fn stats_summarizes_a_patch_file(
    diff_work_dir: TempDir,
    greeter_hunks: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let patch = FileSpec::new(
        diff_work_dir.path().join("patch.diff"),
        format!("--- a/old.txt\n+++ b/new.txt\n{greeter_hunks}"),
    );
    write_file(patch);

    run_stitch_command(diff_work_dir.path(), &["stats", "patch.diff"])
        .assert()
        .success()
        .stdout(predicate::eq("1 additions, 3 deletions, 4 changes\n"));

    Ok(())
}

#[rstest]
fn diff_output_round_trips_through_apply(
    diff_work_dir: TempDir,
    greeter_after: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let diff_output = run_stitch_command(diff_work_dir.path(), &["diff", "old.txt", "new.txt"])
        .assert()
        .success();
    let patch_text = diff_output.get_output().stdout.clone();
    std::fs::write(diff_work_dir.path().join("round.diff"), patch_text)?;

    run_stitch_command(diff_work_dir.path(), &["apply", "old.txt", "round.diff"])
        .assert()
        .success()
        .stdout(predicate::eq(greeter_after));

    Ok(())
}
