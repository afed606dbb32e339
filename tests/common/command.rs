use crate::common::file::{FileSpec, write_file};
use crate::common::redirect_temp_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn work_dir() -> TempDir {
    redirect_temp_dir();
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn greeter_before() -> String {
    r#"fn main() {
    let name = read_name();
    let greeting = format!("Hello, {name}!");
    println!("{greeting}");
    println!("{greeting}");
    println!("{greeting}");
    log_visit(&name);
    println!("bye");
}

fn read_name() -> String {
    "world".to_string()
}
"#
    .to_string()
}

#[fixture]
pub fn greeter_after() -> String {
    r#"fn main() {
    let name = read_name();
    let greeting = format!("Hello, {name}!");
    println!("{greeting}");
    record_visit(&name);
    println!("bye");
}

fn read_name() -> String {
    "world".to_string()
}
"#
    .to_string()
}

/// The hunk body `stitch diff` prints for the greeter pair with the
/// default context of 3
#[fixture]
pub fn greeter_hunks() -> String {
    "@@ -2,9 +2,7 @@\n     let name = read_name();\n     let greeting = format!(\"Hello, {name}!\");\n     println!(\"{greeting}\");\n-    println!(\"{greeting}\");\n-    println!(\"{greeting}\");\n-    log_visit(&name);\n+    record_visit(&name);\n     println!(\"bye\");\n }\n \n"
    .to_string()
}

#[fixture]
pub fn diff_work_dir(work_dir: TempDir, greeter_before: String, greeter_after: String) -> TempDir {
    let old_file = FileSpec::new(work_dir.path().join("old.txt"), greeter_before);
    write_file(old_file);

    let new_file = FileSpec::new(work_dir.path().join("new.txt"), greeter_after);
    write_file(new_file);

    work_dir
}

pub fn run_stitch_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("stitch").expect("Failed to find stitch binary");
    cmd.envs(vec![("NO_PAGER", "1")]);
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}
