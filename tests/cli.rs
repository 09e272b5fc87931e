//! Command-line behaviour of the `teapot-decor` binary

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const PAGE: &str = "<html><head><title>T</title></head><body><footer class=\"inner\"><p>old</p></footer></body></html>";

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_teapot-decor"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("teapot-decor-cli-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(cmd: &mut Command) -> Output {
    let out = cmd.output().expect("failed to run teapot-decor");
    assert!(
        out.status.success(),
        "teapot-decor failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    out
}

fn decorate_twice(name: &str, extra: &[&str]) -> String {
    let dir = scratch_dir(name);
    let input = dir.join("index.html");
    let once = dir.join("once.html");
    let twice = dir.join("twice.html");
    std::fs::write(&input, PAGE).unwrap();

    run(bin().arg("decorate").arg(&input).arg("-o").arg(&once).args(extra));
    run(bin().arg("decorate").arg(&once).arg("-o").arg(&twice).args(extra));

    let html = std::fs::read_to_string(&twice).unwrap();
    std::fs::remove_dir_all(&dir).ok();
    html
}

#[test]
fn decorate_file_twice_injects_once() {
    let html = decorate_twice("guarded", &[]);
    assert_eq!(html.matches("<img ").count(), 1);
    assert_eq!(html.matches("<style ").count(), 1);
    assert!(html.contains("src=\"./assets/logo.gif\""));
}

#[test]
fn allow_duplicates_injects_every_time() {
    let html = decorate_twice("duplicates", &["--allow-duplicates"]);
    assert_eq!(html.matches("<img ").count(), 2);
    assert_eq!(html.matches("<style>").count(), 2);
}

#[test]
fn decorate_reads_stdin_and_writes_stdout() {
    let mut child = bin()
        .args(["decorate", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn teapot-decor");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(PAGE.as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    let html = String::from_utf8(out.stdout).unwrap();
    assert!(html.contains("alt=\"Teapot AI Logo\""));
    assert!(html.contains("#forkme_banner"));
}

#[test]
fn inspect_prints_rendered_footer() {
    let dir = scratch_dir("inspect");
    let input = dir.join("index.html");
    std::fs::write(&input, PAGE).unwrap();

    let out = run(bin().arg("inspect").arg(&input));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Title: T"));
    assert!(stdout.contains("418 I'm a teapot (HTCPCP/1.0) | Contact Us | Copyright 2025"));
    assert!(!stdout.contains("old"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn css_uses_config_file() {
    let dir = scratch_dir("css");
    let config = dir.join("branding.json");
    std::fs::write(&config, r#"{"overrides": {"footer_text": "Steeped since 2026"}}"#).unwrap();

    let out = run(bin().arg("css").arg("--config").arg(&config));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("content: \"Steeped since 2026\";"));
    assert!(stdout.contains("#forkme_banner {"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_input_exits_with_error() {
    let dir = scratch_dir("missing");
    let out = bin()
        .arg("decorate")
        .arg(dir.join("does-not-exist.html"))
        .output()
        .expect("failed to run teapot-decor");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error:"), "stderr was: {}", stderr);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_config_exits_with_error() {
    let dir = scratch_dir("badconfig");
    let config = dir.join("branding.json");
    std::fs::write(&config, r#"{"overrides": {"banner_id": "x}body{"}}"#).unwrap();

    let out = bin()
        .arg("css")
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run teapot-decor");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
    std::fs::remove_dir_all(&dir).ok();
}
