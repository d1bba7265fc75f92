//! Exit status and stdout of the `geochat` binary for the usage errors both
//! subcommands report.

use std::io::{ErrorKind, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::tempdir;

fn geochat(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_geochat"));
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("DEEPSEEK_MODEL")
        .env_remove("GEOCHAT_DATABASE")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &[u8]) -> Output {
    let mut child = cmd.stdin(Stdio::piped()).spawn().expect("spawn geochat");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input)
        .expect("write stdin");
    child.wait_with_output().expect("wait for geochat")
}

fn silent_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let url = format!("http://{}/v1", listener.local_addr().expect("addr"));
    (listener, url)
}

#[test]
fn ask_with_empty_stdin_exits_1_without_connecting() {
    let dir = tempdir().expect("tempdir");
    let (listener, base_url) = silent_listener();

    let mut cmd = geochat(dir.path());
    cmd.arg("ask")
        .env("DEEPSEEK_API_KEY", "test-key")
        .env("DEEPSEEK_BASE_URL", &base_url);
    let output = run_with_stdin(cmd, b"");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("Enter your prompt (Press Ctrl+D when finished):"),
        "{stdout}"
    );
    assert!(stdout.contains("Error: No prompt provided."), "{stdout}");
    assert!(!stdout.contains("Answer ---"), "{stdout}");
    let accepted = listener.accept();
    assert!(
        matches!(&accepted, Err(e) if e.kind() == ErrorKind::WouldBlock),
        "relay connected to the endpoint: {accepted:?}"
    );
}

#[test]
fn ask_without_api_key_exits_1_with_message_on_stdout() {
    let dir = tempdir().expect("tempdir");
    let (listener, base_url) = silent_listener();

    let mut cmd = geochat(dir.path());
    cmd.arg("ask")
        .env_remove("DEEPSEEK_API_KEY")
        .env("DEEPSEEK_BASE_URL", &base_url);
    let output = run_with_stdin(cmd, b"hello\n");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DEEPSEEK_API_KEY is not set"), "{stdout}");
    assert!(listener.accept().is_err());
}

#[test]
fn import_with_missing_shapefile_exits_1_before_opening_the_store() {
    let dir = tempdir().expect("tempdir");

    let output = geochat(dir.path())
        .args(["import-geom", "--database", "geochat.duckdb"])
        .stdin(Stdio::null())
        .output()
        .expect("run geochat");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("File not found: thai_tambons.shp"), "{stdout}");
    assert!(!dir.path().join("geochat.duckdb").exists());
}

#[test]
fn import_with_missing_database_exits_1() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("thai_tambons.shp"), b"").expect("shp");
    std::fs::write(dir.path().join("thai_tambons.dbf"), b"").expect("dbf");

    let output = geochat(dir.path())
        .args(["import-geom", "--database", "absent.duckdb"])
        .stdin(Stdio::null())
        .output()
        .expect("run geochat");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Database not found"), "{stdout}");
    assert!(!dir.path().join("absent.duckdb").exists());
}
