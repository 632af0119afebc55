//! Startup tests against the `konverter` binary.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tempfile::{NamedTempFile, TempDir};
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .unwrap()
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn konverter(config_path: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_konverter"));
    command
        .env("KONVERTER_CONFIG", config_path)
        .env("RUST_LOG", "error")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    command
}

/// Polls `path` until the server answers with JSON.
async fn get_json(port: u16, path: &str) -> Option<Value> {
    let url = format!("http://127.0.0.1:{}{}", port, path);
    for _ in 0..60 {
        if let Ok(response) = reqwest::get(&url).await {
            return response.json().await.ok();
        }
        sleep(Duration::from_millis(50)).await;
    }
    None
}

async fn stop(mut server: Child) {
    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_ffmpeg_keeps_server_up_but_not_ready() {
    let port = free_port();
    let out = TempDir::new().unwrap();
    let config = config_file(&format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[backend.local]
ffmpeg_path = "/nonexistent/ffmpeg"

[delivery]
output_dir = "{out}"

[feedback]
enabled = false
"#,
        port = port,
        out = out.path().display()
    ));

    let server = konverter(config.path()).spawn().unwrap();

    let health = get_json(port, "/api/v1/health")
        .await
        .expect("server did not answer");
    assert_eq!(health["backend"], "ffmpeg");
    assert_eq!(health["backend_ready"], false);

    let status = get_json(port, "/api/v1/status").await.unwrap();
    assert_eq!(status["state"], "idle");
    assert_eq!(status["status"]["severity"], "error");
    assert!(status["status"]["text"]
        .as_str()
        .unwrap()
        .starts_with("Conversion backend is not ready"));

    stop(server).await;
}

#[tokio::test]
async fn test_environment_overrides_file_values() {
    let port = free_port();
    let out = TempDir::new().unwrap();
    // The file port is never bound; the override wins.
    let config = config_file(&format!(
        r#"
[server]
host = "127.0.0.1"
port = 1

[delivery]
output_dir = "{}"
"#,
        out.path().display()
    ));

    let server = konverter(config.path())
        .env("KONVERTER_SERVER__PORT", port.to_string())
        .env("KONVERTER_ORCHESTRATOR__RESET_DELAY_MS", "500")
        .spawn()
        .unwrap();

    let config = get_json(port, "/api/v1/config")
        .await
        .expect("server did not answer on the overridden port");
    assert_eq!(config["server"]["port"], port);
    assert_eq!(config["orchestrator"]["reset_delay_ms"], 500);
    assert_eq!(config["backend"]["kind"], "local");

    stop(server).await;
}

#[tokio::test]
async fn test_bad_configuration_exits_with_error() {
    let cases = [
        (
            "remote backend without its section",
            "[backend]\nkind = \"remote\"\n",
        ),
        (
            "remote backend with a non-http url",
            "[backend]\nkind = \"remote\"\n\n[backend.remote]\nbase_url = \"ftp://host/x\"\n",
        ),
        ("bitrate without unit", "[settings]\nbitrate = \"192\"\n"),
        ("mono output", "[settings]\nchannels = 1\n"),
        ("port zero", "[server]\nport = 0\n"),
        ("not toml", "[server\n"),
    ];

    for (label, content) in cases {
        let config = config_file(content);
        let output = timeout(Duration::from_secs(5), konverter(config.path()).output())
            .await
            .expect("binary did not exit")
            .unwrap();
        assert!(!output.status.success(), "{} should not start", label);
    }

    let output = timeout(
        Duration::from_secs(5),
        konverter(Path::new("/nonexistent/config.toml")).output(),
    )
    .await
    .expect("binary did not exit")
    .unwrap();
    assert!(!output.status.success());
}
