#![allow(dead_code)]

use drawing_infernum::BackendConfig;
use mockito::{Mock, ServerGuard};
use std::{
    io::{Read, Write},
    net::TcpListener,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

pub const TAGS_BODY: &str = r#"{"models":[{"name":"llava:latest"},{"name":"mistral:7b"},{"name":"moondream:latest"}]}"#;

pub fn config_for(base_url: impl Into<String>) -> BackendConfig {
    BackendConfig::default().with_base_url(base_url)
}

pub async fn mock_tags(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TAGS_BODY)
        .create_async()
        .await
}

pub fn write_image(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write test image");
    path
}

/// Address nothing is listening on.
pub fn unreachable_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

/// Backend that answers the model list but never answers a generation.
pub fn stalling_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stalling backend");
    let addr = listener.local_addr().expect("stalling backend address");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = [0u8; 8192];
                let n = stream.read(&mut buf).unwrap_or(0);
                if buf[..n].starts_with(b"GET /api/tags") {
                    let body = r#"{"models":[]}"#;
                    let reply = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(reply.as_bytes());
                } else {
                    thread::sleep(Duration::from_secs(30));
                }
            });
        }
    });

    format!("http://{addr}")
}
