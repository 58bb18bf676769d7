//! Stdio helpers for driving `docs-ls serve` in integration tests
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

const SERVER_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(200);

pub type ServerReader = BufReader<ChildStdout>;

pub fn spawn_server() -> Child {
    let bin_path = std::env::var("CARGO_BIN_EXE_docs-ls")
        .unwrap_or_else(|_| "target/debug/docs-ls".to_string());

    Command::new(bin_path)
        .args(["serve", "--log-level", "warn"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn language server")
}

pub fn send_lsp_message(child: &mut Child, message: &Value) {
    let body = message.to_string();
    let request = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);

    let stdin = child.stdin.as_mut().expect("Child stdin should be available");
    stdin
        .write_all(request.as_bytes())
        .expect("Failed to write request");
    stdin.flush().expect("Failed to flush stdin");
}

pub fn send_request(child: &mut Child, id: u64, method: &str, params: Value) {
    send_lsp_message(
        child,
        &json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }),
    );
}

pub fn send_notification(child: &mut Child, method: &str, params: Value) {
    send_lsp_message(child, &json!({ "jsonrpc": "2.0", "method": method, "params": params }));
}

fn read_content_length_header(reader: &mut ServerReader) -> usize {
    let start_time = Instant::now();
    let mut content_length = None;

    loop {
        if start_time.elapsed() > SERVER_TIMEOUT {
            panic!("Timeout waiting for response headers");
        }

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => panic!("Unexpected EOF while reading headers"),
            Ok(_) if line.trim().is_empty() => break,
            Ok(_) => {
                if let Some(length) = line.strip_prefix("Content-Length:") {
                    content_length =
                        Some(length.trim().parse::<usize>().expect("Invalid Content-Length header"));
                }
            }
            Err(e) => panic!("Error reading headers: {}", e),
        }
    }

    content_length.expect("Missing Content-Length header")
}

/// Read one framed message
pub fn read_message(reader: &mut ServerReader) -> Value {
    let content_length = read_content_length_header(reader);
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("Failed to read response body");

    let body = String::from_utf8(body).expect("Response body should be valid UTF-8");
    serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("Invalid JSON response: {}\nBody: {}", e, body))
}

/// Read messages up to and including the response with `expected_id`
pub fn read_until_response(reader: &mut ServerReader, expected_id: u64) -> Vec<Value> {
    let mut messages = Vec::new();
    loop {
        let message = read_message(reader);
        let done = message.get("id").and_then(|id| id.as_u64()) == Some(expected_id)
            && message.get("method").is_none();
        messages.push(message);
        if done {
            return messages;
        }
    }
}

/// The response with `expected_id`, skipping notifications
pub fn read_response(reader: &mut ServerReader, expected_id: u64) -> Value {
    read_until_response(reader, expected_id)
        .pop()
        .expect("Response should be present")
}

pub fn read_until_method(reader: &mut ServerReader, method: &str) -> Value {
    loop {
        let message = read_message(reader);
        if message.get("method").and_then(|m| m.as_str()) == Some(method) {
            return message;
        }
    }
}

/// Send `initialize` and `initialized`, returning the stdout reader and the
/// initialize response
pub fn start_session(server: &mut Child, capabilities: Value) -> (ServerReader, Value) {
    send_request(
        server,
        1,
        "initialize",
        json!({
            "processId": null,
            "rootUri": null,
            "capabilities": capabilities,
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    );

    let stdout = server.stdout.take().expect("Child stdout should be available");
    let mut reader = BufReader::new(stdout);
    let response = read_response(&mut reader, 1);

    send_notification(server, "initialized", json!({}));
    (reader, response)
}

pub fn open_document(server: &mut Child, uri: &str, text: &str) {
    send_notification(
        server,
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": uri,
                "languageId": "markdown",
                "version": 1,
                "text": text
            }
        }),
    );
}

pub fn shutdown_server(mut child: Child) {
    // Closing stdin ends the session
    drop(child.stdin.take());
    std::thread::sleep(SHUTDOWN_GRACE_PERIOD);

    match child.try_wait() {
        Ok(Some(status)) => {
            if !status.success() {
                eprintln!("Server exited with non-zero status: {:?}", status);
            }
        }
        Ok(None) => {
            eprintln!("Server didn't exit gracefully, forcing termination");
            let _ = child.kill();
            let _ = child.wait();
        }
        Err(e) => panic!("Error checking server status: {}", e),
    }
}
