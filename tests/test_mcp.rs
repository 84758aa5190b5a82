use std::fs;
use std::sync::Arc;

use logreader_mcp::config::SearchConfig;
use logreader_mcp::mcp::serve_lines;
use logreader_mcp::model::ScanResult;
use logreader_mcp::scanner::LogScanner;
use serde_json::Value;
use tempfile::tempdir;

async fn run_session(scanner: Arc<LogScanner>, input: &str) -> Vec<Value> {
    let mut output: Vec<u8> = Vec::new();
    serve_lines(scanner, input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_stdio_session_end_to_end() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    fs::write(root.join("server.log"), "boot ok\n").unwrap();
    fs::write(root.join("notes.txt"), "ignore\n").unwrap();

    let cfg = SearchConfig::new(vec![root.clone()], 1024).unwrap();
    let scanner = Arc::new(LogScanner::with_fallback_root(cfg, root.clone()));

    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_logfiles","arguments":{"filename_search_string":"server"}}}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"get_logfiles","params":{"filename_search_string":""}}"#,
        "this is not json",
    ]
    .join("\n");

    let responses = run_session(scanner, &input).await;
    assert_eq!(responses.len(), 4);

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "logreader");

    assert_eq!(responses[1]["id"], 2);
    let text = responses[1]["result"]["content"][0]["text"].as_str().unwrap();
    let filtered: ScanResult = serde_json::from_str(text).unwrap();
    assert_eq!(filtered.files.len(), 1);
    assert_eq!(filtered.files[0].path, root.join("server.log"));

    assert_eq!(responses[2]["id"], 3);
    let all: ScanResult = serde_json::from_str(responses[2]["result"].as_str().unwrap()).unwrap();
    assert_eq!(all.files.len(), 2);

    assert_eq!(responses[3]["error"]["code"], -32700);
}

#[tokio::test]
async fn test_missing_arguments_match_everything() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    fs::write(root.join("a.log"), "a").unwrap();
    fs::write(root.join("b.out"), "b").unwrap();

    let cfg = SearchConfig::new(vec![root.clone()], 1024).unwrap();
    let scanner = Arc::new(LogScanner::with_fallback_root(cfg, root));

    let input = r#"{"jsonrpc":"2.0","id":"x","method":"tools/call","params":{"name":"get_logfiles"}}"#;
    let responses = run_session(scanner, input).await;
    assert_eq!(responses[0]["id"], "x");
    assert_eq!(responses[0]["result"]["isError"], false);
    let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
    let result: ScanResult = serde_json::from_str(text).unwrap();
    assert_eq!(result.files.len(), 2);
}
