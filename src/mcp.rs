use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::error::{LogReaderError, Result};
use crate::model::ScanResult;
use crate::scanner::LogScanner;

pub const SERVER_NAME: &str = "logreader";
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const TOOL_NAME: &str = "get_logfiles";

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct GetLogfilesArgs {
    #[serde(default)]
    filename_search_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub async fn run_stdio(scanner: Arc<LogScanner>) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(scanner, stdin, stdout).await
}

/// Newline-delimited JSON-RPC loop. Runs until the input side closes.
pub async fn serve_lines<R, W>(scanner: Arc<LogScanner>, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let resp = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(req) => process_request(scanner.clone(), req).await,
            Err(e) => Some(error_response(Value::Null, -32700, format!("parse error: {e}"))),
        };
        if let Some(resp) = resp {
            write_response(&mut output, &resp).await?;
        }
    }

    Ok(())
}

/// Handles one request. `None` means nothing should be written back
/// (the request was a notification).
pub async fn process_request(scanner: Arc<LogScanner>, req: RpcRequest) -> Option<RpcResponse> {
    let method = req.method.clone();
    debug!("rpc method {method}");
    let resp = match method.as_str() {
        "initialize" => handle_initialize(&req),
        m if m.starts_with("notifications/") => {
            if req.id.is_null() {
                return None;
            }
            ok_response(req.id, json!({}))
        }
        "ping" => ok_response(req.id, json!({})),
        "tools/list" | "list_tools" => handle_list_tools(&req),
        "tools/call" => handle_tool_call(scanner, req).await,
        TOOL_NAME => handle_get_logfiles(scanner, req).await,
        _ => error_response(req.id, -32601, format!("method not found: {method}")),
    };
    Some(resp)
}

fn handle_initialize(req: &RpcRequest) -> RpcResponse {
    ok_response(
        req.id.clone(),
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_list_tools(req: &RpcRequest) -> RpcResponse {
    let tools = vec![json!({
        "name": TOOL_NAME,
        "description": "Get logfiles from the local system. Searches the configured log directories recursively and returns each matching file's content, capped per file.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "filename_search_string": {
                    "type": "string",
                    "description": "Substring to look for in log file names (optional, case-sensitive)."
                }
            }
        }
    })];

    ok_response(req.id.clone(), json!({ "tools": tools }))
}

async fn handle_tool_call(scanner: Arc<LogScanner>, req: RpcRequest) -> RpcResponse {
    let params: ToolCallParams = match serde_json::from_value(req.params) {
        Ok(p) => p,
        Err(e) => return error_response(req.id, -32602, format!("invalid params: {e}")),
    };
    if params.name != TOOL_NAME {
        return error_response(req.id, -32602, format!("unknown tool: {}", params.name));
    }
    let args = match parse_args(params.arguments) {
        Ok(a) => a,
        Err(e) => return error_response(req.id, -32602, e.to_string()),
    };

    match scan_payload(scanner, args.filename_search_string).await {
        Ok(payload) => ok_response(
            req.id,
            json!({
                "content": [{ "type": "text", "text": payload }],
                "isError": false
            }),
        ),
        Err(e) => error_response(req.id, -32603, e.to_string()),
    }
}

/// Bare-method form: the result is the payload string itself.
async fn handle_get_logfiles(scanner: Arc<LogScanner>, req: RpcRequest) -> RpcResponse {
    let args = match parse_args(req.params) {
        Ok(a) => a,
        Err(e) => return error_response(req.id, -32602, e.to_string()),
    };
    match scan_payload(scanner, args.filename_search_string).await {
        Ok(payload) => ok_response(req.id, Value::String(payload)),
        Err(e) => error_response(req.id, -32603, e.to_string()),
    }
}

fn parse_args(raw: Value) -> Result<GetLogfilesArgs> {
    if raw.is_null() {
        return Ok(GetLogfilesArgs::default());
    }
    serde_json::from_value(raw)
        .map_err(|e| LogReaderError::InvalidRequest(format!("invalid arguments: {e}")))
}

/// The walk is blocking filesystem work; keep it off the async workers.
pub async fn run_scan(scanner: Arc<LogScanner>, term: Option<String>) -> Result<ScanResult> {
    tokio::task::spawn_blocking(move || scanner.scan(term.as_deref()))
        .await
        .map_err(|e| {
            error!("scan task failed: {e}");
            LogReaderError::ScanTask(e.to_string())
        })
}

async fn scan_payload(scanner: Arc<LogScanner>, term: Option<String>) -> Result<String> {
    run_scan(scanner, term).await?.to_payload()
}

async fn write_response<W: AsyncWrite + Unpin>(output: &mut W, resp: &RpcResponse) -> Result<()> {
    let line = serde_json::to_string(resp).unwrap_or_else(|_| "{}".to_string());
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

fn ok_response(id: Value, result: Value) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: Some(result),
        error: None,
    }
}

pub fn error_response(id: Value, code: i32, message: String) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(RpcError { code, message }),
    }
}
