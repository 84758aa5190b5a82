use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use logreader_mcp::config::{Config, ServerMode};
use logreader_mcp::http::serve_http;
use logreader_mcp::mcp::run_stdio;
use logreader_mcp::scanner::LogScanner;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout 用于协议通信，日志只能写 stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = env::args().nth(1).map(PathBuf::from);
    let config = Config::resolve(settings.as_deref());
    info!(
        "search roots: {:?}, max_file_size: {}",
        config.search.log_paths, config.search.max_file_size
    );

    let scanner = Arc::new(LogScanner::new(config.search.clone()));

    eprintln!("Starting up logreader-mcp server now!");

    match config.server.mode {
        ServerMode::Stdio => run_stdio(scanner).await?,
        ServerMode::Http => serve_http(scanner, &config.server).await?,
        ServerMode::Both => {
            let server = config.server.clone();
            let http_scanner = scanner.clone();
            let http_task = tokio::spawn(async move { serve_http(http_scanner, &server).await });
            run_stdio(scanner).await?;
            // stdin 关闭后继续提供 HTTP 服务
            http_task.await??;
        }
    }

    Ok(())
}
