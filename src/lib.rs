//! 日志文件读取 MCP 工具核心库
//! 配置解析、文件扫描、协议层各自独立，便于测试。

pub mod config;
pub mod error;
pub mod model;
pub mod reader;
pub mod scanner;
pub mod mcp;
pub mod http;
