//! Model Context Protocol server: one tool, `run_analyzer`.
//!
//! Serves over stdio so AI assistants can trigger an analysis and get a
//! text summary back. Errors come back as `isError` results with the
//! serialized analyzer error, never as a dropped connection.

use std::path::PathBuf;

use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;

use carto_core::{analyze, AnalyzeOptions};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunAnalyzerParams {
    /// Directory to analyze
    pub directory: String,

    /// Comma-separated extensions to analyze (overrides defaults)
    #[serde(default)]
    pub extensions: Option<String>,

    /// Additional ignore globs, appended to the built-in list
    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    /// Re-apply store schema before writing
    #[serde(default)]
    pub update_schema: Option<bool>,

    /// Delete all nodes and relationships before writing
    #[serde(default)]
    pub reset_db: Option<bool>,
}

#[derive(Clone)]
pub struct CartoMcpServer {
    tool_router: ToolRouter<Self>,
}

impl Default for CartoMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl CartoMcpServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    /// Analyze a source tree into the code knowledge graph
    #[tool(
        description = "Analyze a multi-language source tree and persist the resulting code knowledge graph. Returns a summary of scanned files and written nodes/relationships."
    )]
    async fn run_analyzer(
        &self,
        params: Parameters<RunAnalyzerParams>,
    ) -> Result<CallToolResult, McpError> {
        let directory = PathBuf::from(&params.0.directory);

        let mut options = AnalyzeOptions::find_and_load(&directory)
            .map_err(|e| McpError::internal_error(format!("failed to load options: {e}"), None))?;
        if let Some(list) = params.0.extensions.as_deref() {
            options.set_extensions_from_list(list);
        }
        if let Some(ignore) = params.0.ignore.clone() {
            options.ignore.extend(ignore);
        }
        options.update_schema = params.0.update_schema.unwrap_or(false);
        options.reset_db = params.0.reset_db.unwrap_or(false);

        match analyze(&directory, &options) {
            Ok(report) => {
                let summary = format!(
                    "Analyzed {} files ({} parsed, {} failed, {} skipped); wrote {} nodes and {} relationships in {:.2?}.",
                    report.files_discovered,
                    report.files_parsed,
                    report.files_failed,
                    report.files_skipped,
                    report.nodes_written,
                    report.relationships_written,
                    report.duration,
                );
                Ok(CallToolResult::success(vec![Content::text(summary)]))
            }
            Err(err) => Ok(CallToolResult::error(vec![Content::text(format!(
                "{{\"error\": \"{err}\"}}"
            ))])),
        }
    }
}

#[tool_handler]
impl ServerHandler for CartoMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Carto builds a code knowledge graph from a multi-language source tree.\n\n\
                 Available tools:\n\
                 1. run_analyzer - Analyze a directory (nodes: files, classes, functions, \
                 components, SQL tables; relationships: imports, calls, inheritance, JSX \
                 composition, SQL references)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Entry point for the MCP server.
pub fn run_server() -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let service = CartoMcpServer::new();
            let server = service.serve(rmcp::transport::stdio()).await?;
            server.waiting().await?;
            Ok(())
        })
}
