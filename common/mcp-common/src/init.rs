//! Server initialization utilities
//!
//! Provides standardized tracing setup and the `serve_stdio!` macro
//! for consistent MCP server initialization across all servers.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging for MCP servers
///
/// Sets up logging to stderr (stdout is reserved for MCP protocol) with:
/// - Formatted output without ANSI colors (for clean logs)
/// - Environment-based filtering via RUST_LOG
/// - Default log level of `info` for the specified crate
///
/// Set `LOG_FORMAT=json` for structured JSON output.
///
/// # Arguments
///
/// * `crate_name` - The name of the MCP server crate (e.g., "sql_mcp")
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env()
        .add_directive(directive.parse()?)
        .add_directive("mcp_common=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

/// Macro for standardized MCP server initialization
///
/// Expands to a complete `#[tokio::main] async fn main()` that:
/// 1. Initializes tracing to stderr
/// 2. Creates the server, either with `::new()` or a fallible constructor
/// 3. Serves via stdio transport
/// 4. Waits for shutdown
///
/// A constructor or transport failure ends `main` with an error, which
/// exits the process with a non-zero status.
///
/// # Examples
///
/// A server whose `new()` cannot fail, as its whole `main.rs`:
///
/// ```rust,ignore
/// //! Utility MCP Server
/// //!
/// //! Provides echo, addition and current-time tools.
///
/// use utility_mcp::UtilityMcpServer;
///
/// mcp_common::serve_stdio!(UtilityMcpServer, "utility_mcp");
/// ```
///
/// A server built from configuration passes its constructor, any
/// `fn() -> Result<S, E>` with `E: Into<anyhow::Error>`:
///
/// ```rust,ignore
/// //! SQL MCP Server
/// //!
/// //! Serves read-only database tools over stdio.
///
/// use sql_mcp::SqlMcpServer;
///
/// mcp_common::serve_stdio!(SqlMcpServer, "sql_mcp", SqlMcpServer::from_env);
/// ```
#[macro_export]
macro_rules! serve_stdio {
    ($server_type:ty, $crate_name:expr) => {
        $crate::serve_stdio!($server_type, $crate_name, || {
            Ok::<_, anyhow::Error>(<$server_type>::new())
        });
    };
    ($server_type:ty, $crate_name:expr, $constructor:expr) => {
        #[tokio::main]
        async fn main() -> anyhow::Result<()> {
            use rmcp::ServiceExt;

            $crate::init_tracing($crate_name)?;

            tracing::info!(concat!("Starting ", $crate_name, " MCP Server"));

            let server: $server_type = ($constructor)()?;
            let service = server.serve(rmcp::transport::stdio()).await?;

            tracing::info!("Server running, waiting for requests...");

            service.waiting().await?;

            tracing::info!("Server shutting down");
            Ok(())
        }
    };
}
