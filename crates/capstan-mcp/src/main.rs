//! Capstan MCP server entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use capstan_mcp::capabilities::build_dispatcher;
use capstan_mcp::config::{ServerConfig, DEFAULT_ADDR};
use capstan_mcp::protocol::ProtocolHandler;
use capstan_mcp::transport::StdioTransport;
use capstan_mcp::types::InitializeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Parser)]
#[command(
    name = "capstan-mcp",
    about = "MCP server exposing typed tools, resources and prompts",
    version
)]
struct Cli {
    /// Transport to serve on.
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio, global = true)]
    transport: Transport,

    /// Listen address for the HTTP transport (host:port).
    #[arg(long, default_value = DEFAULT_ADDR, global = true)]
    addr: String,

    /// Document served as docs://readme. Also reads CAPSTAN_DOCS.
    #[arg(long, global = true)]
    docs: Option<String>,

    /// Per-request deadline in seconds. Also reads CAPSTAN_REQUEST_TIMEOUT.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default).
    Serve,

    /// Print server info and the capability listing as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   capstan-mcp completions bash > ~/.local/share/bash-completion/completions/capstan-mcp
    ///   capstan-mcp completions zsh > ~/.zfunc/_capstan-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // stdout carries protocol frames on stdio, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::resolve(cli.docs.as_deref(), cli.request_timeout);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Capstan MCP server v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Docs: {}", config.docs_path.display());
            tracing::info!("Request timeout: {:?}", config.request_timeout);

            let dispatcher = Arc::new(build_dispatcher(&config)?);
            serve(cli.transport, &cli.addr, dispatcher, &config).await?;
        }

        Commands::Info => {
            let dispatcher = build_dispatcher(&config)?;
            let registry = dispatcher.registry();
            let init = InitializeResult::default_result();
            let info = serde_json::json!({
                "server": init.server_info,
                "protocol_version": init.protocol_version,
                "capabilities": init.capabilities,
                "tools": registry.list_tools().into_iter().map(|t| t.name).collect::<Vec<_>>(),
                "resources": registry.list_resources().into_iter().map(|r| r.uri).collect::<Vec<_>>(),
                "resource_templates": registry
                    .list_templates()
                    .into_iter()
                    .map(|t| t.uri_template)
                    .collect::<Vec<_>>(),
                "prompts": registry.list_prompts().into_iter().map(|p| p.name).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "capstan-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}

async fn serve(
    transport: Transport,
    addr: &str,
    dispatcher: Arc<capstan::Dispatcher>,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    match transport {
        Transport::Stdio => {
            let handler = Arc::new(ProtocolHandler::new(dispatcher, config.request_timeout));
            StdioTransport::new(handler).run().await?;
        }

        #[cfg(feature = "http")]
        Transport::Http => {
            let transport = capstan_mcp::transport::HttpTransport::with_idle_timeout(
                dispatcher,
                config.request_timeout,
                config.session_idle_timeout,
            );
            transport.run(addr).await?;
        }

        #[cfg(not(feature = "http"))]
        Transport::Http => {
            let _ = addr;
            anyhow::bail!("capstan-mcp was built without the `http` feature");
        }
    }

    Ok(())
}
