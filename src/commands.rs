//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use sigrpc_bus::{InMemoryBlackboard, SignalBus};
use sigrpc_rpc::{Endpoint, RpcConfig, RpcRuntime, Server};
use sigrpc_schema::{SchemaEntry, SchemaType};
use sigrpc_transport::Strategy;
use tracing::info;

use crate::cli::Commands;

const DEMO_NAMESPACE: &str = "demo";

/// Execute a CLI command.
pub async fn execute_command(command: Commands, config: RpcConfig) -> Result<()> {
    match command {
        Commands::Demo {
            payload_size,
            timeout,
            blackboard,
        } => cmd_demo(config, payload_size, timeout, blackboard).await,
        Commands::Config => cmd_config(&config),
    }
}

/// Load the configuration file, or defaults when none is given.
pub async fn load_config(path: Option<&Path>) -> Result<RpcConfig> {
    let Some(path) = path else {
        return Ok(RpcConfig::default());
    };

    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    RpcConfig::from_toml_str(&source)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn cmd_config(config: &RpcConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

async fn cmd_demo(
    mut config: RpcConfig,
    payload_size: usize,
    timeout: Option<u64>,
    blackboard: bool,
) -> Result<()> {
    if blackboard {
        config.transport.strategy = Strategy::Blackboard;
    }
    let timeout = timeout.map_or_else(|| config.default_timeout(), Duration::from_secs);

    let bus = Arc::new(SignalBus::new());
    let runtime = match config.transport.strategy {
        Strategy::Blackboard => {
            RpcRuntime::with_blackboard(bus, config, InMemoryBlackboard::new_arc())?
        }
        Strategy::Chunked => RpcRuntime::new(bus, config)?,
    };

    let handle = runtime.start_server(demo_server())?;
    let client = runtime.client();

    let text = "~".repeat(payload_size);
    let echoed = client
        .call_with_timeout(DEMO_NAMESPACE, "echo", Some(vec![json!(text)]), timeout)
        .await?;
    let echoed_len = echoed
        .as_ref()
        .and_then(Value::as_str)
        .map_or(0, |s| s.chars().count());
    info!(sent = payload_size, received = echoed_len, "echo returned");

    let sum = client
        .call_with_timeout(
            DEMO_NAMESPACE,
            "sum",
            Some(vec![json!(1), json!(2.5), json!(3)]),
            timeout,
        )
        .await?;
    info!(result = ?sum, "sum returned");

    handle.stop()?;
    handle.stopped().await;
    info!("Demo finished");
    Ok(())
}

/// Server with the two demo endpoints.
#[must_use]
pub fn demo_server() -> Server {
    let echo = Endpoint::sync(|mut args| Ok(args.pop()))
        .with_arguments([SchemaEntry::string()])
        .with_return_value(SchemaType::String);

    let sum = Endpoint::sync(|args| {
        args.iter()
            .map(|arg| arg.as_f64().ok_or_else(|| anyhow!("sum takes numbers, got {arg}")))
            .sum::<Result<f64>>()
            .map(|total| Some(json!(total)))
    })
    .with_return_value(SchemaType::Number);

    Server::new(DEMO_NAMESPACE)
        .endpoint("echo", echo)
        .endpoint("sum", sum)
}
