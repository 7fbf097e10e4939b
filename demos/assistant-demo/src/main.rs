//! Interactive assistant wired over the full runtime stack.
//!
//! Requires `OPENAI_API_KEY`. Extra allowed API domains can be passed via
//! `CONDUCTOR_ALLOWED_DOMAINS` as a comma-separated list.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use conductor_adapters::{OpenAiClient, OpenAiConfig};
use conductor_gateway::RestGateway;
use conductor_kernel::{ChatEngine, ChatRequest};
use conductor_policy::{DomainPolicy, EnvCredentials};
use conductor_sandbox::{CodeInterpreter, MemoryStore, SingleWriterStore};
use conductor_session::SessionStore;
use conductor_tools::{ParamKind, ParamSpec, ToolCreator, ToolRegistry, ToolSpec};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

const DOMAINS_ENV: &str = "CONDUCTOR_ALLOWED_DOMAINS";

#[derive(Parser)]
#[command(about = "Chat with a tool-using assistant from the terminal")]
struct Args {
    /// Model name passed to the OpenAI-compatible endpoint.
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Session id to resume; a fresh one is generated when omitted.
    #[arg(long)]
    session: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let registry = Arc::new(ToolRegistry::new());
    register_price_stub(&registry)?;

    let store = Arc::new(SingleWriterStore::new(MemoryStore::new().with_result(
        "SELECT symbol, price FROM prices",
        json!([
            { "symbol": "BTC", "price": 67_250.0 },
            { "symbol": "ETH", "price": 3_490.0 },
        ]),
    )));
    CodeInterpreter::install(&registry, store).context("install code interpreter")?;

    let policy = DomainPolicy::new()
        .with_domain("api.coingecko.com")
        .with_domain("api.open-meteo.com")
        .with_env_domains(DOMAINS_ENV);
    let gateway = Arc::new(
        RestGateway::new(policy, Arc::new(EnvCredentials::new())).context("build gateway")?,
    );
    ToolCreator::install(&registry, Arc::clone(&gateway) as _).context("install tool creator")?;

    let client =
        Arc::new(OpenAiClient::new(OpenAiConfig::from_env(&args.model)).context("build client")?);
    let sessions = Arc::new(SessionStore::default());
    let engine = ChatEngine::new(client, Arc::clone(&registry), gateway, sessions);

    let session_id = args
        .session
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(session = %session_id, tools = registry.len(), "assistant ready; empty line quits");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() || message == "exit" || message == "quit" {
            break;
        }

        let turn = engine
            .chat(ChatRequest::new(message).with_session(&session_id))
            .await;
        let reply = turn.into_reply();
        println!("{}", reply.response());
        if !reply.tools_used().is_empty() {
            println!("[tools: {}]", reply.tools_used().join(", "));
        }
        if let Some(visualization) = reply.visualization() {
            println!("[visualization] {visualization}");
        }
    }

    Ok(())
}

/// Registers a canned price lookup so the assistant has a native tool to
/// call without any network access.
fn register_price_stub(registry: &Arc<ToolRegistry>) -> Result<()> {
    let spec = ToolSpec::new("get_price", "Latest cached price for a crypto symbol")?
        .with_param(ParamSpec::new("symbol", ParamKind::String, "Ticker symbol, e.g. ETH").required());
    registry.register_static(spec, |params: Map<String, Value>| async move {
        let symbol = params
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or("BTC")
            .to_uppercase();
        let price = match symbol.as_str() {
            "BTC" => 67_250.0,
            "ETH" => 3_490.0,
            _ => 1.0,
        };
        Ok(json!({ "symbol": symbol, "price": price, "currency": "USD" }))
    })?;
    Ok(())
}
