//! CLI module for the WeChat API cache
//!
//! Provides administrative subcommands against the configured cache:
//! - `status`: backend availability and local entry count
//! - `flush`: clear both stores
//! - `token`: fetch-or-refresh an access token
//! - `clear`: targeted cache clearing

pub mod commands;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// WeChat API cache - Redis-backed cache with in-process fallback
#[derive(Parser)]
#[command(name = "wechat-api-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show backend availability and local entry count
    Status,

    /// Clear every entry from both stores
    Flush,

    /// Return a cached access token, fetching one from WeChat when missing
    Token(TokenArgs),

    /// Clear part of the cache
    Clear(ClearArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    #[arg(long)]
    pub appid: String,

    #[arg(long, env = "WECHAT_APP_SECRET", hide_env_values = true)]
    pub secret: String,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    /// What to clear
    #[arg(long = "type", value_name = "TYPE", value_parser = ["token", "material", "draft", "wechat", "all"])]
    pub kind: String,

    /// Required for `--type token`
    #[arg(long)]
    pub appid: Option<String>,

    /// Required for `--type material` and `--type draft`
    #[arg(long)]
    pub media_id: Option<String>,
}

/// Loads configuration, wires the cache stack and runs one command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // A broken config must not silently fall back to the default Redis
    let config = AppConfig::load().context("failed to load configuration")?;
    logging::init_logging(&config.logging);

    let context = crate::create_app_context(&config).await?;

    let result = match cli.command {
        Command::Status => commands::status(&context).await,
        Command::Flush => commands::flush(&context).await,
        Command::Token(args) => commands::token(&context, &args).await,
        Command::Clear(args) => commands::clear(&context, &args).await,
    };

    context.shutdown().await;
    info!("Cache disconnected");

    print_json(&result?)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
