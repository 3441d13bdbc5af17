//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};

/// In-memory user records over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(name = "roster", version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "ROSTER_ADDR", default_value = "0.0.0.0:3000")]
    pub addr: SocketAddr,

    /// Shared secret; clients send `Authorization: Bearer <token>`.
    #[arg(long, env = "ROSTER_TOKEN", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub token: String,

    /// Log output format. Verbosity comes from `RUST_LOG` (default `info`).
    #[arg(long, env = "ROSTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
