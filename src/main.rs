//! backend-relay
//!
//! Sits between the chat frontend's browsers and the API backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                   BACKEND RELAY                    │
//!                      │                                                    │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐    │
//!  ────────────────────┼─▶│ request │──▶│ routing  │──▶│   headers    │    │
//!                      │  │ id+body │   │ target   │   │ + session    │    │
//!                      │  └─────────┘   └──────────┘   └──────┬───────┘    │
//!                      │                                      │            │
//!                      │                                      ▼            │
//!   Client Response    │  ┌──────────────┐   ┌─────────┐   ┌──────────┐    │
//!  ◀───────────────────┼──│ buffered or  │◀──│ 401 /   │◀──│ reqwest  │◀───┼── Backend
//!                      │  │ stream relay │   │ SSE?    │   │ client   │    │
//!                      │  └──────────────┘   └─────────┘   └──────────┘    │
//!                      │                                                    │
//!                      │   config · observability · lifecycle · auth routes │
//!                      └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use backend_relay::lifecycle::startup::{self, Overrides};
use clap::Parser;

#[derive(Parser)]
#[command(name = "backend-relay")]
#[command(about = "Relay between the chat frontend and its API backend", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long, env = "RELAY_BIND")]
    bind: Option<String>,

    /// Backend origin, overrides `backend.origin` and the environment.
    #[arg(long)]
    backend_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::resolve_config(
        cli.config.as_deref(),
        Overrides {
            bind_address: cli.bind,
            backend_origin: cli.backend_origin,
        },
    )?;

    startup::run(config).await?;
    Ok(())
}
