//! Harada grid server.
//!
//! Configuration comes from the environment (and `.env`):
//! - `GROQ_API_KEY` - enables the LLM generator
//! - `SUPABASE_URL` / `SUPABASE_SERVICE_ROLE_KEY` - store grids in Supabase
//! - `DATABASE_PATH` - SQLite file otherwise
//! - `HOST` / `PORT` - listen address

use harada::{api, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("harada=info,tower_http=info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Harada server"
    );

    let config = Config::from_env()?;
    api::serve(config).await
}
