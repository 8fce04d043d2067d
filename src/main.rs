use std::sync::Arc;

use tokio::net::TcpListener;

use points_ledger::{
    adapters::{
        http::{self, AppState},
        ledger::memory::MemoryLedger,
    },
    config::AppConfig,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(&config.log);

    let ledger = Arc::new(MemoryLedger::default());
    let app = http::router(AppState::new(ledger));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
