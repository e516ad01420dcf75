//! remit_engine - balance transfer service
//!
//! ```text
//! ┌──────────┐    ┌─────────────┐    ┌────────────┐    ┌────────────┐
//! │ Gateway  │───▶│ Coordinator │───▶│   Store    │    │ Dispatcher │
//! │ (axum)   │    │ (lock/retry)│    │ (PG / mem) │    │ (notifier) │
//! └──────────┘    └──────┬──────┘    └────────────┘    └─────▲──────┘
//!                        └──────────── outbox ───────────────┘
//! ```
//!
//! Usage: `remit_engine [--env dev] [--port 8080] [--seed-accounts N --seed-balance 1000]`

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;

use remit_engine::config::AppConfig;
use remit_engine::db::Database;
use remit_engine::fee::CommissionPolicy;
use remit_engine::gateway::{self, AppState};
use remit_engine::ledger::LedgerQuery;
use remit_engine::notify::{NotificationOutbox, TracingNotifier, spawn_dispatcher};
use remit_engine::persistence::{LedgerReader, MemoryStore, PgStore, TransferStore};
use remit_engine::transfer::TransferCoordinator;

/// Value following `flag` on the command line
fn get_arg(flag: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn get_env() -> String {
    get_arg("--env")
        .or_else(|| get_arg("-e"))
        .unwrap_or_else(|| "dev".to_string())
}

/// Accounts `1..=N` opened at startup (in-memory store only)
fn get_seed() -> anyhow::Result<Option<(u64, Decimal)>> {
    let Some(count) = get_arg("--seed-accounts") else {
        return Ok(None);
    };
    let count: u64 = count.parse().context("--seed-accounts must be a number")?;
    let balance = match get_arg("--seed-balance") {
        Some(raw) => raw.parse().context("--seed-balance must be a decimal")?,
        None => Decimal::from(1000),
    };
    Ok(Some((count, balance)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = remit_engine::logging::init_logging(&app_config);

    tracing::info!("Starting remit_engine in {} mode", env);

    let transfer_config = &app_config.transfer;
    let (store, ledger_reader): (Arc<dyn TransferStore>, Arc<dyn LedgerReader>) =
        match &app_config.postgres_url {
            Some(url) => {
                let db = Database::connect_and_migrate(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                let store = Arc::new(PgStore::new(
                    db.pool().clone(),
                    transfer_config.lock_timeout(),
                ));
                (store.clone() as Arc<dyn TransferStore>, store as Arc<dyn LedgerReader>)
            }
            None => {
                tracing::warn!("postgres_url not set, using in-memory store");
                let store = Arc::new(MemoryStore::with_lock_timeout(
                    transfer_config.lock_timeout(),
                ));
                if let Some((count, balance)) = get_seed()? {
                    for id in 1..=count {
                        store.open_account(id, balance)?;
                    }
                    tracing::info!(count, %balance, "Seeded in-memory accounts");
                }
                (store.clone() as Arc<dyn TransferStore>, store as Arc<dyn LedgerReader>)
            }
        };
    tracing::info!(store = store.name(), "Store ready");

    let policy = CommissionPolicy::new(transfer_config.commission_rate)?;
    let (outbox, events) = NotificationOutbox::channel(app_config.notifier.queue_size);
    // No push transport here; see notify::subscribers for plugging one in
    let dispatcher = spawn_dispatcher(events, Arc::new(TracingNotifier));

    let coordinator = Arc::new(
        TransferCoordinator::new(store.clone(), policy, outbox)
            .with_retry(transfer_config.max_attempts, transfer_config.retry_backoff()),
    );
    tracing::info!(
        commission_rate = %coordinator.policy().rate(),
        max_attempts = coordinator.max_attempts(),
        "Transfer coordinator initialized"
    );

    let ledger = LedgerQuery::with_page_sizes(
        ledger_reader,
        app_config.ledger.default_page_size,
        app_config.ledger.max_page_size,
    );
    let state = Arc::new(AppState::new(
        coordinator,
        store,
        ledger,
        transfer_config.min_amount,
    ));

    let port = match get_arg("--port") {
        Some(p) => p.parse().context("--port must be a number")?,
        None => app_config.gateway.port,
    };
    gateway::run_server(&app_config.gateway.host, port, state).await?;

    dispatcher.abort();
    tracing::info!("remit_engine stopped");
    Ok(())
}
