use std::sync::Arc;

use rust_decimal::Decimal;

use crate::ledger::LedgerQuery;
use crate::persistence::TransferStore;
use crate::transfer::TransferCoordinator;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Transfer engine
    pub coordinator: Arc<TransferCoordinator>,
    /// Unlocked reads (receiver existence, balances, health)
    pub store: Arc<dyn TransferStore>,
    /// Participant-scoped ledger reads
    pub ledger: LedgerQuery,
    /// Smallest amount accepted over HTTP
    pub min_amount: Decimal,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TransferCoordinator>,
        store: Arc<dyn TransferStore>,
        ledger: LedgerQuery,
        min_amount: Decimal,
    ) -> Self {
        Self {
            coordinator,
            store,
            ledger,
            min_amount,
        }
    }
}
