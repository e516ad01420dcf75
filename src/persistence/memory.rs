//! In-process store
//!
//! Each account balance sits behind its own `tokio::sync::Mutex`. A unit of
//! work holds owned guards for the accounts it locked and stages every write
//! locally; nothing becomes visible to other workers until `commit`.
//!
//! Used for local runs without PostgreSQL and as the concurrency test bed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{LedgerReader, StoreError, TransferStore, UnitOfWork};
use crate::account::Account;
use crate::core_types::{AccountId, TransferId};
use crate::ledger::{LedgerPage, PageRequest, TransferRecord};
use crate::money::validate_amount;

/// Default time a unit of work waits for one account lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type BalanceCell = Arc<Mutex<Decimal>>;

/// In-memory account store and ledger
pub struct MemoryStore {
    accounts: Arc<DashMap<AccountId, BalanceCell>>,
    ledger: Arc<RwLock<Vec<TransferRecord>>>,
    lock_timeout: Duration,
    /// Number of upcoming lock attempts that fail with `LockConflict`
    injected_conflicts: Arc<AtomicU32>,
    lock_attempts: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            ledger: Arc::new(RwLock::new(Vec::new())),
            lock_timeout,
            injected_conflicts: Arc::new(AtomicU32::new(0)),
            lock_attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Open an account with an initial balance.
    ///
    /// Fails with `Constraint` if the id is taken or the balance is negative.
    pub fn open_account(&self, id: AccountId, balance: Decimal) -> Result<(), StoreError> {
        if balance.is_sign_negative() {
            return Err(StoreError::Constraint(format!(
                "negative opening balance for account {}",
                id
            )));
        }
        let balance = if balance.is_zero() {
            crate::money::round_money(balance)
        } else {
            validate_amount(balance).map_err(|e| StoreError::Constraint(e.to_string()))?
        };

        match self.accounts.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::Constraint(format!(
                "account {} already exists",
                id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(balance)));
                debug!(account_id = id, balance = %balance, "Account opened");
                Ok(())
            }
        }
    }

    /// Make the next `count` lock attempts fail with `LockConflict`
    pub fn inject_lock_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Total `lock_for_transfer` calls seen so far
    pub fn lock_attempts(&self) -> u64 {
        self.lock_attempts.load(Ordering::SeqCst)
    }

    /// Number of committed ledger records
    pub fn ledger_len(&self) -> Result<usize, StoreError> {
        self.ledger
            .read()
            .map(|ledger| ledger.len())
            .map_err(|_| StoreError::Unavailable("ledger lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(MemoryUnit {
            accounts: self.accounts.clone(),
            ledger: self.ledger.clone(),
            lock_timeout: self.lock_timeout,
            injected_conflicts: self.injected_conflicts.clone(),
            lock_attempts: self.lock_attempts.clone(),
            guards: BTreeMap::new(),
            staged_balances: BTreeMap::new(),
            staged_records: Vec::new(),
        }))
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let cell = match self.accounts.get(&id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        let balance = *cell.lock().await;
        Ok(Some(Account::new(id, balance)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for MemoryStore {
    async fn list_for_participant(
        &self,
        participant: AccountId,
        page: PageRequest,
    ) -> Result<LedgerPage, StoreError> {
        let ledger = self
            .ledger
            .read()
            .map_err(|_| StoreError::Unavailable("ledger lock poisoned".into()))?;

        let mut matching: Vec<&TransferRecord> = ledger
            .iter()
            .filter(|r| r.is_participant(participant))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .cloned()
            .collect();

        Ok(LedgerPage {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        })
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Option<TransferRecord>, StoreError> {
        let ledger = self
            .ledger
            .read()
            .map_err(|_| StoreError::Unavailable("ledger lock poisoned".into()))?;
        Ok(ledger.iter().find(|r| r.id == id).cloned())
    }
}

/// Unit of work over [`MemoryStore`]
struct MemoryUnit {
    accounts: Arc<DashMap<AccountId, BalanceCell>>,
    ledger: Arc<RwLock<Vec<TransferRecord>>>,
    lock_timeout: Duration,
    injected_conflicts: Arc<AtomicU32>,
    lock_attempts: Arc<AtomicU64>,
    guards: BTreeMap<AccountId, OwnedMutexGuard<Decimal>>,
    staged_balances: BTreeMap<AccountId, Decimal>,
    staged_records: Vec<TransferRecord>,
}

impl MemoryUnit {
    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Cell of one account; the shard guard is released before returning
    fn cell(&self, id: AccountId) -> Option<BalanceCell> {
        self.accounts.get(&id).map(|entry| entry.value().clone())
    }

    fn current_balance(&self, id: AccountId) -> Option<Decimal> {
        self.staged_balances
            .get(&id)
            .copied()
            .or_else(|| self.guards.get(&id).map(|g| **g))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn lock_for_transfer(
        &mut self,
        ids: &BTreeSet<AccountId>,
    ) -> Result<BTreeMap<AccountId, Account>, StoreError> {
        self.lock_attempts.fetch_add(1, Ordering::SeqCst);

        if self.take_injected_conflict() {
            return Err(StoreError::LockConflict("injected conflict".into()));
        }

        // BTreeSet iteration is ascending
        for &id in ids {
            if self.guards.contains_key(&id) {
                continue;
            }
            let cell = self.cell(id).ok_or(StoreError::NotFound(id))?;
            let guard = tokio::time::timeout(self.lock_timeout, cell.lock_owned())
                .await
                .map_err(|_| {
                    StoreError::LockConflict(format!("lock timeout on account {}", id))
                })?;
            self.guards.insert(id, guard);
        }

        let mut locked = BTreeMap::new();
        for &id in ids {
            let balance = self.current_balance(id).ok_or(StoreError::NotFound(id))?;
            locked.insert(id, Account::new(id, balance));
        }
        Ok(locked)
    }

    async fn apply_balance_deltas(
        &mut self,
        deltas: &BTreeMap<AccountId, Decimal>,
    ) -> Result<BTreeMap<AccountId, Decimal>, StoreError> {
        let mut next = BTreeMap::new();
        for (&id, &delta) in deltas {
            if !self.guards.contains_key(&id) && !self.accounts.contains_key(&id) {
                return Err(StoreError::NotFound(id));
            }
            let current = self.current_balance(id).ok_or_else(|| {
                StoreError::Constraint(format!("account {} is not locked", id))
            })?;
            let updated = current + delta;
            if updated.is_sign_negative() && !updated.is_zero() {
                return Err(StoreError::Constraint(format!(
                    "balance of account {} would become negative",
                    id
                )));
            }
            next.insert(id, updated);
        }

        self.staged_balances.extend(next.iter().map(|(k, v)| (*k, *v)));
        Ok(next)
    }

    async fn insert_transfer(&mut self, record: &TransferRecord) -> Result<(), StoreError> {
        self.staged_records.push(record.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut ledger = self
            .ledger
            .write()
            .map_err(|_| StoreError::Unavailable("ledger lock poisoned".into()))?;

        for (id, balance) in std::mem::take(&mut self.staged_balances) {
            if let Some(guard) = self.guards.get_mut(&id) {
                **guard = balance;
            }
        }
        ledger.append(&mut self.staged_records);
        drop(ledger);

        // Release account locks
        self.guards.clear();
        Ok(())
    }
}
