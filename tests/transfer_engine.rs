//! End-to-end transfer engine behaviour against the in-memory store

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use remit_engine::ledger::LedgerQuery;
use remit_engine::notify::{SubscriberRegistry, spawn_dispatcher};
use remit_engine::{
    AccountId, CommissionPolicy, MemoryStore, NotificationOutbox, TransferCoordinator,
    TransferError, TransferStore,
};

struct Harness {
    store: Arc<MemoryStore>,
    coordinator: Arc<TransferCoordinator>,
}

impl Harness {
    fn new(accounts: &[(AccountId, Decimal)]) -> Self {
        Self::with_outbox(accounts, NotificationOutbox::disconnected())
    }

    fn with_outbox(accounts: &[(AccountId, Decimal)], outbox: NotificationOutbox) -> Self {
        let store = Arc::new(MemoryStore::with_lock_timeout(Duration::from_secs(2)));
        for &(id, balance) in accounts {
            store.open_account(id, balance).unwrap();
        }
        let coordinator = Arc::new(
            TransferCoordinator::new(store.clone(), CommissionPolicy::default(), outbox)
                .with_retry(5, Duration::from_millis(1)),
        );
        Self { store, coordinator }
    }

    async fn balance(&self, id: AccountId) -> Decimal {
        self.store.get_account(id).await.unwrap().unwrap().balance
    }
}

#[tokio::test]
async fn concrete_scenario_matches_expected_figures() {
    let h = Harness::new(&[(1, dec!(1000.00)), (2, dec!(500.00))]);

    let record = h.coordinator.transfer(1, 2, dec!(100.00)).await.unwrap();

    assert_eq!(record.commission_rate, dec!(0.015));
    assert_eq!(record.commission_fee, dec!(1.50));
    assert_eq!(record.total_debit, dec!(101.50));
    assert_eq!(record.sender_balance_before, dec!(1000.00));
    assert_eq!(record.sender_balance_after, dec!(898.50));
    assert_eq!(record.receiver_balance_before, dec!(500.00));
    assert_eq!(record.receiver_balance_after, dec!(600.00));
    assert!(record.satisfies_invariants());

    assert_eq!(h.balance(1).await, dec!(898.50));
    assert_eq!(h.balance(2).await, dec!(600.00));
    assert_eq!(h.store.ledger_len().unwrap(), 1);
}

#[tokio::test]
async fn insufficient_funds_is_a_no_op() {
    let h = Harness::new(&[(1, dec!(50.00)), (2, dec!(10.00))]);

    let err = h.coordinator.transfer(1, 2, dec!(100.00)).await.unwrap_err();

    assert!(matches!(err, TransferError::InsufficientFunds { .. }));
    assert_eq!(h.balance(1).await, dec!(50.00));
    assert_eq!(h.balance(2).await, dec!(10.00));
    assert_eq!(h.store.ledger_len().unwrap(), 0);
}

#[tokio::test]
async fn balance_exactly_covering_total_debit_succeeds() {
    let h = Harness::new(&[(1, dec!(101.50)), (2, dec!(0))]);

    let record = h.coordinator.transfer(1, 2, dec!(100)).await.unwrap();

    assert_eq!(record.sender_balance_after, Decimal::ZERO);
    assert_eq!(h.balance(2).await, dec!(100));
}

#[tokio::test]
async fn self_transfer_costs_only_the_commission() {
    let h = Harness::new(&[(7, dec!(200.00))]);

    let record = h.coordinator.transfer(7, 7, dec!(100.00)).await.unwrap();

    assert_eq!(record.commission_fee, dec!(1.50));
    assert_eq!(record.sender_balance_before, dec!(200.00));
    assert_eq!(record.sender_balance_after, dec!(198.50));
    assert_eq!(record.receiver_balance_after, dec!(198.50));
    assert!(record.satisfies_invariants());
    assert_eq!(h.balance(7).await, dec!(198.50));
    assert_eq!(h.store.ledger_len().unwrap(), 1);
}

#[tokio::test]
async fn sequential_transfers_stop_exactly_when_funds_run_out() {
    let initial = dec!(1000);
    let amount = dec!(100);
    let h = Harness::new(&[(1, initial), (2, dec!(0))]);
    let total_debit = h.coordinator.policy().quote(amount).total_debit;

    let mut expected = initial;
    let mut successes = 0;
    for _ in 0..20 {
        let result = h.coordinator.transfer(1, 2, amount).await;
        if expected >= total_debit {
            let record = result.unwrap();
            assert_eq!(record.sender_balance_before, expected);
            expected -= total_debit;
            successes += 1;
        } else {
            assert!(matches!(
                result,
                Err(TransferError::InsufficientFunds { .. })
            ));
        }
    }

    // 1000 / 101.5 -> 9 full debits
    assert_eq!(successes, 9);
    assert_eq!(h.balance(1).await, expected);
    assert_eq!(h.balance(1).await, dec!(86.5));
    assert_eq!(h.balance(2).await, dec!(900));
    assert_eq!(h.store.ledger_len().unwrap(), 9);
}

#[tokio::test]
async fn two_lock_conflicts_then_success_applies_once() {
    let h = Harness::new(&[(1, dec!(1000)), (2, dec!(500))]);
    h.store.inject_lock_conflicts(2);

    let record = h.coordinator.transfer(1, 2, dec!(100)).await.unwrap();

    assert_eq!(h.store.lock_attempts(), 3);
    assert_eq!(record.sender_balance_after, dec!(898.50));
    assert_eq!(h.balance(1).await, dec!(898.50));
    assert_eq!(h.balance(2).await, dec!(600));
    assert_eq!(h.store.ledger_len().unwrap(), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_as_unavailable() {
    let h = Harness::new(&[(1, dec!(1000)), (2, dec!(500))]);
    h.store.inject_lock_conflicts(5);

    let err = h.coordinator.transfer(1, 2, dec!(100)).await.unwrap_err();

    assert_eq!(err, TransferError::TransferUnavailable { attempts: 5 });
    assert!(err.is_resubmittable());
    assert_eq!(h.balance(1).await, dec!(1000));
    assert_eq!(h.store.ledger_len().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_direction_transfers_do_not_deadlock() {
    let h = Harness::new(&[(1, dec!(1000)), (2, dec!(1000))]);
    let rounds = 50;

    let tasks = (0..rounds).flat_map(|_| {
        [(1, 2), (2, 1)].map(|(from, to)| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.transfer(from, to, dec!(1)).await })
        })
    });

    let results = tokio::time::timeout(Duration::from_secs(30), join_all(tasks))
        .await
        .expect("transfers deadlocked");

    for result in results {
        assert!(result.unwrap().unwrap().satisfies_invariants());
    }

    // Each side sent and received `rounds` units and paid `rounds` fees of 0.015
    let expected = dec!(1000) - Decimal::from(rounds) * dec!(0.015);
    assert_eq!(h.balance(1).await, expected);
    assert_eq!(h.balance(2).await, expected);
    assert_eq!(h.store.ledger_len().unwrap(), 2 * rounds as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_drain_never_overdraws() {
    let h = Harness::new(&[(1, dec!(500)), (2, dec!(0)), (3, dec!(0))]);

    let tasks = (0..40).map(|i| {
        let coordinator = h.coordinator.clone();
        let to = if i % 2 == 0 { 2 } else { 3 };
        tokio::spawn(async move { coordinator.transfer(1, to, dec!(20)).await })
    });
    let results = join_all(tasks).await;

    let committed = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    // 500 / 20.30 -> 24 transfers fit
    assert_eq!(committed, 24);
    assert!(results.iter().all(|r| match r {
        Ok(Ok(_)) | Ok(Err(TransferError::InsufficientFunds { .. })) => true,
        _ => false,
    }));

    let sender = h.balance(1).await;
    assert!(sender >= Decimal::ZERO);
    assert_eq!(sender, dec!(500) - Decimal::from(committed) * dec!(20.30));
    assert_eq!(h.balance(2).await + h.balance(3).await, Decimal::from(committed) * dec!(20));
    assert_eq!(h.store.ledger_len().unwrap(), committed);
}

#[tokio::test]
async fn participants_are_notified_after_commit() {
    let registry = Arc::new(SubscriberRegistry::new());
    let (_, mut sender_rx) = registry.subscribe(1);
    let (_, mut receiver_rx) = registry.subscribe(2);
    let (_, mut bystander_rx) = registry.subscribe(3);

    let (outbox, events) = NotificationOutbox::channel(16);
    let dispatcher = spawn_dispatcher(events, registry.clone());
    let h = Harness::with_outbox(&[(1, dec!(100)), (2, dec!(0)), (3, dec!(0))], outbox);

    let record = h.coordinator.transfer(1, 2, dec!(10)).await.unwrap();
    h.coordinator.transfer(1, 2, dec!(1000)).await.unwrap_err();

    let event = tokio::time::timeout(Duration::from_secs(5), sender_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.transfer_id, record.id);
    assert_eq!(event.message, "Transaction created successfully");
    assert_eq!(receiver_rx.recv().await.unwrap().transfer_id, record.id);

    drop(h);
    dispatcher.await.unwrap();
    assert!(sender_rx.try_recv().is_err());
    assert!(bystander_rx.try_recv().is_err());
}

#[tokio::test]
async fn ledger_shows_newest_first_to_participants_only() {
    let h = Harness::new(&[(1, dec!(1000)), (2, dec!(1000)), (3, dec!(1000))]);
    let first = h.coordinator.transfer(1, 2, dec!(10)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = h.coordinator.transfer(2, 1, dec!(5)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let foreign = h.coordinator.transfer(2, 3, dec!(5)).await.unwrap();

    let ledger = LedgerQuery::new(h.store.clone());
    let page = ledger.list_transfers(1, None, None).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(page.total, 2);

    assert!(ledger.get_transfer(foreign.id, 1).await.unwrap().is_none());
    assert!(ledger.get_transfer(foreign.id, 3).await.unwrap().is_some());
}

#[tokio::test]
async fn records_snapshot_the_rate_of_the_policy_that_created_them() {
    let store = Arc::new(MemoryStore::new());
    store.open_account(1, dec!(1000)).unwrap();
    store.open_account(2, dec!(0)).unwrap();

    let two_percent = TransferCoordinator::new(
        store.clone(),
        CommissionPolicy::new(dec!(0.02)).unwrap(),
        NotificationOutbox::disconnected(),
    );
    let first = two_percent.transfer(1, 2, dec!(100)).await.unwrap();

    assert_eq!(first.commission_rate, dec!(0.02));
    assert_eq!(first.commission_fee.to_string(), "2.0000");
    assert_eq!(first.total_debit.to_string(), "102.0000");
    assert_eq!(first.sender_balance_after, dec!(898));
    assert!(first.satisfies_invariants());

    // A later policy change only affects new records
    let half_percent = TransferCoordinator::new(
        store.clone(),
        CommissionPolicy::new(dec!(0.005)).unwrap(),
        NotificationOutbox::disconnected(),
    );
    let second = half_percent.transfer(1, 2, dec!(100)).await.unwrap();

    assert_eq!(second.commission_rate, dec!(0.005));
    assert_eq!(second.commission_fee, dec!(0.5));
    assert_eq!(second.sender_balance_before, dec!(898));
    assert_eq!(second.sender_balance_after, dec!(797.5));

    let ledger = LedgerQuery::new(store.clone());
    let stored = ledger.get_transfer(first.id, 1).await.unwrap().unwrap();
    assert_eq!(stored, first);
    assert_eq!(stored.commission_rate, dec!(0.02));
    assert_eq!(stored.commission_fee, dec!(2));
}
