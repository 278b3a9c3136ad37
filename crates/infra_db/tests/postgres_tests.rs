//! Postgres adapter integration tests
//!
//! These start a PostgreSQL container and are ignored by default. Run with
//! `cargo test -p infra_db -- --ignored` on a host with Docker.

use core_kernel::{DateWindow, LedgerId, Money};
use domain_ledger::{
    CanonicalRole, ChartPort, JournalPort, Ledger, LedgerError, LedgerStatus, LedgerType,
    PostingPolicy,
};
use domain_party::{PartyPort, PartyPortExt};
use rust_decimal_macros::dec;
use test_utils::{date, LedgerTestDatabase, PartyFixtures, TestVoucherBuilder};

#[tokio::test]
#[ignore = "requires docker"]
async fn test_seeded_chart_round_trips() {
    let db = LedgerTestDatabase::start().await.unwrap();
    let stores = db.ledger_stores().await.unwrap();

    let snapshot = stores.chart.snapshot().await.unwrap();
    assert_eq!(snapshot.ledger_count(), 7);
    assert!(snapshot.canonical_group(CanonicalRole::TradeReceivables).is_ok());

    // Seeding twice is a no-op
    assert!(!stores.chart.seed(&snapshot).await.unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_conditional_ledger_create() {
    let db = LedgerTestDatabase::start().await.unwrap();
    let stores = db.ledger_stores().await.unwrap();

    let group = stores.chart.canonical_group(CanonicalRole::TradeReceivables).await.unwrap();
    let ledger = Ledger::new("Acme", &group, LedgerType::Receivable).with_id(LedgerId::new());

    stores.chart.insert_ledger(ledger.clone()).await.unwrap();
    let err = stores.chart.insert_ledger(ledger).await.unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccount(_)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_journal_append_and_range_read() {
    let db = LedgerTestDatabase::start().await.unwrap();
    let stores = db.ledger_stores().await.unwrap();
    let chart = stores.chart.snapshot().await.unwrap();
    let cash = chart.find_by_name("Cash").unwrap().id;
    let sales = chart.find_by_name("Sales").unwrap().id;

    let later = TestVoucherBuilder::new()
        .on(date(2024, 6, 1))
        .transfer(cash, sales, dec!(200))
        .build();
    let earlier = TestVoucherBuilder::new()
        .on(date(2024, 5, 1))
        .transfer(cash, sales, dec!(300))
        .build();

    let policy = PostingPolicy::open();
    stores.journal.append(later, &chart, &policy).await.unwrap();
    stores.journal.append(earlier, &chart, &policy).await.unwrap();

    let vouchers = stores.journal.list_in_range(DateWindow::unbounded()).await.unwrap();
    assert_eq!(vouchers.len(), 2);
    assert_eq!(vouchers[0].date, date(2024, 5, 1));
    assert_eq!(vouchers[0].entries[0].posting.signed(), Money::new(dec!(300)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_unbalanced_voucher_leaves_no_rows() {
    let db = LedgerTestDatabase::start().await.unwrap();
    let stores = db.ledger_stores().await.unwrap();
    let chart = stores.chart.snapshot().await.unwrap();
    let cash = chart.find_by_name("Cash").unwrap().id;
    let sales = chart.find_by_name("Sales").unwrap().id;

    let draft = TestVoucherBuilder::new()
        .debit(cash, dec!(100))
        .credit(sales, dec!(90))
        .build();

    let result = stores.journal.append(draft, &chart, &PostingPolicy::open()).await;
    assert!(matches!(result, Err(LedgerError::UnbalancedVoucher { .. })));
    assert_eq!(stores.journal.count().await.unwrap(), 0);
    for (table, rows) in db.journal_rows().await.unwrap() {
        assert_eq!(rows, 0, "{} has rows after a rejected post", table);
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_stale_snapshot_cannot_post_to_deactivated_ledger() {
    let db = LedgerTestDatabase::start().await.unwrap();
    let stores = db.ledger_stores().await.unwrap();
    let stale = stores.chart.snapshot().await.unwrap();
    let cash = stale.find_by_name("Cash").unwrap().clone();
    let sales = stale.find_by_name("Sales").unwrap().id;

    let mut retired = cash.clone();
    retired.status = LedgerStatus::Inactive;
    stores.chart.update_ledger(retired).await.unwrap();

    let draft = TestVoucherBuilder::new().transfer(cash.id, sales, dec!(40)).build();
    let result = stores.journal.append(draft, &stale, &PostingPolicy::open()).await;

    assert!(matches!(result, Err(LedgerError::InactiveAccount(id)) if id == cash.id));
    assert_eq!(stores.journal.count().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_party_binding_compare_and_set() {
    let db = LedgerTestDatabase::start().await.unwrap();
    let stores = db.ledger_stores().await.unwrap();
    let party = stores.parties.create_party(PartyFixtures::customer(), None).await.unwrap();

    let first = LedgerId::new();
    let bound = stores.parties.bind_ledger(party.id, None, first, None).await.unwrap();
    assert_eq!(bound.coa_ledger_id, Some(first));

    // Stale expectation loses
    let err = stores.parties.bind_ledger(party.id, None, LedgerId::new(), None).await.unwrap_err();
    assert!(err.is_conflict());

    // Rebinding to the same ledger is idempotent
    assert!(stores.parties.bind_ledger(party.id, None, first, None).await.is_ok());
}
