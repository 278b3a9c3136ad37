//! LedgerService end-to-end tests over the in-memory stores

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use core_kernel::{
    DateWindow, DomainPort, HealthCheckResult, HealthCheckable, Money, OrderId, PortError, ProductId,
    VoucherId,
};
use domain_ledger::{
    BalanceMode, ChartOfAccounts, CogsBasis, DeliveredOrder, InMemoryChartStore, InMemoryJournalStore,
    InMemoryOrderBook, JournalPort, LedgerConfig, LedgerError, LedgerService, OrderLine, PostingPolicy,
    Voucher, VoucherDraft, VoucherType,
};
use domain_party::PartyKind;
use rust_decimal_macros::dec;
use test_utils::{
    assert_money_eq, assert_no_warnings, date, ChartFixtures, StandardFixture, TestVoucherBuilder,
};

fn service(chart: ChartOfAccounts, config: LedgerConfig) -> LedgerService {
    LedgerService::new(
        Arc::new(InMemoryChartStore::new(chart)),
        Arc::new(InMemoryJournalStore::new()),
        config,
    )
}

fn fy() -> DateWindow {
    DateWindow::between(date(2024, 4, 1), date(2025, 3, 31)).unwrap()
}

async fn trade(svc: &LedgerService, f: &StandardFixture) {
    for draft in [
        TestVoucherBuilder::new()
            .narration("Owner capital")
            .on(date(2024, 4, 1))
            .transfer(f.cash, f.capital, dec!(5000))
            .build(),
        TestVoucherBuilder::new()
            .narration("Cash sales")
            .of_type(VoucherType::Sales)
            .on(date(2024, 5, 10))
            .transfer(f.cash, f.sales, dec!(1000))
            .build(),
        TestVoucherBuilder::new()
            .narration("Shop rent")
            .of_type(VoucherType::Payment)
            .on(date(2024, 5, 31))
            .transfer(f.rent, f.cash, dec!(100))
            .build(),
    ] {
        svc.post_voucher(draft).await.unwrap();
    }
}

#[tokio::test]
async fn test_profit_and_loss_with_order_cost() {
    let f = ChartFixtures::standard();
    let orders = Arc::new(InMemoryOrderBook::new());
    let widget = ProductId::new();
    orders.set_unit_cost(widget, Money::new(dec!(150))).await;
    orders
        .record_delivery(DeliveredOrder {
            id: OrderId::new(),
            delivered_on: date(2024, 5, 10),
            lines: vec![OrderLine { product_id: widget, quantity: dec!(2) }],
        })
        .await;

    let svc = service(f.chart.clone(), LedgerConfig::default()).with_orders(orders);
    trade(&svc, &f).await;

    let pl = svc.profit_and_loss(fy()).await.unwrap();
    assert_eq!(pl.cogs_basis, CogsBasis::Orders);
    assert_money_eq(pl.total_income, Money::new(dec!(1000)));
    assert_money_eq(pl.cost_of_goods_sold, Money::new(dec!(300)));
    assert_money_eq(pl.gross_profit, Money::new(dec!(700)));
    assert_money_eq(pl.total_expenses, Money::new(dec!(100)));
    assert_money_eq(pl.net_profit, Money::new(dec!(600)));
    assert_no_warnings(&pl.warnings);
}

#[tokio::test]
async fn test_profit_and_loss_falls_back_to_ledger_cost() {
    let f = ChartFixtures::standard();
    let svc = service(f.chart.clone(), LedgerConfig::default());
    trade(&svc, &f).await;
    svc.post_voucher(
        TestVoucherBuilder::new()
            .on(date(2024, 6, 1))
            .transfer(f.cogs, f.inventory, dec!(250))
            .build(),
    )
    .await
    .unwrap();

    let pl = svc.profit_and_loss(fy()).await.unwrap();
    assert_eq!(pl.cogs_basis, CogsBasis::Ledger);
    assert_money_eq(pl.cost_of_goods_sold, Money::new(dec!(250)));
    // cost sits outside the expense trees
    assert_money_eq(pl.total_expenses, Money::new(dec!(100)));
    assert_money_eq(pl.net_profit, Money::new(dec!(650)));
}

#[tokio::test]
async fn test_delivery_cost_is_posted_against_inventory() {
    let f = ChartFixtures::standard();
    let orders = Arc::new(InMemoryOrderBook::new());
    let gadget = ProductId::new();
    orders.set_unit_cost(gadget, Money::new(dec!(40))).await;

    let svc = service(f.chart.clone(), LedgerConfig::default().with_cogs_basis(CogsBasis::Ledger))
        .with_orders(orders);
    let order = DeliveredOrder {
        id: OrderId::new(),
        delivered_on: date(2024, 8, 1),
        lines: vec![OrderLine { product_id: gadget, quantity: dec!(3) }],
    };

    let voucher = svc.record_delivery_cogs(&order).await.unwrap();
    assert_money_eq(voucher.totals().unwrap().debits, Money::new(dec!(120)));

    let balances = svc.balances(BalanceMode::to_date()).await.unwrap();
    assert_money_eq(balances.get(f.cogs), Money::new(dec!(120)));
    assert_money_eq(balances.get(f.inventory), Money::new(dec!(-120)));
}

#[tokio::test]
async fn test_delivery_cost_without_order_source_is_unavailable() {
    let f = ChartFixtures::standard();
    let svc = service(f.chart, LedgerConfig::default());
    let order = DeliveredOrder {
        id: OrderId::new(),
        delivered_on: date(2024, 8, 1),
        lines: Vec::new(),
    };

    let err = svc.record_delivery_cogs(&order).await.unwrap_err();
    assert!(matches!(err, LedgerError::Port(PortError::ServiceUnavailable { .. })));
}

#[tokio::test]
async fn test_receivables_and_payables() {
    let mut f = ChartFixtures::standard();
    let customer = ChartFixtures::party_ledger(&mut f.chart, "Acme Retail", PartyKind::Customer);
    let supplier = ChartFixtures::party_ledger(&mut f.chart, "Widget Co", PartyKind::Supplier);
    let svc = service(f.chart.clone(), LedgerConfig::default());

    svc.post_voucher(
        TestVoucherBuilder::new()
            .narration("Credit sale")
            .transfer(customer, f.sales, dec!(300))
            .build(),
    )
    .await
    .unwrap();
    svc.post_voucher(
        TestVoucherBuilder::new()
            .narration("Stock on credit")
            .transfer(f.inventory, supplier, dec!(200))
            .build(),
    )
    .await
    .unwrap();

    let report = svc.receivables_payables(None).await.unwrap();
    assert_money_eq(report.total_receivable, Money::new(dec!(300)));
    assert_money_eq(report.total_payable, Money::new(dec!(200)));
    assert_eq!(report.receivables[0].ledger_id, customer);
    assert_no_warnings(&report.warnings);
}

#[tokio::test]
async fn test_balance_sheet_and_statement() {
    let f = ChartFixtures::standard();
    let svc = service(f.chart.clone(), LedgerConfig::default());
    trade(&svc, &f).await;

    let sheet = svc.balance_sheet(None).await.unwrap();
    assert_money_eq(sheet.total_assets, Money::new(dec!(5900)));
    assert_money_eq(sheet.total_equity, Money::new(dec!(5000)));
    assert_money_eq(sheet.current_earnings, Money::new(dec!(900)));

    let window = DateWindow::between(date(2024, 5, 1), date(2024, 5, 31)).unwrap();
    let statement = svc.account_statement(f.cash, window).await.unwrap();
    assert_money_eq(statement.opening, Money::new(dec!(5000)));
    assert_eq!(statement.lines.len(), 2);
    assert_money_eq(statement.closing, Money::new(dec!(5900)));
    assert_money_eq(statement.lines[1].running_balance, Money::new(dec!(5900)));
}

#[tokio::test]
async fn test_reversal_restores_balances() {
    let f = ChartFixtures::standard();
    let svc = service(f.chart.clone(), LedgerConfig::default());
    let sale = svc
        .post_voucher(TestVoucherBuilder::new().transfer(f.bank, f.sales, dec!(80)).build())
        .await
        .unwrap();

    let reversal = svc
        .reverse_voucher(sale.id, date(2024, 6, 30), "posted twice")
        .await
        .unwrap();
    assert_eq!(reversal.reversal_of, Some(sale.id));

    let balances = svc.balances(BalanceMode::to_date()).await.unwrap();
    assert!(balances.get(f.bank).is_zero());
    assert!(balances.get(f.sales).is_zero());
}

#[tokio::test]
async fn test_lock_date_rejects_posting_in_closed_period() {
    let f = ChartFixtures::standard();
    let svc = service(f.chart.clone(), LedgerConfig::default().with_lock_date(date(2024, 6, 30)));

    let err = svc
        .post_voucher(
            TestVoucherBuilder::new()
                .on(date(2024, 6, 30))
                .transfer(f.cash, f.sales, dec!(10))
                .build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PeriodLocked { .. }));
    assert!(svc.list_vouchers(DateWindow::unbounded()).await.unwrap().is_empty());
}

/// Journal whose range reads stall
#[derive(Debug, Default)]
struct StalledJournal {
    inner: InMemoryJournalStore,
}

impl DomainPort for StalledJournal {}

#[async_trait]
impl HealthCheckable for StalledJournal {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl JournalPort for StalledJournal {
    async fn append(
        &self,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        self.inner.append(draft, chart, policy).await
    }

    async fn replace(
        &self,
        id: VoucherId,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        self.inner.replace(id, draft, chart, policy).await
    }

    async fn delete(&self, id: VoucherId, policy: &PostingPolicy) -> Result<Voucher, LedgerError> {
        self.inner.delete(id, policy).await
    }

    async fn get(&self, id: VoucherId) -> Result<Voucher, LedgerError> {
        self.inner.get(id).await
    }

    async fn list_in_range(&self, window: DateWindow) -> Result<Vec<Voucher>, LedgerError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.inner.list_in_range(window).await
    }

    async fn count(&self) -> Result<usize, LedgerError> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn test_report_read_times_out() {
    let f = ChartFixtures::standard();
    let config = LedgerConfig {
        read_timeout_ms: 20,
        ..LedgerConfig::default()
    };
    let svc = LedgerService::new(
        Arc::new(InMemoryChartStore::new(f.chart)),
        Arc::new(StalledJournal::default()),
        config,
    );

    let err = svc.trial_balance(None).await.unwrap_err();
    assert!(matches!(err, LedgerError::Port(PortError::Timeout { duration_ms: 20, .. })));
}

#[tokio::test]
async fn test_unknown_voucher_is_not_found() {
    let f = ChartFixtures::standard();
    let svc = service(f.chart, LedgerConfig::default());

    let err = svc.get_voucher(VoucherId::new()).await.unwrap_err();
    assert!(err.is_not_found());
}
