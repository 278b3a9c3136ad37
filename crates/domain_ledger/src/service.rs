//! Ledger application service
//!
//! Ties the chart, journal, and order ports together. Writes take a chart
//! snapshot and hand it to the journal, which validates and commits in one
//! step. Reports read a chart snapshot and one journal range under the
//! configured deadline, then run the pure report functions over them.
//!
//! The snapshot is taken before the journal's write lock. The Postgres
//! journal re-reads the touched ledgers under that lock; the in-memory
//! journal trusts the snapshot, so a ledger deactivated between the two
//! steps can still take that one posting there.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{DateWindow, GroupId, LedgerId, PortError, VoucherId};

use crate::balance::{account_statement, AccountStatement, BalanceEngine, BalanceMode, BalanceSet};
use crate::chart::{CanonicalRole, ChartOfAccounts, Ledger};
use crate::cogs::{cogs_for_window, cogs_voucher, DeliveredOrder, OrderPort};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ports::{ChartPort, JournalPort};
use crate::report::{
    balance_sheet_summary, group_tree, profit_and_loss, receivables_and_payables, trial_balance,
    BalanceSheetSummary, CogsBasis, CogsSource, GroupBalanceNode, ProfitAndLossReport,
    ReceivablesPayablesReport, TrialBalanceReport,
};
use crate::voucher::{Voucher, VoucherDraft};

/// Entry point for posting and reporting
pub struct LedgerService {
    chart: Arc<dyn ChartPort>,
    journal: Arc<dyn JournalPort>,
    orders: Option<Arc<dyn OrderPort>>,
    config: LedgerConfig,
}

impl LedgerService {
    pub fn new(chart: Arc<dyn ChartPort>, journal: Arc<dyn JournalPort>, config: LedgerConfig) -> Self {
        Self {
            chart,
            journal,
            orders: None,
            config,
        }
    }

    /// Attaches the order source used for order-based cost of goods sold
    pub fn with_orders(mut self, orders: Arc<dyn OrderPort>) -> Self {
        self.orders = Some(orders);
        self
    }

    pub fn chart(&self) -> &Arc<dyn ChartPort> {
        &self.chart
    }

    pub fn journal(&self) -> &Arc<dyn JournalPort> {
        &self.journal
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validates and appends a voucher
    #[instrument(skip(self, draft), fields(date = %draft.date))]
    pub async fn post_voucher(&self, draft: VoucherDraft) -> Result<Voucher, LedgerError> {
        let chart = self.chart.snapshot().await?;
        self.journal
            .append(draft, &chart, &self.config.posting_policy())
            .await
    }

    /// Replaces a voucher's content, keeping its id
    #[instrument(skip(self, draft))]
    pub async fn replace_voucher(
        &self,
        id: VoucherId,
        draft: VoucherDraft,
    ) -> Result<Voucher, LedgerError> {
        let chart = self.chart.snapshot().await?;
        self.journal
            .replace(id, draft, &chart, &self.config.posting_policy())
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_voucher(&self, id: VoucherId) -> Result<Voucher, LedgerError> {
        self.journal.delete(id, &self.config.posting_policy()).await
    }

    /// Appends a voucher that undoes `id`
    #[instrument(skip(self))]
    pub async fn reverse_voucher(
        &self,
        id: VoucherId,
        date: NaiveDate,
        reason: &str,
    ) -> Result<Voucher, LedgerError> {
        let original = self.journal.get(id).await?;
        let reversal = self.post_voucher(original.reversal(date, reason)).await?;
        info!(original = %id, reversal = %reversal.id, "Voucher reversed");
        Ok(reversal)
    }

    pub async fn get_voucher(&self, id: VoucherId) -> Result<Voucher, LedgerError> {
        self.journal.get(id).await
    }

    pub async fn list_vouchers(&self, window: DateWindow) -> Result<Vec<Voucher>, LedgerError> {
        self.journal.list_in_range(window).await
    }

    /// Chart snapshot and journal range under the read deadline
    async fn read(&self, window: DateWindow) -> Result<(ChartOfAccounts, Vec<Voucher>), LedgerError> {
        let load = async {
            let chart = self.chart.snapshot().await?;
            let vouchers = self.journal.list_in_range(window).await?;
            Ok::<_, LedgerError>((chart, vouchers))
        };

        match tokio::time::timeout(self.config.read_timeout(), load).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.config.read_timeout_ms, "Journal read timed out");
                Err(LedgerError::Port(PortError::timeout(
                    "journal read",
                    self.config.read_timeout_ms,
                )))
            }
        }
    }

    async fn balances_with_chart(
        &self,
        mode: BalanceMode,
    ) -> Result<(ChartOfAccounts, BalanceSet), LedgerError> {
        let (chart, vouchers) = self.read(mode.window()).await?;
        let balances = BalanceEngine::compute(&chart, &vouchers, mode)?;
        Ok((chart, balances))
    }

    /// Signed balances for every ledger
    #[instrument(skip(self))]
    pub async fn balances(&self, mode: BalanceMode) -> Result<BalanceSet, LedgerError> {
        Ok(self.balances_with_chart(mode).await?.1)
    }

    #[instrument(skip(self))]
    pub async fn trial_balance(&self, as_of: Option<NaiveDate>) -> Result<TrialBalanceReport, LedgerError> {
        let (chart, balances) = self
            .balances_with_chart(BalanceMode::Cumulative { as_of })
            .await?;
        trial_balance(&chart, &balances, self.config.integrity_tolerance)
    }

    /// Profit and loss over the window's movement
    #[instrument(skip(self))]
    pub async fn profit_and_loss(&self, window: DateWindow) -> Result<ProfitAndLossReport, LedgerError> {
        let (chart, balances) = self
            .balances_with_chart(BalanceMode::movement(window))
            .await?;

        let cogs = match (self.config.cogs_basis, &self.orders) {
            (CogsBasis::Orders, Some(orders)) => {
                CogsSource::FromOrders(cogs_for_window(orders.as_ref(), window).await?)
            }
            (CogsBasis::Orders, None) => {
                warn!("No order source configured, using ledger cost of goods sold");
                CogsSource::FromLedger
            }
            (CogsBasis::Ledger, _) => CogsSource::FromLedger,
        };

        profit_and_loss(&chart, &balances, window, cogs)
    }

    #[instrument(skip(self))]
    pub async fn receivables_payables(
        &self,
        as_of: Option<NaiveDate>,
    ) -> Result<ReceivablesPayablesReport, LedgerError> {
        let (chart, balances) = self
            .balances_with_chart(BalanceMode::Cumulative { as_of })
            .await?;
        receivables_and_payables(&chart, &balances, self.config.party_scope)
    }

    #[instrument(skip(self))]
    pub async fn group_tree(
        &self,
        group_id: GroupId,
        mode: BalanceMode,
    ) -> Result<GroupBalanceNode, LedgerError> {
        let (chart, balances) = self.balances_with_chart(mode).await?;
        group_tree(&chart, &balances, group_id)
    }

    #[instrument(skip(self))]
    pub async fn balance_sheet(&self, as_of: Option<NaiveDate>) -> Result<BalanceSheetSummary, LedgerError> {
        let (chart, balances) = self
            .balances_with_chart(BalanceMode::Cumulative { as_of })
            .await?;
        balance_sheet_summary(&chart, &balances)
    }

    /// Statement of one ledger over a window
    #[instrument(skip(self))]
    pub async fn account_statement(
        &self,
        ledger_id: LedgerId,
        window: DateWindow,
    ) -> Result<AccountStatement, LedgerError> {
        let history = DateWindow {
            from: None,
            to: window.to,
        };
        let (chart, vouchers) = self.read(history).await?;
        account_statement(&chart, ledger_id, &vouchers, &window)
    }

    /// Posts the cost of a delivered order against inventory
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn record_delivery_cogs(&self, order: &DeliveredOrder) -> Result<Voucher, LedgerError> {
        let orders = self.orders.as_ref().ok_or_else(|| {
            LedgerError::Port(PortError::unavailable("orders"))
        })?;

        let mut costs = HashMap::new();
        for line in &order.lines {
            costs.insert(line.product_id, orders.unit_cost(line.product_id, None).await?);
        }

        let chart = self.chart.snapshot().await?;
        let cogs_ledger = role_ledger(&chart, CanonicalRole::CostOfGoodsSold)?;
        let inventory_ledger = role_ledger(&chart, CanonicalRole::Inventory)?;

        let draft = cogs_voucher(order, &costs, cogs_ledger.id, inventory_ledger.id)?;
        self.journal
            .append(draft, &chart, &self.config.posting_policy())
            .await
    }
}

/// First active posting ledger directly under a role's group
fn role_ledger(chart: &ChartOfAccounts, role: CanonicalRole) -> Result<&Ledger, LedgerError> {
    let group = chart.canonical_group(role)?;
    chart
        .ledgers_of(group.id)
        .into_iter()
        .find(|l| l.is_posting && l.is_active())
        .ok_or_else(|| {
            LedgerError::InvalidEntry(format!("no posting ledger under {}", group.name))
        })
}
