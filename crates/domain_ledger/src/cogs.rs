//! Cost of goods sold
//!
//! Orders and products are owned by the sales and inventory flows; the
//! ledger reads them through `OrderPort`. Cost can be computed straight from
//! delivered orders, or recorded as a voucher at delivery time so the
//! ledger's own cost-of-goods-sold group carries it.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use core_kernel::{
    AdapterHealth, DateWindow, DomainPort, HealthCheckResult, HealthCheckable, LedgerId, Money,
    OperationMetadata, OrderId, PortError, ProductId,
};

use crate::error::LedgerError;
use crate::voucher::{VoucherDraft, VoucherType};

/// A product line on an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
}

/// An order that has been delivered to the customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredOrder {
    pub id: OrderId,
    pub delivered_on: NaiveDate,
    pub lines: Vec<OrderLine>,
}

/// Read access to orders and product costs
#[async_trait]
pub trait OrderPort: DomainPort + HealthCheckable {
    /// Orders delivered inside the window
    async fn list_delivered_orders(
        &self,
        window: DateWindow,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<DeliveredOrder>, PortError>;

    /// Current unit cost of a product
    async fn unit_cost(
        &self,
        product_id: ProductId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Money, PortError>;
}

/// Sums quantity times unit cost over order lines
///
/// # Errors
///
/// `InvalidEntry` for a negative quantity or a product without a cost
pub fn order_cost(
    order: &DeliveredOrder,
    costs: &HashMap<ProductId, Money>,
) -> Result<Money, LedgerError> {
    let mut total = Money::ZERO;
    for line in &order.lines {
        if line.quantity.is_sign_negative() && !line.quantity.is_zero() {
            return Err(LedgerError::InvalidEntry(format!(
                "negative quantity for {} on {}",
                line.product_id, order.id
            )));
        }
        let unit = costs.get(&line.product_id).ok_or_else(|| {
            LedgerError::InvalidEntry(format!("no unit cost for {}", line.product_id))
        })?;
        total = total.checked_add(&unit.checked_mul(line.quantity)?)?;
    }
    Ok(total)
}

/// Cost of goods sold for orders delivered inside the window
pub async fn cogs_for_window(
    orders: &dyn OrderPort,
    window: DateWindow,
) -> Result<Money, LedgerError> {
    let delivered = orders.list_delivered_orders(window, None).await?;

    let mut costs = HashMap::new();
    for order in &delivered {
        for line in &order.lines {
            if !costs.contains_key(&line.product_id) {
                let cost = orders.unit_cost(line.product_id, None).await?;
                costs.insert(line.product_id, cost);
            }
        }
    }

    let mut total = Money::ZERO;
    for order in delivered.iter().filter(|o| window.contains(o.delivered_on)) {
        total = total.checked_add(&order_cost(order, &costs)?)?;
    }

    debug!(orders = delivered.len(), total = %total, "Computed cost of goods sold");
    Ok(total)
}

/// A voucher moving an order's cost from inventory to cost of goods sold
///
/// # Errors
///
/// `ZeroValueVoucher` if the order costs nothing
pub fn cogs_voucher(
    order: &DeliveredOrder,
    costs: &HashMap<ProductId, Money>,
    cogs_ledger: LedgerId,
    inventory_ledger: LedgerId,
) -> Result<VoucherDraft, LedgerError> {
    let cost = order_cost(order, costs)?;
    if cost.is_zero() {
        return Err(LedgerError::ZeroValueVoucher);
    }

    Ok(VoucherDraft::new(format!("Cost of goods for {}", order.id), order.delivered_on)
        .of_type(VoucherType::Journal)
        .debit(cogs_ledger, cost)
        .credit(inventory_ledger, cost))
}

/// In-memory order book
#[derive(Debug, Default)]
pub struct InMemoryOrderBook {
    orders: tokio::sync::RwLock<Vec<DeliveredOrder>>,
    costs: tokio::sync::RwLock<HashMap<ProductId, Money>>,
}

impl InMemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_delivery(&self, order: DeliveredOrder) {
        self.orders.write().await.push(order);
    }

    pub async fn set_unit_cost(&self, product_id: ProductId, cost: Money) {
        self.costs.write().await.insert(product_id, cost);
    }
}

impl DomainPort for InMemoryOrderBook {}

#[async_trait]
impl HealthCheckable for InMemoryOrderBook {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-order-book".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl OrderPort for InMemoryOrderBook {
    async fn list_delivered_orders(
        &self,
        window: DateWindow,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<DeliveredOrder>, PortError> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| window.contains(o.delivered_on))
            .cloned()
            .collect())
    }

    async fn unit_cost(
        &self,
        product_id: ProductId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Money, PortError> {
        self.costs
            .read()
            .await
            .get(&product_id)
            .copied()
            .ok_or_else(|| PortError::not_found("ProductCost", product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn order(on: NaiveDate, lines: &[(ProductId, Decimal)]) -> DeliveredOrder {
        DeliveredOrder {
            id: OrderId::new(),
            delivered_on: on,
            lines: lines
                .iter()
                .map(|(p, q)| OrderLine { product_id: *p, quantity: *q })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_cogs_for_window_multiplies_quantity_by_cost() {
        let (widget, gadget) = (ProductId::new(), ProductId::new());
        let book = InMemoryOrderBook::new();
        book.set_unit_cost(widget, Money::new(dec!(2.50))).await;
        book.set_unit_cost(gadget, Money::new(dec!(10))).await;
        book.record_delivery(order(date(3, 5), &[(widget, dec!(4)), (gadget, dec!(1))])).await;
        book.record_delivery(order(date(4, 1), &[(gadget, dec!(3))])).await;

        let march = DateWindow::between(date(3, 1), date(3, 31)).unwrap();
        let cogs = cogs_for_window(&book, march).await.unwrap();
        assert_eq!(cogs, Money::new(dec!(20)));
    }

    #[tokio::test]
    async fn test_missing_cost_is_an_error() {
        let book = InMemoryOrderBook::new();
        book.record_delivery(order(date(3, 5), &[(ProductId::new(), dec!(1))])).await;

        let result = cogs_for_window(&book, DateWindow::unbounded()).await;
        assert!(matches!(result, Err(LedgerError::Port(e)) if e.is_not_found()));
    }

    #[test]
    fn test_cogs_voucher_moves_cost_out_of_inventory() {
        let widget = ProductId::new();
        let costs = HashMap::from([(widget, Money::new(dec!(3)))]);
        let delivered = order(date(5, 2), &[(widget, dec!(5))]);
        let (cogs, inventory) = (LedgerId::new(), LedgerId::new());

        let draft = cogs_voucher(&delivered, &costs, cogs, inventory).unwrap();
        let totals = draft.check_shape().unwrap();
        assert_eq!(totals.debits, Money::new(dec!(15)));
        assert_eq!(draft.entries[0].account_id, cogs);
        assert_eq!(draft.date, date(5, 2));
    }

    #[test]
    fn test_zero_cost_order_has_no_voucher() {
        let widget = ProductId::new();
        let costs = HashMap::from([(widget, Money::ZERO)]);
        let delivered = order(date(5, 2), &[(widget, dec!(5))]);
        let result = cogs_voucher(&delivered, &costs, LedgerId::new(), LedgerId::new());
        assert!(matches!(result, Err(LedgerError::ZeroValueVoucher)));
    }
}
