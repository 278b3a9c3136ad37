//! Chart of accounts
//!
//! Groups form a forest: every group has at most one parent, and following
//! parent links from any group terminates at a root. Ledgers are the leaves
//! that carry balances. Each group and ledger has a `Nature` which decides
//! how its balance is read in reports.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use core_kernel::{GroupId, LedgerId, Money};

use crate::error::LedgerError;

/// Accounting nature of a group or ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nature {
    /// Debit normal balance
    Asset,
    /// Credit normal balance
    Liability,
    /// Credit normal balance
    Income,
    /// Debit normal balance
    Expense,
    /// Credit normal balance
    Equity,
}

impl Nature {
    /// Returns true if this nature has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Nature::Asset | Nature::Expense)
    }

    /// Returns true for natures that appear in the profit and loss statement
    pub fn is_nominal(&self) -> bool {
        matches!(self, Nature::Income | Nature::Expense)
    }

    /// Storage code
    pub fn code(&self) -> &'static str {
        match self {
            Nature::Asset => "asset",
            Nature::Liability => "liability",
            Nature::Income => "income",
            Nature::Expense => "expense",
            Nature::Equity => "equity",
        }
    }

    /// Parses a storage code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "asset" => Some(Nature::Asset),
            "liability" => Some(Nature::Liability),
            "income" => Some(Nature::Income),
            "expense" => Some(Nature::Expense),
            "equity" => Some(Nature::Equity),
            _ => None,
        }
    }
}

/// Side of an opening balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrCr {
    Dr,
    Cr,
}

impl DrCr {
    pub fn code(&self) -> &'static str {
        match self {
            DrCr::Dr => "dr",
            DrCr::Cr => "cr",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "dr" => Some(DrCr::Dr),
            "cr" => Some(DrCr::Cr),
            _ => None,
        }
    }
}

/// A ledger's balance before any voucher was recorded against it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningBalance {
    /// Non-negative magnitude
    pub amount: Money,
    /// Debit or credit
    pub side: DrCr,
    /// Date the figure was taken on
    pub as_of: NaiveDate,
}

impl OpeningBalance {
    /// Creates an opening balance
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Money` if `amount` is negative
    pub fn new(amount: Decimal, side: DrCr, as_of: NaiveDate) -> Result<Self, LedgerError> {
        Ok(Self {
            amount: Money::non_negative(amount)?,
            side,
            as_of,
        })
    }

    /// A zero opening balance
    pub fn zero(as_of: NaiveDate) -> Self {
        Self {
            amount: Money::ZERO,
            side: DrCr::Dr,
            as_of,
        }
    }

    /// Signed value under the debit-positive convention
    pub fn signed(&self) -> Money {
        match self.side {
            DrCr::Dr => self.amount,
            DrCr::Cr => -self.amount,
        }
    }
}

/// Operational classification of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerType {
    Cash,
    Bank,
    Receivable,
    Payable,
    Inventory,
    General,
}

impl LedgerType {
    /// Returns true for ledgers that record a party's balance
    pub fn is_party(&self) -> bool {
        matches!(self, LedgerType::Receivable | LedgerType::Payable)
    }

    pub fn code(&self) -> &'static str {
        match self {
            LedgerType::Cash => "cash",
            LedgerType::Bank => "bank",
            LedgerType::Receivable => "receivable",
            LedgerType::Payable => "payable",
            LedgerType::Inventory => "inventory",
            LedgerType::General => "general",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "cash" => Some(LedgerType::Cash),
            "bank" => Some(LedgerType::Bank),
            "receivable" => Some(LedgerType::Receivable),
            "payable" => Some(LedgerType::Payable),
            "inventory" => Some(LedgerType::Inventory),
            "general" => Some(LedgerType::General),
            _ => None,
        }
    }
}

/// A node in the group hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// `None` for a root group
    pub parent_id: Option<GroupId>,
    pub nature: Nature,
    /// Depth in the hierarchy, roots are level 0
    pub level: u32,
}

impl Group {
    /// Creates a root group
    pub fn root(name: impl Into<String>, nature: Nature) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            parent_id: None,
            nature,
            level: 0,
        }
    }

    /// Creates a child group inheriting the parent's nature
    pub fn child(name: impl Into<String>, parent: &Group) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            parent_id: Some(parent.id),
            nature: parent.nature,
            level: parent.level + 1,
        }
    }

    /// Overrides the nature
    pub fn with_nature(mut self, nature: Nature) -> Self {
        self.nature = nature;
        self
    }

    /// Overrides the id
    pub fn with_id(mut self, id: GroupId) -> Self {
        self.id = id;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Whether a ledger accepts postings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Active,
    Inactive,
}

/// A leaf account carrying a balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: LedgerId,
    pub name: String,
    pub group_id: GroupId,
    pub nature: Nature,
    pub ledger_type: LedgerType,
    pub opening_balance: OpeningBalance,
    /// Summary ledgers can be named in reports but not posted to
    pub is_posting: bool,
    pub status: LedgerStatus,
}

impl Ledger {
    /// Creates an active posting ledger under `group`, taking its nature
    pub fn new(name: impl Into<String>, group: &Group, ledger_type: LedgerType) -> Self {
        Self {
            id: LedgerId::new(),
            name: name.into(),
            group_id: group.id,
            nature: group.nature,
            ledger_type,
            opening_balance: OpeningBalance::zero(Utc::now().date_naive()),
            is_posting: true,
            status: LedgerStatus::Active,
        }
    }

    pub fn with_id(mut self, id: LedgerId) -> Self {
        self.id = id;
        self
    }

    pub fn with_opening(mut self, opening: OpeningBalance) -> Self {
        self.opening_balance = opening;
        self
    }

    /// Marks the ledger as summary-only
    pub fn non_posting(mut self) -> Self {
        self.is_posting = false;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == LedgerStatus::Active
    }
}

/// Well-known groups the system looks up by role rather than by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRole {
    TradeReceivables,
    TradePayables,
    CostOfGoodsSold,
    Cash,
    Bank,
    Sales,
    Inventory,
}

impl CanonicalRole {
    pub fn code(&self) -> &'static str {
        match self {
            CanonicalRole::TradeReceivables => "trade_receivables",
            CanonicalRole::TradePayables => "trade_payables",
            CanonicalRole::CostOfGoodsSold => "cost_of_goods_sold",
            CanonicalRole::Cash => "cash",
            CanonicalRole::Bank => "bank",
            CanonicalRole::Sales => "sales",
            CanonicalRole::Inventory => "inventory",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "trade_receivables" => Some(CanonicalRole::TradeReceivables),
            "trade_payables" => Some(CanonicalRole::TradePayables),
            "cost_of_goods_sold" => Some(CanonicalRole::CostOfGoodsSold),
            "cash" => Some(CanonicalRole::Cash),
            "bank" => Some(CanonicalRole::Bank),
            "sales" => Some(CanonicalRole::Sales),
            "inventory" => Some(CanonicalRole::Inventory),
            _ => None,
        }
    }
}

/// An in-memory chart of accounts
///
/// # Invariants
///
/// - Every `parent_id` and every ledger's `group_id` resolves
/// - The group hierarchy is acyclic
/// - Ids are unique
///
/// Iteration follows insertion order so reports are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    groups: HashMap<GroupId, Group>,
    ledgers: HashMap<LedgerId, Ledger>,
    roles: HashMap<CanonicalRole, GroupId>,
    group_order: Vec<GroupId>,
    ledger_order: Vec<LedgerId>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group
    ///
    /// # Errors
    ///
    /// - `DuplicateAccount` if the id is taken
    /// - `UnknownGroup` if the parent does not exist
    /// - `CycleDetected` if the parent's ancestry is already corrupt
    pub fn add_group(&mut self, mut group: Group) -> Result<(), LedgerError> {
        if self.groups.contains_key(&group.id) {
            return Err(LedgerError::DuplicateAccount(group.id.to_string()));
        }

        match group.parent_id {
            Some(parent_id) => {
                if parent_id == group.id {
                    return Err(LedgerError::CycleDetected(group.id));
                }
                group.level = self.ancestors(parent_id)?.len() as u32;
            }
            None => group.level = 0,
        }

        self.group_order.push(group.id);
        self.groups.insert(group.id, group);
        Ok(())
    }

    /// Moves a group under a new parent
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected` if the new parent is the group itself or one
    /// of its descendants. The chart is left unchanged on error.
    pub fn move_group(
        &mut self,
        group_id: GroupId,
        new_parent: Option<GroupId>,
    ) -> Result<(), LedgerError> {
        self.get_group(group_id)?;

        if let Some(parent_id) = new_parent {
            let chain = self.ancestors(parent_id)?;
            if parent_id == group_id || chain.contains(&group_id) {
                return Err(LedgerError::CycleDetected(group_id));
            }
        }

        if let Some(group) = self.groups.get_mut(&group_id) {
            group.parent_id = new_parent;
        }
        self.relevel(group_id)
    }

    fn relevel(&mut self, root: GroupId) -> Result<(), LedgerError> {
        let mut stack = vec![root];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(LedgerError::CycleDetected(id));
            }
            let level = self.ancestors(id)?.len() as u32 - 1;
            if let Some(group) = self.groups.get_mut(&id) {
                group.level = level;
            }
            stack.extend(self.child_groups(id).iter().map(|g| g.id));
        }
        Ok(())
    }

    /// Adds a ledger
    ///
    /// # Errors
    ///
    /// - `DuplicateAccount` if the id is taken
    /// - `UnknownGroup` if the group does not exist
    pub fn add_ledger(&mut self, ledger: Ledger) -> Result<(), LedgerError> {
        if self.ledgers.contains_key(&ledger.id) {
            return Err(LedgerError::DuplicateAccount(ledger.id.to_string()));
        }
        self.get_group(ledger.group_id)?;

        self.ledger_order.push(ledger.id);
        self.ledgers.insert(ledger.id, ledger);
        Ok(())
    }

    /// Replaces a ledger's stored record, keeping its position
    pub fn update_ledger(&mut self, ledger: Ledger) -> Result<(), LedgerError> {
        self.get_group(ledger.group_id)?;
        match self.ledgers.get_mut(&ledger.id) {
            Some(existing) => {
                *existing = ledger;
                Ok(())
            }
            None => Err(LedgerError::UnknownAccount(ledger.id)),
        }
    }

    pub fn get_group(&self, id: GroupId) -> Result<&Group, LedgerError> {
        self.groups.get(&id).ok_or(LedgerError::UnknownGroup(id))
    }

    pub fn get_ledger(&self, id: LedgerId) -> Result<&Ledger, LedgerError> {
        self.ledgers.get(&id).ok_or(LedgerError::UnknownAccount(id))
    }

    pub fn contains_ledger(&self, id: LedgerId) -> bool {
        self.ledgers.contains_key(&id)
    }

    /// Groups in insertion order
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.group_order.iter().filter_map(|id| self.groups.get(id))
    }

    /// Ledgers in insertion order
    pub fn ledgers(&self) -> impl Iterator<Item = &Ledger> {
        self.ledger_order.iter().filter_map(|id| self.ledgers.get(id))
    }

    pub fn root_groups(&self) -> Vec<&Group> {
        self.groups().filter(|g| g.is_root()).collect()
    }

    pub fn child_groups(&self, id: GroupId) -> Vec<&Group> {
        self.groups().filter(|g| g.parent_id == Some(id)).collect()
    }

    /// Ledgers directly under a group
    pub fn ledgers_of(&self, id: GroupId) -> Vec<&Ledger> {
        self.ledgers().filter(|l| l.group_id == id).collect()
    }

    /// Finds a ledger by exact name
    pub fn find_by_name(&self, name: &str) -> Option<&Ledger> {
        self.ledgers().find(|l| l.name == name)
    }

    /// The chain from `id` up to its root, starting with `id` itself
    ///
    /// # Errors
    ///
    /// `UnknownGroup` for a dangling link, `CycleDetected` if a group repeats
    pub fn ancestors(&self, id: GroupId) -> Result<Vec<GroupId>, LedgerError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);

        while let Some(group_id) = current {
            if !seen.insert(group_id) {
                return Err(LedgerError::CycleDetected(group_id));
            }
            let group = self.get_group(group_id)?;
            chain.push(group_id);
            current = group.parent_id;
        }

        Ok(chain)
    }

    /// Returns true if `id` is `ancestor` or sits below it
    pub fn is_within(&self, id: GroupId, ancestor: GroupId) -> Result<bool, LedgerError> {
        Ok(self.ancestors(id)?.contains(&ancestor))
    }

    /// Assigns a group to a canonical role, replacing any previous holder
    pub fn assign_role(&mut self, role: CanonicalRole, group_id: GroupId) -> Result<(), LedgerError> {
        self.get_group(group_id)?;
        self.roles.insert(role, group_id);
        Ok(())
    }

    /// The group assigned to a role
    pub fn canonical_group(&self, role: CanonicalRole) -> Result<&Group, LedgerError> {
        let id = self
            .roles
            .get(&role)
            .ok_or_else(|| LedgerError::RoleNotAssigned(role.code().to_string()))?;
        self.get_group(*id)
    }

    pub fn role_of(&self, role: CanonicalRole) -> Option<GroupId> {
        self.roles.get(&role).copied()
    }

    /// Role assignments as pairs
    pub fn roles(&self) -> impl Iterator<Item = (CanonicalRole, GroupId)> + '_ {
        self.roles.iter().map(|(r, g)| (*r, *g))
    }

    /// Child groups whose nature differs from their parent's
    ///
    /// Nature is stored per group rather than inherited, so reports follow
    /// each root's nature. Divergent children are surfaced here for review.
    pub fn nature_divergences(&self) -> Vec<(GroupId, GroupId)> {
        self.groups()
            .filter_map(|g| {
                let parent = self.groups.get(&g.parent_id?)?;
                (parent.nature != g.nature).then_some((g.id, parent.id))
            })
            .collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn ledger_count(&self) -> usize {
        self.ledgers.len()
    }
}

/// Builder for a small trading-business chart
pub struct StandardChart;

impl StandardChart {
    /// Creates the standard chart with every canonical role assigned
    ///
    /// Roots: Assets, Liabilities, Equity, Income, Expenses. Posting ledgers
    /// are created for cash, bank, inventory, sales, capital, purchases, and
    /// cost of goods sold.
    pub fn create() -> Result<ChartOfAccounts, LedgerError> {
        let mut chart = ChartOfAccounts::new();

        let assets = Group::root("Assets", Nature::Asset);
        let current_assets = Group::child("Current Assets", &assets);
        let cash = Group::child("Cash-in-Hand", &current_assets);
        let bank = Group::child("Bank Accounts", &current_assets);
        let receivables = Group::child("Sundry Debtors", &current_assets);
        let inventory = Group::child("Stock-in-Hand", &current_assets);

        let liabilities = Group::root("Liabilities", Nature::Liability);
        let current_liabilities = Group::child("Current Liabilities", &liabilities);
        let payables = Group::child("Sundry Creditors", &current_liabilities);

        let equity = Group::root("Equity", Nature::Equity);
        let capital = Group::child("Capital Account", &equity);

        let income = Group::root("Income", Nature::Income);
        let sales = Group::child("Sales Accounts", &income);

        let expenses = Group::root("Expenses", Nature::Expense);
        let cogs = Group::child("Cost of Goods Sold", &expenses);
        let indirect = Group::child("Indirect Expenses", &expenses);

        let ledgers = vec![
            Ledger::new("Cash", &cash, LedgerType::Cash),
            Ledger::new("Bank", &bank, LedgerType::Bank),
            Ledger::new("Inventory", &inventory, LedgerType::Inventory),
            Ledger::new("Sales", &sales, LedgerType::General),
            Ledger::new("Capital", &capital, LedgerType::General),
            Ledger::new("Cost of Goods Sold", &cogs, LedgerType::General),
            Ledger::new("Rent", &indirect, LedgerType::General),
        ];

        let roles = [
            (CanonicalRole::Cash, cash.id),
            (CanonicalRole::Bank, bank.id),
            (CanonicalRole::TradeReceivables, receivables.id),
            (CanonicalRole::Inventory, inventory.id),
            (CanonicalRole::TradePayables, payables.id),
            (CanonicalRole::Sales, sales.id),
            (CanonicalRole::CostOfGoodsSold, cogs.id),
        ];

        for group in [
            assets,
            current_assets,
            cash,
            bank,
            receivables,
            inventory,
            liabilities,
            current_liabilities,
            payables,
            equity,
            capital,
            income,
            sales,
            expenses,
            cogs,
            indirect,
        ] {
            chart.add_group(group)?;
        }
        for ledger in ledgers {
            chart.add_ledger(ledger)?;
        }
        for (role, group_id) in roles {
            chart.assign_role(role, group_id)?;
        }

        Ok(chart)
    }
}
