//! Group roll-ups
//!
//! A group's balance is the sum of its own ledgers plus the balances of its
//! child groups, recursively.

use serde::Serialize;
use std::collections::HashSet;

use core_kernel::{GroupId, LedgerId, Money};

use crate::balance::BalanceSet;
use crate::chart::{ChartOfAccounts, Nature};
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerBalanceLine {
    pub ledger_id: LedgerId,
    pub name: String,
    pub balance: Money,
}

/// A group with its ledgers, sub-groups, and rolled-up total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBalanceNode {
    pub group_id: GroupId,
    pub name: String,
    pub nature: Nature,
    pub level: u32,
    pub ledgers: Vec<LedgerBalanceLine>,
    pub children: Vec<GroupBalanceNode>,
    /// Signed roll-up, debit positive
    pub total: Money,
}

impl GroupBalanceNode {
    /// Depth-first walk over this node and its descendants
    pub fn walk(&self) -> Vec<&GroupBalanceNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// Rolled-up signed balance of a group
pub fn group_balance(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    group_id: GroupId,
) -> Result<Money, LedgerError> {
    Ok(group_tree(chart, balances, group_id)?.total)
}

/// The balance tree rooted at a group
pub fn group_tree(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    group_id: GroupId,
) -> Result<GroupBalanceNode, LedgerError> {
    group_tree_excluding(chart, balances, group_id, &[])
}

/// The balance tree rooted at a group, leaving out the excluded subtrees
///
/// An excluded root yields an empty node with a zero total.
pub fn group_tree_excluding(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    group_id: GroupId,
    excluded: &[GroupId],
) -> Result<GroupBalanceNode, LedgerError> {
    let mut path = HashSet::new();
    build(chart, balances, group_id, excluded, &mut path)
}

fn build(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    group_id: GroupId,
    excluded: &[GroupId],
    path: &mut HashSet<GroupId>,
) -> Result<GroupBalanceNode, LedgerError> {
    // a group already on the current path means the hierarchy loops
    if !path.insert(group_id) {
        return Err(LedgerError::CycleDetected(group_id));
    }

    let group = chart.get_group(group_id)?;
    let mut node = GroupBalanceNode {
        group_id,
        name: group.name.clone(),
        nature: group.nature,
        level: group.level,
        ledgers: Vec::new(),
        children: Vec::new(),
        total: Money::ZERO,
    };

    if !excluded.contains(&group_id) {
        for ledger in chart.ledgers_of(group_id) {
            let balance = balances.get(ledger.id);
            node.total = node.total.checked_add(&balance)?;
            node.ledgers.push(LedgerBalanceLine {
                ledger_id: ledger.id,
                name: ledger.name.clone(),
                balance,
            });
        }

        for child in chart.child_groups(group_id) {
            if excluded.contains(&child.id) {
                continue;
            }
            let child_node = build(chart, balances, child.id, excluded, path)?;
            node.total = node.total.checked_add(&child_node.total)?;
            node.children.push(child_node);
        }
    }

    path.remove(&group_id);
    Ok(node)
}
