//! Pre-built Test Fixtures
//!
//! Provides ready-to-use charts, dates, and parties. These fixtures are
//! designed to be consistent and predictable for unit and integration tests.

use chrono::NaiveDate;
use core_kernel::{LedgerId, Money};
use domain_ledger::{
    CanonicalRole, ChartOfAccounts, DrCr, Group, Ledger, LedgerType, Nature, OpeningBalance,
    StandardChart,
};
use domain_party::{Party, PartyKind};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;

static FY_START: Lazy<NaiveDate> = Lazy::new(|| date(2024, 4, 1));

static SHARED_STANDARD: Lazy<StandardFixture> = Lazy::new(ChartFixtures::standard);

/// Shorthand for a calendar date
///
/// # Panics
///
/// Panics on an invalid date, which is a bug in the calling test
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("invalid fixture date")
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// First day of the fixture financial year (1 April 2024)
    pub fn fy_start() -> NaiveDate {
        *FY_START
    }

    /// Last day of the fixture financial year
    pub fn fy_end() -> NaiveDate {
        date(2025, 3, 31)
    }

    /// A date inside the first quarter
    pub fn q1_day() -> NaiveDate {
        date(2024, 5, 15)
    }
}

/// Fixture for money amounts
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn opening_cash() -> Money {
        Money::new(dec!(1000))
    }

    pub fn cash_sale() -> Money {
        Money::new(dec!(500))
    }

    pub fn rent() -> Money {
        Money::new(dec!(120))
    }
}

/// Two-ledger chart: Cash under Assets with a 1000 debit opening, Sales
/// under Income
pub struct CashSalesChart {
    pub chart: ChartOfAccounts,
    pub cash: LedgerId,
    pub sales: LedgerId,
}

/// The standard chart with handles on its posting ledgers
pub struct StandardFixture {
    pub chart: ChartOfAccounts,
    pub cash: LedgerId,
    pub bank: LedgerId,
    pub inventory: LedgerId,
    pub sales: LedgerId,
    pub capital: LedgerId,
    pub cogs: LedgerId,
    pub rent: LedgerId,
}

/// Fixture for charts of accounts
pub struct ChartFixtures;

impl ChartFixtures {
    /// The smallest useful chart
    pub fn cash_and_sales() -> CashSalesChart {
        let mut chart = ChartOfAccounts::new();
        let assets = Group::root("Assets", Nature::Asset);
        let income = Group::root("Income", Nature::Income);
        let opening = OpeningBalance::new(dec!(1000), DrCr::Dr, DateFixtures::fy_start())
            .expect("non-negative opening");
        let cash = Ledger::new("Cash", &assets, LedgerType::Cash).with_opening(opening);
        let sales = Ledger::new("Sales", &income, LedgerType::General);
        let (cash_id, sales_id) = (cash.id, sales.id);

        chart.add_group(assets).expect("root group");
        chart.add_group(income).expect("root group");
        chart.add_ledger(cash).expect("cash ledger");
        chart.add_ledger(sales).expect("sales ledger");

        CashSalesChart {
            chart,
            cash: cash_id,
            sales: sales_id,
        }
    }

    /// The standard trading chart
    pub fn standard() -> StandardFixture {
        let chart = StandardChart::create().expect("standard chart");
        let id = |name: &str| {
            chart
                .find_by_name(name)
                .unwrap_or_else(|| panic!("standard chart has no {}", name))
                .id
        };

        StandardFixture {
            cash: id("Cash"),
            bank: id("Bank"),
            inventory: id("Inventory"),
            sales: id("Sales"),
            capital: id("Capital"),
            cogs: id("Cost of Goods Sold"),
            rent: id("Rent"),
            chart,
        }
    }

    /// One standard chart per test binary
    ///
    /// Property tests need ledger ids while building strategies, before any
    /// case runs; this gives both sides the same ids.
    pub fn shared_standard() -> &'static StandardFixture {
        &SHARED_STANDARD
    }

    /// Posting ledgers of the shared standard chart
    pub fn shared_posting_ids() -> Vec<LedgerId> {
        let f = Self::shared_standard();
        vec![f.cash, f.bank, f.inventory, f.sales, f.capital, f.cogs, f.rent]
    }

    /// A party ledger under the receivables or payables group
    pub fn party_ledger(chart: &mut ChartOfAccounts, name: &str, kind: PartyKind) -> LedgerId {
        let (role, ledger_type) = match kind {
            PartyKind::Customer => (CanonicalRole::TradeReceivables, LedgerType::Receivable),
            PartyKind::Supplier => (CanonicalRole::TradePayables, LedgerType::Payable),
        };
        let group = chart.canonical_group(role).expect("role assigned").clone();
        let ledger = Ledger::new(name, &group, ledger_type);
        let id = ledger.id;
        chart.add_ledger(ledger).expect("party ledger");
        id
    }
}

/// Fixture for parties
pub struct PartyFixtures;

impl PartyFixtures {
    /// A customer with a generated company name
    pub fn customer() -> Party {
        Party::new(CompanyName().fake::<String>(), PartyKind::Customer)
    }

    /// A supplier with a generated company name
    pub fn supplier() -> Party {
        Party::new(CompanyName().fake::<String>(), PartyKind::Supplier)
    }
}
