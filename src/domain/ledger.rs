use serde::Serialize;
use std::cmp::Ordering;

use crate::models::money::{Money, MoneyError};

/// One resolved purchase: what a unit cost and how many were bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub unit_cost: Money,
    pub quantity: i64,
    pub complimentary: bool,
}

impl LineItem {
    pub fn new(unit_cost: Money, quantity: i64) -> Self {
        Self { unit_cost, quantity, complimentary: false }
    }

    pub fn complimentary(unit_cost: Money, quantity: i64) -> Self {
        Self { unit_cost, quantity, complimentary: true }
    }

    pub fn total(&self) -> Result<Money, MoneyError> {
        if self.complimentary {
            Ok(Money::ZERO)
        } else {
            self.unit_cost.scale(self.quantity)
        }
    }
}

/// A person's purchases and payments, already loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    pub person_id: i64,
    pub name: String,
    pub purchases: Vec<LineItem>,
    pub payments: Vec<Money>,
}

impl Ledger {
    pub fn new(person_id: i64, name: impl Into<String>) -> Self {
        Self {
            person_id,
            name: name.into(),
            purchases: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn total_purchases(&self) -> Result<Money, MoneyError> {
        Money::try_total(self.purchases.iter().map(LineItem::total))
    }

    pub fn paid(&self) -> Result<Money, MoneyError> {
        Money::total(self.payments.iter().copied())
    }

    /// Net amount owed: positive means they owe us, negative means overpaid.
    pub fn balance(&self) -> Result<Money, MoneyError> {
        balance(&self.purchases, &self.payments)
    }
}

pub fn balance(purchases: &[LineItem], payments: &[Money]) -> Result<Money, MoneyError> {
    let owed = Money::try_total(purchases.iter().map(LineItem::total))?;
    let paid = Money::total(payments.iter().copied())?;
    owed.subtract(paid)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub person_id: i64,
    pub name: String,
    pub balance: Money,
}

/// Everyone's balance, largest debtor first, with the grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub rows: Vec<BalanceRow>,
    pub total: Money,
}

impl BalanceReport {
    pub fn build<'a, I>(ledgers: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = &'a Ledger>,
    {
        let mut rows = ledgers
            .into_iter()
            .map(|ledger| {
                Ok(BalanceRow {
                    person_id: ledger.person_id,
                    name: ledger.name.clone(),
                    balance: ledger.balance()?,
                })
            })
            .collect::<Result<Vec<BalanceRow>, MoneyError>>()?;

        rows.sort_by(compare_rows);
        let total = Money::total(rows.iter().map(|r| r.balance))?;

        Ok(Self { rows, total })
    }
}

/// Descending balance; equal balances fall back to ascending person id.
fn compare_rows(a: &BalanceRow, b: &BalanceRow) -> Ordering {
    b.balance
        .compare(a.balance)
        .then_with(|| a.person_id.cmp(&b.person_id))
}
