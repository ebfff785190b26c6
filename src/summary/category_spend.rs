// src/summary/category_spend.rs
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::{Budget, Transaction};
use crate::summary::bill_status::start_of_month;

/// Sum of expenses per category. Income and refunds are left out rather than
/// netted; a category without expenses maps to zero.
pub fn spend_by_category(txns_by_category: &BTreeMap<String, Vec<Transaction>>) -> BTreeMap<String, Decimal> {
    txns_by_category
        .iter()
        .map(|(category, txns)| {
            let spent = txns
                .iter()
                .filter(|t| t.amount < Decimal::ZERO)
                .map(|t| t.amount.abs())
                .sum();
            (category.clone(), spent)
        })
        .collect()
}

/// A calendar month, written `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    first_day: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn containing(at: NaiveDateTime) -> Self {
        Self {
            first_day: start_of_month(at.date()),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    /// `[first instant of the month, first instant of the next month)`
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let next = start_of_month(self.first_day + chrono::Duration::days(31));
        (
            self.first_day.and_time(NaiveTime::default()),
            next.and_time(NaiveTime::default()),
        )
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || format!("invalid month `{s}`: expected YYYY-MM");
        let (year, month) = s.trim().split_once('-').ok_or_else(bad)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(bad());
        }
        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u32 = month.parse().map_err(|_| bad())?;
        Self::new(year, month).ok_or_else(bad)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub category: String,
    pub maximum: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStats {
    pub budgets: Vec<BudgetProgress>,
    pub total_maximum: Decimal,
    pub total_spent: Decimal,
}

/// Joins budgets with this month's spend. `remaining` never goes below zero.
pub fn budget_progress(budgets: &[Budget], spend: &BTreeMap<String, Decimal>) -> BudgetStats {
    let rows: Vec<BudgetProgress> = budgets
        .iter()
        .map(|b| {
            let spent = spend.get(&b.category).copied().unwrap_or(Decimal::ZERO);
            BudgetProgress {
                category: b.category.clone(),
                maximum: b.maximum,
                spent,
                remaining: (b.maximum - spent).max(Decimal::ZERO),
                theme: b.theme.clone(),
            }
        })
        .collect();

    BudgetStats {
        total_maximum: rows.iter().map(|r| r.maximum).sum(),
        total_spent: rows.iter().map(|r| r.spent).sum(),
        budgets: rows,
    }
}
