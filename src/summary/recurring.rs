// src/summary/recurring.rs
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::RecurringBill;
use crate::summary::bill_status::{BillRules, BillStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub total: Decimal,
}

impl Bucket {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount.abs();
    }
}

/// Per-status counts and totals over a user's bills; recomputed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSummary {
    pub due: Bucket,
    pub paid: Bucket,
    pub unpaid: Bucket,
    pub due_soon: Bucket,
}

impl RecurringSummary {
    pub fn bucket(&self, status: BillStatus) -> &Bucket {
        match status {
            BillStatus::Paid => &self.paid,
            BillStatus::DueSoon => &self.due_soon,
            BillStatus::Due => &self.due,
            BillStatus::Unpaid => &self.unpaid,
        }
    }

    fn bucket_mut(&mut self, status: BillStatus) -> &mut Bucket {
        match status {
            BillStatus::Paid => &mut self.paid,
            BillStatus::DueSoon => &mut self.due_soon,
            BillStatus::Due => &mut self.due,
            BillStatus::Unpaid => &mut self.unpaid,
        }
    }

    pub fn total_count(&self) -> usize {
        BillStatus::ALL.iter().map(|s| self.bucket(*s).count).sum()
    }
}

pub fn summarize(bills: &[RecurringBill], now: NaiveDateTime, rules: &BillRules) -> RecurringSummary {
    bills.iter().fold(RecurringSummary::default(), |mut summary, bill| {
        let status = rules.classify(bill.last_paid, bill.due_day(), now);
        summary.bucket_mut(status).add(bill.amount);
        summary
    })
}

/// A bill together with its status at the time of the request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    #[serde(flatten)]
    pub bill: RecurringBill,
    pub status: BillStatus,
}

pub fn with_status(bills: Vec<RecurringBill>, now: NaiveDateTime, rules: &BillRules) -> Vec<BillView> {
    bills
        .into_iter()
        .map(|bill| {
            let status = rules.classify(bill.last_paid, bill.due_day(), now);
            BillView { bill, status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} 00:00:00"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn bill(id: i64, amount: &str, last_paid: Option<&str>, due: &str) -> RecurringBill {
        RecurringBill {
            id,
            user_id: 1,
            name: format!("bill {id}"),
            category: "Bills".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            last_paid: last_paid.map(at),
            due_date: due.to_string(),
            theme: "#277C78".to_string(),
            recurring: true,
        }
    }

    fn sample() -> Vec<RecurringBill> {
        vec![
            bill(1, "-100.00", Some("2024-06-01"), "1"),  // paid
            bill(2, "-20.50", Some("2024-05-15"), "12"),  // due soon
            bill(3, "-9.99", None, "5"),                  // due
            bill(4, "-45", None, "28"),                   // unpaid
            bill(5, "-15", None, "soon"),                 // unparseable: unpaid
            bill(6, "-30", Some("2024-06-09"), "30"),     // paid
        ]
    }

    #[test]
    fn empty_input_is_all_zero() {
        let summary = summarize(&[], at("2024-06-10"), &BillRules::default());
        assert_eq!(summary, RecurringSummary::default());
        assert_eq!(summary.total_count(), 0);
        for status in BillStatus::ALL {
            assert_eq!(summary.bucket(status).total, Decimal::ZERO);
        }
    }

    #[test]
    fn buckets_counts_and_totals() {
        let summary = summarize(&sample(), at("2024-06-10"), &BillRules::default());

        assert_eq!(summary.paid.count, 2);
        assert_eq!(summary.paid.total, Decimal::from_str("130.00").unwrap());
        assert_eq!(summary.due_soon.count, 1);
        assert_eq!(summary.due_soon.total, Decimal::from_str("20.50").unwrap());
        assert_eq!(summary.due.count, 1);
        assert_eq!(summary.due.total, Decimal::from_str("9.99").unwrap());
        assert_eq!(summary.unpaid.count, 2);
        assert_eq!(summary.unpaid.total, Decimal::from(60));
    }

    #[test]
    fn counts_partition_the_input() {
        let bills = sample();
        let summary = summarize(&bills, at("2024-06-10"), &BillRules::default());
        assert_eq!(summary.total_count(), bills.len());
    }

    #[test]
    fn order_does_not_matter() {
        let now = at("2024-06-10");
        let rules = BillRules::default();
        let forward = summarize(&sample(), now, &rules);

        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(summarize(&reversed, now, &rules), forward);

        let mut rotated = sample();
        rotated.rotate_left(2);
        assert_eq!(summarize(&rotated, now, &rules), forward);
    }

    #[test]
    fn positive_amounts_count_by_magnitude() {
        let bills = vec![bill(1, "25", None, "28"), bill(2, "-25", None, "28")];
        let summary = summarize(&bills, at("2024-06-10"), &BillRules::default());
        assert_eq!(summary.unpaid.total, Decimal::from(50));
    }

    #[test]
    fn serializes_with_camel_case_buckets() {
        let summary = summarize(&sample(), at("2024-06-10"), &BillRules::default());
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["dueSoon"]["count"], 1);
        assert_eq!(json["paid"]["total"], "130.00");
    }

    #[test]
    fn bill_view_flattens_bill_fields() {
        let views = with_status(vec![bill(3, "-9.99", None, "5")], at("2024-06-10"), &BillRules::default());
        assert_eq!(views[0].status, BillStatus::Due);

        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["status"], "due");
        assert_eq!(json["dueDate"], "5");
        assert_eq!(json["lastPaid"], serde_json::Value::Null);
    }
}
