// src/summary/bill_status.rs
//! Classifies a recurring bill as paid / due soon / due / unpaid for the
//! calendar month containing `now`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BillStatus {
    Paid,
    DueSoon,
    Due,
    Unpaid,
}

impl BillStatus {
    pub const ALL: [BillStatus; 4] = [
        BillStatus::Paid,
        BillStatus::DueSoon,
        BillStatus::Due,
        BillStatus::Unpaid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BillStatus::Paid => "paid",
            BillStatus::DueSoon => "dueSoon",
            BillStatus::Due => "due",
            BillStatus::Unpaid => "unpaid",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `dueDate` string of a bill could not be read as a day of month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDueDate {
    pub value: String,
}

impl fmt::Display for InvalidDueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid due date `{}`: expected a day of month 1-31", self.value)
    }
}

impl std::error::Error for InvalidDueDate {}

/// Day of month a bill falls due, always within 1..=31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueDay(u32);

impl DueDay {
    pub fn new(day: u32) -> Option<Self> {
        (1..=31).contains(&day).then_some(Self(day))
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidDueDate> {
        let trimmed = raw.trim();
        let invalid = || InvalidDueDate { value: raw.to_string() };

        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(invalid)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for DueDay {
    type Err = InvalidDueDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// What to do with a due day past the end of a short month (e.g. "31" in April).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueDayOverflow {
    /// Count on past the month end: "31" in April becomes 1 May.
    #[default]
    RollOver,
    /// Use the last day of the month: "31" in April becomes 30 April.
    Clamp,
}

impl FromStr for DueDayOverflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollover" | "roll-over" | "roll_over" => Ok(DueDayOverflow::RollOver),
            "clamp" => Ok(DueDayOverflow::Clamp),
            other => Err(format!("unknown due day overflow policy `{other}`")),
        }
    }
}

/// Parameters of the classification that vary by deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillRules {
    pub overflow: DueDayOverflow,
    pub due_soon_days: i64,
}

impl Default for BillRules {
    fn default() -> Self {
        Self {
            overflow: DueDayOverflow::RollOver,
            due_soon_days: 3,
        }
    }
}

impl BillRules {
    pub fn classify(
        &self,
        last_paid: Option<NaiveDateTime>,
        due_day: Option<DueDay>,
        now: NaiveDateTime,
    ) -> BillStatus {
        let month_start = start_of_month(now.date());

        if let Some(paid_at) = last_paid {
            if paid_at >= month_start.and_time(NaiveTime::default()) {
                return BillStatus::Paid;
            }
        }

        let Some(day) = due_day else {
            return BillStatus::Unpaid;
        };

        let due_at = self.due_date_in_month(month_start, day).and_time(NaiveTime::default());
        let diff = due_at - now;

        // a window too wide for `Duration` holds every future due date
        let in_window = Duration::try_days(self.due_soon_days).map_or(true, |window| diff <= window);
        if diff > Duration::zero() && in_window {
            BillStatus::DueSoon
        } else if diff <= Duration::zero() {
            BillStatus::Due
        } else {
            BillStatus::Unpaid
        }
    }

    /// Due date of `day` in the month starting at `month_start`.
    pub fn due_date_in_month(&self, month_start: NaiveDate, day: DueDay) -> NaiveDate {
        let offset = match self.overflow {
            DueDayOverflow::RollOver => day.get(),
            DueDayOverflow::Clamp => day.get().min(days_in_month(month_start)),
        };
        month_start + Duration::days(i64::from(offset) - 1)
    }
}

/// Classify with the default rules (roll-over, three day window).
pub fn classify(
    last_paid: Option<NaiveDateTime>,
    due_day: Option<DueDay>,
    now: NaiveDateTime,
) -> BillStatus {
    BillRules::default().classify(last_paid, due_day, now)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let start = start_of_month(date);
    // 31 days after the 1st always lands in the following month
    let next_start = start_of_month(start + Duration::days(31));
    (next_start - start).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} 00:00:00"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn at_time(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(d: u32) -> Option<DueDay> {
        DueDay::new(d)
    }

    #[test]
    fn paid_this_month_wins_over_due_date() {
        let status = classify(Some(at("2024-06-01")), day(12), at("2024-06-10"));
        assert_eq!(status, BillStatus::Paid);
    }

    #[test]
    fn paid_exactly_at_month_start_is_paid() {
        let status = classify(Some(at("2024-06-01")), day(1), at_time("2024-06-20 15:30:00"));
        assert_eq!(status, BillStatus::Paid);
    }

    #[test]
    fn paid_last_month_resets() {
        let status = classify(Some(at_time("2024-05-31 23:59:59")), day(25), at("2024-06-10"));
        assert_eq!(status, BillStatus::Unpaid);
    }

    #[test]
    fn due_in_two_days_is_due_soon() {
        let status = classify(Some(at("2024-05-15")), day(12), at("2024-06-10"));
        assert_eq!(status, BillStatus::DueSoon);
    }

    #[test]
    fn due_today_at_midnight_is_due() {
        assert_eq!(classify(None, day(10), at("2024-06-10")), BillStatus::Due);
    }

    #[test]
    fn due_today_later_in_the_day_is_due() {
        let status = classify(None, day(10), at_time("2024-06-10 09:00:00"));
        assert_eq!(status, BillStatus::Due);
    }

    #[test]
    fn window_is_inclusive_of_three_full_days() {
        assert_eq!(classify(None, day(13), at("2024-06-10")), BillStatus::DueSoon);
        // 3 days and 14 hours out
        let status = classify(None, day(14), at_time("2024-06-10 10:00:00"));
        assert_eq!(status, BillStatus::Unpaid);
    }

    #[test]
    fn past_due_day_is_due() {
        assert_eq!(classify(None, day(2), at("2024-06-10")), BillStatus::Due);
    }

    #[test]
    fn far_due_day_is_unpaid() {
        assert_eq!(classify(None, day(28), at("2024-06-10")), BillStatus::Unpaid);
    }

    #[test]
    fn missing_due_day_is_unpaid_unless_paid() {
        assert_eq!(classify(None, None, at("2024-06-10")), BillStatus::Unpaid);
        assert_eq!(
            classify(Some(at("2024-06-02")), None, at("2024-06-10")),
            BillStatus::Paid
        );
    }

    #[test]
    fn parse_due_day() {
        assert_eq!(DueDay::parse("12").map(DueDay::get), Ok(12));
        assert_eq!(DueDay::parse(" 7 ").map(DueDay::get), Ok(7));
        assert_eq!(DueDay::parse("07").map(DueDay::get), Ok(7));
        assert!(DueDay::parse("0").is_err());
        assert!(DueDay::parse("32").is_err());
        assert!(DueDay::parse("").is_err());
        assert!(DueDay::parse("+5").is_err());
        assert!(DueDay::parse("fifth").is_err());
        assert!(DueDay::parse("-1").is_err());
    }

    #[test]
    fn overflow_rolls_into_next_month() {
        let rules = BillRules::default();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let due = rules.due_date_in_month(feb, DueDay::new(31).unwrap());
        assert_eq!(due, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn overflow_clamps_to_month_end() {
        let rules = BillRules {
            overflow: DueDayOverflow::Clamp,
            ..BillRules::default()
        };
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let due = rules.due_date_in_month(feb, DueDay::new(31).unwrap());
        assert_eq!(due, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        // clamped: the 29th is the last day, so on the 28th it is due soon
        let status = rules.classify(None, day(31), at("2024-02-28"));
        assert_eq!(status, BillStatus::DueSoon);
    }

    #[test]
    fn rolled_over_due_date_is_not_yet_due() {
        // "31" in February 2024 lands on 2 March: four days out on the 27th
        let status = classify(None, day(31), at("2024-02-27"));
        assert_eq!(status, BillStatus::Unpaid);
    }

    #[test]
    fn oversized_window_does_not_panic() {
        let rules = BillRules {
            due_soon_days: 1_000_000_000_000_000,
            ..BillRules::default()
        };
        assert_eq!(rules.classify(None, day(28), at("2024-06-10")), BillStatus::DueSoon);
        assert_eq!(rules.classify(None, day(2), at("2024-06-10")), BillStatus::Due);
    }

    #[test]
    fn month_lengths() {
        let d = |y, m| NaiveDate::from_ymd_opt(y, m, 15).unwrap();
        assert_eq!(days_in_month(d(2024, 2)), 29);
        assert_eq!(days_in_month(d(2023, 2)), 28);
        assert_eq!(days_in_month(d(2024, 4)), 30);
        assert_eq!(days_in_month(d(2024, 12)), 31);
    }

    #[test]
    fn overflow_policy_from_str() {
        assert_eq!("clamp".parse::<DueDayOverflow>(), Ok(DueDayOverflow::Clamp));
        assert_eq!("RollOver".parse::<DueDayOverflow>(), Ok(DueDayOverflow::RollOver));
        assert!("truncate".parse::<DueDayOverflow>().is_err());
    }
}
