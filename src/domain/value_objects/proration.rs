use anyhow::{Context, Result};
use chrono::{DateTime, Months, Utc};
use serde::Serialize;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Breakdown of a prorated upgrade charge.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UpgradeQuote {
    pub remaining_days: i64,
    /// Value of the unused time on the current plan, minor units.
    pub remaining_value_minor: i64,
    /// Net amount to charge, minor units. Never negative: a downgrade-shaped
    /// quote costs zero rather than producing a refund.
    pub upgrade_cost_minor: i64,
}

/// Whole days left until `end`, rounding any partial day up and clamping at
/// zero once `end` has passed. A subscriber keeps the full last day.
pub fn remaining_days(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (end - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Quote for switching from the current plan to a pricier one, crediting the
/// unused time at the current plan's daily rate (month = 30 days).
pub fn upgrade_quote(
    current_price_minor: i64,
    new_price_minor: i64,
    end_date: DateTime<Utc>,
    upgrade_months: f64,
    now: DateTime<Utc>,
) -> UpgradeQuote {
    let remaining_days = remaining_days(end_date, now);
    let remaining_value_minor =
        (current_price_minor as f64 / 30.0 * remaining_days as f64).round() as i64;
    let gross_minor = (new_price_minor as f64 * upgrade_months).round() as i64;
    let upgrade_cost_minor = (gross_minor - remaining_value_minor).max(0);

    UpgradeQuote {
        remaining_days,
        remaining_value_minor,
        upgrade_cost_minor,
    }
}

/// Duration discount, highest qualifying threshold wins.
pub fn discount_for_duration(duration_days: i64) -> f64 {
    if duration_days >= 365 {
        0.15
    } else if duration_days >= 180 {
        0.10
    } else if duration_days >= 90 {
        0.05
    } else {
        0.0
    }
}

/// Price of extending a plan by `duration_days` at its monthly rate, with the
/// duration discount applied (month = 30 days, rounded once at the end).
pub fn prorated_extension_price(monthly_price_minor: i64, duration_days: i64) -> i64 {
    let discount = discount_for_duration(duration_days);
    (monthly_price_minor as f64 * duration_days as f64 / 30.0 * (1.0 - discount)).round() as i64
}

/// Calendar month addition, clamped at end-of-month (Jan 31 + 1mo = Feb 28).
pub fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .context("month addition overflowed the calendar range")
}

/// Non-negative component breakdown of the time left until `end`, for the
/// read-side subscription state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RemainingTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
}

impl RemainingTime {
    pub fn until(end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total_seconds = (end - now).num_seconds();
        if total_seconds <= 0 {
            return Self {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
                expired: true,
            };
        }

        Self {
            days: total_seconds / 86_400,
            hours: total_seconds % 86_400 / 3_600,
            minutes: total_seconds % 3_600 / 60,
            seconds: total_seconds % 60,
            expired: false,
        }
    }
}
