//! Tax rates and the rate lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tax rate that applies from a date until the next rate starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub effective_from: DateTime<Utc>,
    pub tax_rate_percent: u32,
}

impl TaxRate {
    pub fn new(effective_from: DateTime<Utc>, tax_rate_percent: u32) -> Self {
        Self {
            effective_from,
            tax_rate_percent,
        }
    }
}

/// Returns the rate in effect on `date`: the latest one that started on or
/// before it.
pub fn rate_in_effect(rates: &[TaxRate], date: DateTime<Utc>) -> Option<u32> {
    rates
        .iter()
        .filter(|rate| rate.effective_from <= date)
        .max_by_key(|rate| rate.effective_from)
        .map(|rate| rate.tax_rate_percent)
}
