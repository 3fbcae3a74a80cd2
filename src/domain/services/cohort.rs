//! Cohort retention bucketing.

use std::collections::BTreeMap;

use crate::domain::entities::{CohortCell, CohortRetention};

/// Average month length (30.44 days) in seconds.
pub const SECONDS_PER_MONTH: i64 = 2_629_746;

/// Domain service assembling cohort retention tables.
pub struct CohortService;

impl CohortService {
    /// Whole months in an elapsed duration.
    pub fn months_retained(elapsed_seconds: i64) -> i64 {
        elapsed_seconds.div_euclid(SECONDS_PER_MONTH)
    }

    /// `YYYY-MM` key of a cohort.
    pub fn cohort_key(cell: &CohortCell) -> String {
        cell.cohort_month.format("%Y-%m").to_string()
    }

    /// Percentage of `initial` retained. Zero for empty cohorts.
    pub fn rate(retained: i64, initial: i64) -> f64 {
        if initial > 0 {
            retained as f64 / initial as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Fold aggregated cells into one retention row per cohort, ordered by
    /// cohort month. Rates are placed at their months-retained index; gaps
    /// stay at zero.
    pub fn assemble(cells: impl IntoIterator<Item = CohortCell>) -> Vec<CohortRetention> {
        let mut cohorts: BTreeMap<String, CohortRetention> = BTreeMap::new();

        for cell in cells {
            let key = Self::cohort_key(&cell);
            let cohort = cohorts.entry(key.clone()).or_insert_with(|| CohortRetention {
                cohort_month: key,
                initial_size: cell.initial_size,
                retention_rates: Vec::new(),
            });

            let Some(months) = cell.months_retained else {
                continue;
            };
            if cell.initial_size <= 0 || months < 0 {
                continue;
            }

            let index = months as usize;
            if cohort.retention_rates.len() <= index {
                cohort.retention_rates.resize(index + 1, 0.0);
            }
            cohort.retention_rates[index] = Self::rate(cell.retained_count, cell.initial_size);
        }

        cohorts.into_values().collect()
    }
}
