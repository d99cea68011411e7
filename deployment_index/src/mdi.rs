//! The Military Deployment Index.
//!
//! For a given year, every country with both operations and a population
//! record forms the reference universe. The total deployment and the
//! deployment per inhabitant of these countries are standardized separately
//! (z-scores), combined, and the combined score is rescaled linearly to 0–100.
//!
//! Both quantities are heavily skewed and live on very different scales:
//! standardizing them first keeps either from dominating the index. The final
//! rescaling only serves display and preserves the order of the countries.
//!
//! The index depends on the whole universe of the year, never on the countries
//! currently selected.

use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::config::*;
use crate::primitives::{rescale, z_score};
use crate::store::RecordStore;

/// Combined scores closer than this (in standard deviations) are considered
/// equal. Sums of z-scores that cancel out do not land exactly on the same
/// floating point value.
const COMBINED_WIDTH_TOLERANCE: f64 = 1e-9;

/// Countries of the reference universe for a year, with their total
/// deployment and population, ordered by country code.
fn reference_universe(store: &RecordStore, year: Year) -> Vec<(CountryCode, u64, u64)> {
    let mut totals: BTreeMap<&CountryCode, u64> = BTreeMap::new();
    for r in store.operations().filter(|r| r.year == year) {
        *totals.entry(&r.country).or_insert(0) += r.deployed;
    }
    let mut res: Vec<(CountryCode, u64, u64)> = Vec::new();
    for (country, total) in totals.into_iter() {
        match store.population_of(country, year) {
            Some(0) => {
                warn!(
                    "reference_universe: year {}: {} has a population of 0, left out of the index",
                    year, country
                );
            }
            Some(population) => res.push((country.clone(), total, population)),
            None => {
                debug!(
                    "reference_universe: year {}: no population for {}, left out of the index",
                    year, country
                );
            }
        }
    }
    res
}

fn combine(z_total: f64, z_per_capita: f64, combination: ZScoreCombination) -> f64 {
    match combination {
        ZScoreCombination::Sum => z_total + z_per_capita,
        ZScoreCombination::Weighted { total, per_capita } => {
            (total * z_total + per_capita * z_per_capita) / (total + per_capita)
        }
    }
}

/// A quantity with a weight of zero does not take part in the index: its
/// z-scores are all 0 and its spread is not checked.
fn weighted_z_score(
    values: &[f64],
    weight: f64,
    reason: NotComputableReason,
) -> Result<Vec<f64>, NotComputableReason> {
    if weight == 0.0 {
        return Ok(vec![0.0; values.len()]);
    }
    z_score(values).map_err(|_| reason)
}

/// The intermediate values of the index for every country of the year.
pub fn compute_mdi_components(
    store: &RecordStore,
    year: Year,
    rules: &MetricsRules,
) -> Result<Vec<MdiComponent>, NotComputableReason> {
    let universe = reference_universe(store, year);
    if universe.len() < 2 {
        return Err(NotComputableReason::TooFewCountries {
            found: universe.len(),
        });
    }
    let totals: Vec<f64> = universe.iter().map(|(_, t, _)| *t as f64).collect();
    let per_capita: Vec<f64> = universe
        .iter()
        .map(|(_, t, p)| *t as f64 / *p as f64)
        .collect();

    let (w_total, w_per_capita) = match rules.combination {
        ZScoreCombination::Sum => (1.0, 1.0),
        ZScoreCombination::Weighted { total, per_capita } => (total, per_capita),
    };
    let z_total = weighted_z_score(&totals, w_total, NotComputableReason::ZeroVarianceTotals)?;
    let z_per_capita = weighted_z_score(
        &per_capita,
        w_per_capita,
        NotComputableReason::ZeroVariancePerCapita,
    )?;

    let res = universe
        .into_iter()
        .enumerate()
        .map(|(idx, (country, total, population))| MdiComponent {
            country,
            total_deployed: total,
            population,
            per_capita: per_capita[idx],
            z_total: z_total[idx],
            z_per_capita: z_per_capita[idx],
            combined: combine(z_total[idx], z_per_capita[idx], rules.combination),
        })
        .collect();
    Ok(res)
}

/// The index of every country of the reference universe for one year.
///
/// A year with fewer than two countries, or without any spread in one of the
/// quantities, is reported as not computable instead of failing.
pub fn compute_mdi_for_year(store: &RecordStore, year: Year, rules: &MetricsRules) -> MdiYearOutcome {
    let components = match compute_mdi_components(store, year, rules) {
        Ok(c) => c,
        Err(reason) => {
            warn!("compute_mdi_for_year: year {}: not computable: {}", year, reason);
            return MdiYearOutcome::NotComputable { year, reason };
        }
    };
    let combined: Vec<f64> = components.iter().map(|c| c.combined).collect();
    let min = combined.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = combined.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let not_computable = MdiYearOutcome::NotComputable {
        year,
        reason: NotComputableReason::ZeroWidthCombined,
    };
    if max - min < COMBINED_WIDTH_TOLERANCE {
        warn!(
            "compute_mdi_for_year: year {}: combined scores are all equal ({:?})",
            year, combined
        );
        return not_computable;
    }
    let scaled = match rescale(&combined, rules.mdi_min, rules.mdi_max) {
        Ok(s) => s,
        Err(_) => return not_computable,
    };

    let scores: Vec<MdiScore> = components
        .iter()
        .zip(scaled.iter())
        .map(|(c, s)| {
            debug!(
                "compute_mdi_for_year: {} {}: total {} per capita {:e} z ({:.4}, {:.4}) -> {:.2}",
                year, c.country, c.total_deployed, c.per_capita, c.z_total, c.z_per_capita, s
            );
            MdiScore {
                country: c.country.clone(),
                year,
                mdi: s.round().max(rules.mdi_min).min(rules.mdi_max) as u8,
            }
        })
        .collect();
    MdiYearOutcome::Computed { year, scores }
}

/// The index for every year of the deployment dataset.
pub fn compute_mdi_table(store: &RecordStore, rules: &MetricsRules) -> Vec<MdiYearOutcome> {
    let res: Vec<MdiYearOutcome> = store
        .years()
        .iter()
        .map(|year| compute_mdi_for_year(store, *year, rules))
        .collect();
    info!(
        "compute_mdi_table: {} years, {} not computable",
        res.len(),
        res.iter()
            .filter(|o| matches!(o, MdiYearOutcome::NotComputable { .. }))
            .count()
    );
    res
}

/// The scores of the selected countries, by year then in selection order.
pub fn mdi_for_selection(table: &[MdiYearOutcome], selection: &CountrySelection) -> Vec<MdiScore> {
    let mut res: Vec<MdiScore> = Vec::new();
    for outcome in table.iter() {
        for country in selection.iter() {
            if let Some(s) = outcome.scores().iter().find(|s| s.country == *country) {
                res.push(s.clone());
            }
        }
    }
    res
}
