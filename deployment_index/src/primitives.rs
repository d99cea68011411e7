//! Small numeric helpers shared by all the metrics.

use crate::config::MetricsError;

/// The label of the catch-all entry created by [`top_n_with_other`].
pub const OTHER_LABEL: &str = "Other";

/// Rounds to one decimal place.
///
/// The exact binary value is rounded, ties to even: 0.35 is stored slightly
/// below the half and gives 0.3, 0.25 is an exact tie and gives 0.2.
pub fn round1(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{:.1}", x).parse::<f64>().unwrap_or(x)
}

/// `numerator / denominator * scaling`, rounded to one decimal.
///
/// A zero denominator is not an error: the ratio is 0. Countries with no
/// population or no active personnel on record rely on this.
///
/// ```
/// use deployment_index::primitives::safe_ratio;
/// assert_eq!(safe_ratio(1.0, 3.0, 100.0), 33.3);
/// assert_eq!(safe_ratio(50.0, 0.0, 100.0), 0.0);
/// ```
pub fn safe_ratio(numerator: f64, denominator: f64, scaling: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let res = round1(numerator / denominator * scaling);
    if res.is_finite() {
        res
    } else {
        0.0
    }
}

/// Keeps the `n` largest entries and sums the rest into an "Other" entry.
///
/// Entries are sorted by value in decreasing order, ties by label. When there
/// are `n` entries or fewer, nothing is collapsed and no "Other" entry is
/// created.
///
/// An entry already labelled "Other" is the catch-all: it does not compete
/// with the named entries, the collapsed values are added to it and it always
/// comes last. Applying the function twice gives the same result as applying
/// it once, and the sum of the values never changes.
pub fn top_n_with_other(items: &[(String, u64)], n: usize) -> Vec<(String, u64)> {
    let mut named: Vec<(String, u64)> = Vec::new();
    let mut other: Option<u64> = None;
    for (label, value) in items.iter() {
        if label == OTHER_LABEL {
            *other.get_or_insert(0) += *value;
        } else {
            named.push((label.clone(), *value));
        }
    }
    named.sort_by(|(l1, v1), (l2, v2)| v2.cmp(v1).then_with(|| l1.cmp(l2)));

    if named.len() > n {
        let excluded: u64 = named[n..].iter().map(|(_, v)| *v).sum();
        named.truncate(n);
        *other.get_or_insert(0) += excluded;
    }
    if let Some(v) = other {
        named.push((OTHER_LABEL.to_string(), v));
    }
    named
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard scores against the population mean and standard deviation.
///
/// Fails with [`MetricsError::DivisionByZero`] with fewer than two values or
/// when all the values are identical.
pub fn z_score(values: &[f64]) -> Result<Vec<f64>, MetricsError> {
    if values.len() < 2 {
        return Err(MetricsError::DivisionByZero);
    }
    let m = mean(values);
    let sd = std_dev(values, m);
    if sd == 0.0 || !sd.is_finite() {
        return Err(MetricsError::DivisionByZero);
    }
    Ok(values.iter().map(|v| (v - m) / sd).collect())
}

/// Maps `[min(values), max(values)]` linearly onto `[new_min, new_max]`.
///
/// Fails with [`MetricsError::DivisionByZero`] when all values are equal.
pub fn rescale(values: &[f64], new_min: f64, new_max: f64) -> Result<Vec<f64>, MetricsError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = max - min;
    if width == 0.0 || !width.is_finite() {
        return Err(MetricsError::DivisionByZero);
    }
    Ok(values
        .iter()
        .map(|v| new_min + (v - min) / width * (new_max - new_min))
        .collect())
}
