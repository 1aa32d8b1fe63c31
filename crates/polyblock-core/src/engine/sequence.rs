//! Sequence generation: which units appear in a chain, and in what order.
//!
//! Both generators are generic over the unit type, so they work equally for names,
//! shared templates or previously assembled blocks.

use rand::Rng;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq)]
pub enum SequenceError {
    #[error("'{field}' must be {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("'{first}' and '{second}' must have the same length ({first_len} != {second_len})")]
    LengthMismatch {
        first: &'static str,
        first_len: usize,
        second: &'static str,
        second_len: usize,
    },
    #[error("Repeat count must be at least 1")]
    InvalidRepeatCount,
    #[error("Ratio at position {index} must be finite and positive, found {value}")]
    InvalidRatio { index: usize, value: f64 },
    #[error("Cannot draw {chain_length} units from an empty unit list")]
    EmptyUnits { chain_length: usize },
}

/// Expands a repeated block pattern into a flat sequence.
///
/// The pattern is `units[j]` repeated `amounts[j]` times, in order, and the whole pattern
/// is emitted `repeat_count` times. For units `[A, B, A, C]` with amounts `[2, 1, 1, 3]`
/// and a repeat count of 1 the result is `A A B A C C C`.
///
/// # Errors
///
/// Returns [`SequenceError::LengthMismatch`] when the two lists differ in length and
/// [`SequenceError::InvalidRepeatCount`] for a repeat count of zero.
pub fn build_repeated_sequence<T: Clone>(
    units: &[T],
    amounts: &[usize],
    repeat_count: usize,
) -> Result<Vec<T>, SequenceError> {
    if units.len() != amounts.len() {
        return Err(SequenceError::LengthMismatch {
            first: "units",
            first_len: units.len(),
            second: "amounts",
            second_len: amounts.len(),
        });
    }
    if repeat_count == 0 {
        return Err(SequenceError::InvalidRepeatCount);
    }

    let pattern: Vec<T> = units
        .iter()
        .zip(amounts)
        .flat_map(|(unit, &amount)| std::iter::repeat_n(unit.clone(), amount))
        .collect();

    let mut sequence = Vec::with_capacity(pattern.len() * repeat_count);
    for _ in 0..repeat_count {
        sequence.extend(pattern.iter().cloned());
    }
    Ok(sequence)
}

/// Draws `chain_length` units independently, each with probability proportional to its ratio.
///
/// Ratios need not sum to one: `[4, 1]`, `[0.4, 0.1]` and `[0.8, 0.2]` are equivalent.
/// The generator is passed in so callers control reproducibility.
///
/// # Errors
///
/// Returns [`SequenceError::LengthMismatch`] for lists of different lengths,
/// [`SequenceError::InvalidRatio`] for a non-finite or non-positive ratio and
/// [`SequenceError::EmptyUnits`] when units are needed but none are given.
pub fn build_random_sequence<T: Clone, R: Rng + ?Sized>(
    units: &[T],
    ratios: &[f64],
    chain_length: usize,
    rng: &mut R,
) -> Result<Vec<T>, SequenceError> {
    if units.len() != ratios.len() {
        return Err(SequenceError::LengthMismatch {
            first: "units",
            first_len: units.len(),
            second: "ratios",
            second_len: ratios.len(),
        });
    }
    if let Some((index, &value)) = ratios
        .iter()
        .enumerate()
        .find(|(_, r)| !r.is_finite() || **r <= 0.0)
    {
        return Err(SequenceError::InvalidRatio { index, value });
    }
    if chain_length == 0 {
        return Ok(Vec::new());
    }
    if units.is_empty() {
        return Err(SequenceError::EmptyUnits { chain_length });
    }

    let boundaries = cumulative_boundaries(ratios);
    Ok((0..chain_length)
        .map(|_| {
            let draw: f64 = rng.r#gen();
            units[select_index(&boundaries, draw)].clone()
        })
        .collect())
}

/// Running sums of the normalized ratios; the last entry is 1 up to rounding.
///
/// Ratios whose sum overflows `f64` are first divided by the largest one.
pub(crate) fn cumulative_boundaries(ratios: &[f64]) -> Vec<f64> {
    let mut scale = 1.0;
    let mut total: f64 = ratios.iter().sum();
    if !total.is_finite() {
        scale = ratios.iter().copied().fold(f64::MIN_POSITIVE, f64::max);
        total = ratios.iter().map(|ratio| ratio / scale).sum();
    }
    ratios
        .iter()
        .scan(0.0, |acc, ratio| {
            *acc += ratio / scale / total;
            Some(*acc)
        })
        .collect()
}

/// Index of the first boundary strictly greater than `draw`.
///
/// A draw at or above the last boundary (possible when rounding leaves it just under 1)
/// maps to the last unit.
pub(crate) fn select_index(boundaries: &[f64], draw: f64) -> usize {
    let index = boundaries.partition_point(|&c| c <= draw);
    if index >= boundaries.len() {
        trace!(
            draw,
            last_boundary = boundaries.last().copied().unwrap_or_default(),
            "Draw fell past the last cumulative boundary; clamping to the last unit."
        );
        return boundaries.len().saturating_sub(1);
    }
    index
}
