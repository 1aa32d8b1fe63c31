use super::assembly::assemble;
use super::error::EngineError;
use super::progress::ProgressReporter;
use super::sequence::{build_random_sequence, build_repeated_sequence};
use crate::core::models::block::PolymerBlock;
use crate::core::models::unit::Attachable;
use rand::Rng;
use tracing::{debug, instrument};

/// Builds a block from a repeated pattern: `units[j]` × `amounts[j]`, `repeat_count` times.
///
/// Units may be monomer templates or previously built blocks.
///
/// # Errors
///
/// Returns [`EngineError::Sequence`] for malformed pattern inputs and
/// [`EngineError::Assembly`] if a unit cannot be placed.
#[instrument(skip_all, name = "deterministic_block", fields(block = name))]
pub fn build_deterministic_block<U: Attachable + Clone>(
    name: &str,
    units: &[U],
    amounts: &[usize],
    repeat_count: usize,
    reporter: &ProgressReporter,
) -> Result<PolymerBlock, EngineError> {
    let sequence =
        build_repeated_sequence(units, amounts, repeat_count).map_err(|source| {
            EngineError::Sequence {
                block: name.to_string(),
                source,
            }
        })?;
    debug!("Repeated pattern expands to {} units.", sequence.len());
    assemble_sequence(name, &sequence, reporter)
}

/// Builds a block of `chain_length` units drawn independently according to `ratios`.
///
/// # Errors
///
/// Returns [`EngineError::Sequence`] for malformed ratio inputs and
/// [`EngineError::Assembly`] if a unit cannot be placed.
#[instrument(skip_all, name = "random_block", fields(block = name, chain_length = chain_length))]
pub fn build_random_block<U: Attachable + Clone, R: Rng + ?Sized>(
    name: &str,
    units: &[U],
    ratios: &[f64],
    chain_length: usize,
    rng: &mut R,
    reporter: &ProgressReporter,
) -> Result<PolymerBlock, EngineError> {
    let sequence = build_random_sequence(units, ratios, chain_length, rng).map_err(|source| {
        EngineError::Sequence {
            block: name.to_string(),
            source,
        }
    })?;
    assemble_sequence(name, &sequence, reporter)
}

fn assemble_sequence<U: Attachable>(
    name: &str,
    sequence: &[U],
    reporter: &ProgressReporter,
) -> Result<PolymerBlock, EngineError> {
    assemble(name, sequence, reporter).map_err(|source| EngineError::Assembly {
        block: name.to_string(),
        source,
    })
}
