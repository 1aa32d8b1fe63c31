//! Element masses, molecular weights and density-driven molecule counts.

use crate::core::models::system::MolecularSystem;
use phf::phf_map;
use thiserror::Error;

/// Avogadro's number as used for molecule-count estimates.
pub const AVOGADRO: f64 = 6.02e23;

/// Converts g/mL * nm^3 to grams (1 nm^3 = 1e-21 mL).
const ML_PER_CUBIC_NM: f64 = 1e-21;

static ATOMIC_MASSES: phf::Map<&'static str, f64> = phf_map! {
    "H" => 1.008,
    "He" => 4.0026,
    "Li" => 6.94,
    "B" => 10.81,
    "C" => 12.011,
    "N" => 14.007,
    "O" => 15.999,
    "F" => 18.998,
    "Na" => 22.990,
    "Mg" => 24.305,
    "Al" => 26.982,
    "Si" => 28.085,
    "P" => 30.974,
    "S" => 32.06,
    "Cl" => 35.45,
    "K" => 39.098,
    "Ca" => 40.078,
    "Fe" => 55.845,
    "Zn" => 65.38,
    "Br" => 79.904,
    "I" => 126.90,
};

#[derive(Debug, Error, PartialEq)]
pub enum MassError {
    #[error("No atomic mass is known for element '{0}'")]
    UnknownElement(String),
    #[error("Invalid {quantity}: {value} (must be finite and positive)")]
    InvalidQuantity { quantity: &'static str, value: f64 },
}

pub fn atomic_mass(element: &str) -> Option<f64> {
    ATOMIC_MASSES.get(element).copied()
}

/// Sums the atomic masses of every atom in `system`, in g/mol.
pub fn molecular_weight(system: &MolecularSystem) -> Result<f64, MassError> {
    system.atoms_iter().try_fold(0.0, |total, (_, atom)| {
        atomic_mass(&atom.element)
            .map(|mass| total + mass)
            .ok_or_else(|| MassError::UnknownElement(atom.element.clone()))
    })
}

/// Number of molecules of the given molecular weight needed to reach `density` in a box.
///
/// # Arguments
///
/// * `density` - Target density in g/mL.
/// * `molecular_weight` - Molecular weight in g/mol.
/// * `box_dimensions` - Box edge lengths in nm.
///
/// # Return
///
/// The molecule count, truncated toward zero.
pub fn density_to_count(
    density: f64,
    molecular_weight: f64,
    box_dimensions: [f64; 3],
) -> Result<usize, MassError> {
    if !density.is_finite() || density < 0.0 {
        return Err(MassError::InvalidQuantity {
            quantity: "density",
            value: density,
        });
    }
    if !molecular_weight.is_finite() || molecular_weight <= 0.0 {
        return Err(MassError::InvalidQuantity {
            quantity: "molecular weight",
            value: molecular_weight,
        });
    }
    if let Some(&edge) = box_dimensions.iter().find(|e| !e.is_finite() || **e <= 0.0) {
        return Err(MassError::InvalidQuantity {
            quantity: "box dimension",
            value: edge,
        });
    }
    let box_volume: f64 = box_dimensions.iter().product();
    let count = density / molecular_weight * ML_PER_CUBIC_NM * AVOGADRO * box_volume;
    Ok(count as usize)
}
