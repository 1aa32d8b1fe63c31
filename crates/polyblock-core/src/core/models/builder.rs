use super::atom::Atom;
use super::ids::{AtomId, ResidueId};
use super::system::MolecularSystem;
use super::topology::BondOrder;
use nalgebra::Point3;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("Cannot add atom {serial} before any residue has been started")]
    NoCurrentResidue { serial: usize },
    #[error("Duplicate atom serial: {0}")]
    DuplicateSerial(usize),
    #[error("Bond references unknown atom serial {0}")]
    UnknownSerial(usize),
}

/// Incrementally constructs a `MolecularSystem` from serial-numbered records, as found
/// in structure files.
#[derive(Default)]
pub struct MolecularSystemBuilder {
    system: MolecularSystem,

    // --- Builder-specific state for efficient construction ---
    atom_serial_map: HashMap<usize, AtomId>,
    current_residue: Option<(isize, String, ResidueId)>,
}

impl MolecularSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the residue `(number, name)` current.
    ///
    /// Consecutive calls with the same key keep appending to one residue. Any other key
    /// appends a new residue, even if that key was seen earlier, so atoms stay in record
    /// order.
    pub fn start_residue(&mut self, number: isize, name: &str) -> &mut Self {
        let continues_current = matches!(
            &self.current_residue,
            Some((n, current_name, _)) if *n == number && current_name == name
        );
        if !continues_current {
            let id = self.system.add_numbered_residue(number, name);
            self.current_residue = Some((number, name.to_string(), id));
        }
        self
    }

    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        element: Option<&str>,
        position: Point3<f64>,
        charge: f64,
        ff_type: &str,
    ) -> Result<&mut Self, BuilderError> {
        let residue_id = self
            .current_residue
            .as_ref()
            .map(|(_, _, id)| *id)
            .ok_or(BuilderError::NoCurrentResidue { serial })?;
        if self.atom_serial_map.contains_key(&serial) {
            return Err(BuilderError::DuplicateSerial(serial));
        }

        let mut atom = Atom::new(name, residue_id, position);
        if let Some(symbol) = element.filter(|s| !s.trim().is_empty()) {
            atom = atom.with_element(symbol);
        }
        atom.partial_charge = charge;
        atom.force_field_type = ff_type.to_string();

        if let Some(atom_id) = self.system.add_atom_to_residue(residue_id, atom) {
            self.atom_serial_map.insert(serial, atom_id);
        }
        Ok(self)
    }

    pub fn add_bond(
        &mut self,
        serial1: usize,
        serial2: usize,
        order: BondOrder,
    ) -> Result<&mut Self, BuilderError> {
        let id1 = *self
            .atom_serial_map
            .get(&serial1)
            .ok_or(BuilderError::UnknownSerial(serial1))?;
        let id2 = *self
            .atom_serial_map
            .get(&serial2)
            .ok_or(BuilderError::UnknownSerial(serial2))?;
        self.system.add_bond(id1, id2, order);
        Ok(self)
    }

    pub fn atom_count(&self) -> usize {
        self.system.atom_count()
    }

    pub fn build(self) -> MolecularSystem {
        self.system
    }
}
