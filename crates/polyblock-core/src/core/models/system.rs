use super::atom::Atom;
use super::ids::{AtomId, ResidueId};
use super::residue::Residue;
use super::topology::{Bond, BondOrder};
use crate::core::utils::geometry::{self, RigidTransform};
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

/// A molecular structure: atoms grouped into ordered residues, plus bonds.
///
/// Both monomer templates and assembled polymer blocks are stored as a
/// `MolecularSystem`. Atoms are always owned by exactly one residue, and iteration
/// follows residue order and then atom order within each residue, which is the order
/// atoms were read from file or placed during assembly.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms using a slot map for stable IDs.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for stable IDs.
    residues: SlotMap<ResidueId, Residue>,
    /// Residues in sequence order.
    residue_order: Vec<ResidueId>,
    /// List of all bonds in the system.
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by atom ID.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Returns the number of atoms in the system.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Returns an iterator over all atoms in residue order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(AtomId, &Atom)` pairs.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residue_order
            .iter()
            .filter_map(|&res_id| self.residues.get(res_id))
            .flat_map(|residue| residue.atoms().iter())
            .filter_map(|&atom_id| self.atoms.get(atom_id).map(|atom| (atom_id, atom)))
    }

    /// Returns the atom IDs in residue order.
    ///
    /// The position of an ID in this list is the atom's file-order index, which is how
    /// monomer anchors are addressed.
    pub fn ordered_atom_ids(&self) -> Vec<AtomId> {
        self.atoms_iter().map(|(id, _)| id).collect()
    }

    /// Returns the atom positions in residue order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms_iter().map(|(_, atom)| atom.position).collect()
    }

    /// Retrieves an immutable reference to a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Returns an iterator over all residues in sequence order.
    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residue_order
            .iter()
            .filter_map(|&id| self.residues.get(id).map(|residue| (id, residue)))
    }

    pub fn residue_count(&self) -> usize {
        self.residue_order.len()
    }

    /// Returns a slice of all bonds in the system.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Appends a new residue, numbered after the last one.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the residue, usually the monomer name.
    ///
    /// # Return
    ///
    /// The ID of the new residue.
    pub fn add_residue(&mut self, name: &str) -> ResidueId {
        let number = self.residue_order.len() as isize + 1;
        self.add_numbered_residue(number, name)
    }

    pub(crate) fn add_numbered_residue(&mut self, number: isize, name: &str) -> ResidueId {
        let id = self.residues.insert(Residue::new(number, name));
        self.residue_order.push(id);
        id
    }

    /// Adds an atom to a specific residue.
    ///
    /// The atom's `residue_id` is overwritten with `residue_id` so the two can never disagree.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (if the residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        atom.residue_id = residue_id;
        let atom_id = self.atoms.insert(atom);
        self.bond_adjacency.insert(atom_id, Vec::new());
        self.residues.get_mut(residue_id)?.add_atom(atom_id);

        Some(atom_id)
    }

    /// Adds a bond between two atoms.
    ///
    /// Idempotent: adding an existing bond succeeds without creating a duplicate.
    /// Self-bonds are rejected.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if successful, otherwise `None` (if either atom doesn't exist).
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Option<()> {
        if atom1_id == atom2_id
            || !self.atoms.contains_key(atom1_id)
            || !self.atoms.contains_key(atom2_id)
        {
            return None;
        }

        if self
            .bond_adjacency
            .get(atom1_id)
            .is_some_and(|neighbors| neighbors.contains(&atom2_id))
        {
            return Some(());
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id, order));
        self.bond_adjacency[atom1_id].push(atom2_id);
        self.bond_adjacency[atom2_id].push(atom1_id);
        Some(())
    }

    /// Retrieves the bonded neighbors of an atom.
    pub fn get_bonded_neighbors(&self, atom_id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(atom_id).map(|v| v.as_slice())
    }

    /// Returns the geometric center of all atoms, or `None` for an empty system.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        geometry::centroid(&self.positions())
    }

    /// Applies a rigid transform to every atom in place.
    pub fn apply_transform(&mut self, transform: &RigidTransform) {
        for (_, atom) in self.atoms.iter_mut() {
            atom.position = transform.apply_point(&atom.position);
        }
    }

    /// Gives every residue the same name.
    pub fn rename_residues(&mut self, name: &str) {
        for (_, residue) in self.residues.iter_mut() {
            residue.name = name.to_string();
        }
    }

    /// Copies every residue, atom and bond of `other` into `self`, transforming positions.
    ///
    /// `other` is left untouched; the copies get fresh IDs and residue numbers that
    /// continue this system's numbering.
    ///
    /// # Return
    ///
    /// A map from each atom ID in `other` to the ID of its copy in `self`.
    pub fn merge_transformed(
        &mut self,
        other: &MolecularSystem,
        transform: &RigidTransform,
    ) -> HashMap<AtomId, AtomId> {
        let mut id_map = HashMap::with_capacity(other.atom_count());

        for (_, residue) in other.residues_iter() {
            let new_res_id = self.add_residue(&residue.name);
            for &old_atom_id in residue.atoms() {
                let Some(atom) = other.atom(old_atom_id) else {
                    continue;
                };
                let mut copy = atom.clone();
                copy.position = transform.apply_point(&atom.position);
                if let Some(new_atom_id) = self.add_atom_to_residue(new_res_id, copy) {
                    id_map.insert(old_atom_id, new_atom_id);
                }
            }
        }

        for bond in other.bonds() {
            if let (Some(&a1), Some(&a2)) = (id_map.get(&bond.atom1_id), id_map.get(&bond.atom2_id)) {
                self.add_bond(a1, a2, bond.order);
            }
        }

        id_map
    }
}
