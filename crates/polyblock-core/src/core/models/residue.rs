use super::ids::AtomId;

/// A residue groups the atoms of one placed monomer instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,             // Sequential residue number within the structure
    pub name: String,              // Name of the monomer this residue was cloned from
    pub(crate) atoms: Vec<AtomId>, // Atoms in file / placement order
}

impl Residue {
    pub(crate) fn new(number: isize, name: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let residue = Residue::new(10, "PEG");
        assert_eq!(residue.number, 10);
        assert_eq!(residue.name, "PEG");
        assert!(residue.atoms().is_empty());
    }

    #[test]
    fn add_atom_preserves_order() {
        let mut residue = Residue::new(1, "ALP");
        let first = dummy_atom_id(1);
        let second = dummy_atom_id(2);
        residue.add_atom(first);
        residue.add_atom(second);
        assert_eq!(residue.atoms(), &[first, second]);
    }
}
