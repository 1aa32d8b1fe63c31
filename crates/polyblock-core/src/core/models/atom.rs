use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents a single atom of a monomer or an assembled polymer.
///
/// Atoms carry only the information needed to place and export them: identity,
/// chemical element, parent residue and Cartesian position. Force-field typing and
/// charges are passed through from the source file untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom as written in the source file (e.g., "C1", "O2").
    pub name: String,
    /// The chemical element symbol (e.g., "C", "O", "Cl").
    pub element: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The 3D coordinates of the atom.
    pub position: Point3<f64>,
    /// The force field atom type carried over from the source file, if any.
    pub force_field_type: String,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
}

impl Atom {
    /// Creates a new `Atom` with an element guessed from its name.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element: element_from_name(name),
            residue_id,
            position,
            force_field_type: String::new(),
            partial_charge: 0.0,
        }
    }

    /// Replaces the guessed element with an explicit symbol.
    pub fn with_element(mut self, element: &str) -> Self {
        self.element = normalize_element(element);
        self
    }
}

/// Guesses an element symbol from an atom name by taking its leading letters.
///
/// Two-letter symbols are only recognised when the second letter is lowercase in the
/// name ("Cl1" is chlorine, "CA" is carbon).
pub fn element_from_name(name: &str) -> String {
    let mut chars = name.trim().chars().skip_while(|c| !c.is_ascii_alphabetic());
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if second.is_ascii_lowercase() => {
            format!("{}{}", first.to_ascii_uppercase(), second)
        }
        (Some(first), _) => first.to_ascii_uppercase().to_string(),
        (None, _) => String::new(),
    }
}

/// Normalizes an element symbol to title case ("CL" -> "Cl").
pub fn normalize_element(symbol: &str) -> String {
    let symbol = symbol.trim();
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.map(|c| c.to_ascii_lowercase()).collect();
            format!("{}{}", first.to_ascii_uppercase(), rest)
        }
        None => String::new(),
    }
}
