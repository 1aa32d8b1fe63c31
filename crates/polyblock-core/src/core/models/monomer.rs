use super::ids::AtomId;
use super::port::{Axis, Port, PortLabel, PortOrientation, PortParams};
use super::system::MolecularSystem;
use nalgebra::{Unit, Vector3};
use thiserror::Error;
use tracing::{debug, instrument};

const DIRECTION_EPSILON: f64 = 1e-8;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error(
        "Anchor index {index} for the '{label}' port of monomer '{name}' is out of range ({atom_count} atoms)"
    )]
    InvalidAnchor {
        name: String,
        label: PortLabel,
        index: usize,
        atom_count: usize,
    },
    #[error("Invalid bond length {0}: must be finite and positive")]
    InvalidBondLength(f64),
    #[error("Monomer '{0}' contains no atoms")]
    EmptyStructure(String),
}

/// An immutable, reusable monomer: a structure with an `up` and a `down` port.
///
/// Templates are never moved. Assembly copies their atoms into the growing chain and
/// transforms the copies, so one template can be placed any number of times.
#[derive(Debug, Clone)]
pub struct MonomerTemplate {
    name: String,
    system: MolecularSystem,
    anchors: (usize, usize),
    up: Port,
    down: Port,
}

impl MonomerTemplate {
    /// Creates a template from a loaded structure and two file-order anchor indices.
    ///
    /// Every residue of `system` is renamed to `name` so placed copies can be traced back
    /// to their monomer in exported files.
    ///
    /// # Arguments
    ///
    /// * `name` - The monomer name used in sequences and residue records.
    /// * `system` - The atoms (and intra-monomer bonds) of the monomer.
    /// * `anchors` - `(up, down)` anchor atom indices, in file order.
    /// * `params` - Bond length and orientation rule for the ports.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidAnchor`] when an index does not address an atom,
    /// [`TemplateError::InvalidBondLength`] for a non-positive length and
    /// [`TemplateError::EmptyStructure`] for a structure without atoms.
    #[instrument(level = "debug", skip(system, params), fields(atoms = system.atom_count()))]
    pub fn new(
        name: &str,
        mut system: MolecularSystem,
        anchors: (usize, usize),
        params: &PortParams,
    ) -> Result<Self, TemplateError> {
        if !params.bond_length.is_finite() || params.bond_length <= 0.0 {
            return Err(TemplateError::InvalidBondLength(params.bond_length));
        }
        if system.is_empty() {
            return Err(TemplateError::EmptyStructure(name.to_string()));
        }

        let ordered = system.ordered_atom_ids();
        let resolve = |label: PortLabel, index: usize| {
            ordered
                .get(index)
                .copied()
                .ok_or_else(|| TemplateError::InvalidAnchor {
                    name: name.to_string(),
                    label,
                    index,
                    atom_count: ordered.len(),
                })
        };
        let up_anchor = resolve(PortLabel::Up, anchors.0)?;
        let down_anchor = resolve(PortLabel::Down, anchors.1)?;

        let up_direction = outward_direction(&system, up_anchor, PortLabel::Up, params.orientation);
        let down_direction = if up_anchor == down_anchor
            && params.orientation == PortOrientation::BondGeometry
        {
            -up_direction
        } else {
            outward_direction(&system, down_anchor, PortLabel::Down, params.orientation)
        };

        let up = make_port(&system, up_anchor, up_direction, params.bond_length);
        let down = make_port(&system, down_anchor, down_direction, params.bond_length);

        system.rename_residues(name);
        debug!(
            "Created monomer template '{}' with anchors {:?} ({} orientation).",
            name, anchors, params.orientation
        );

        Ok(Self {
            name: name.to_string(),
            system,
            anchors,
            up,
            down,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system(&self) -> &MolecularSystem {
        &self.system
    }

    pub fn anchors(&self) -> (usize, usize) {
        self.anchors
    }

    pub fn atom_count(&self) -> usize {
        self.system.atom_count()
    }

    pub fn up(&self) -> &Port {
        &self.up
    }

    pub fn down(&self) -> &Port {
        &self.down
    }
}

fn make_port(
    system: &MolecularSystem,
    anchor: AtomId,
    direction: Unit<Vector3<f64>>,
    bond_length: f64,
) -> Port {
    // Anchors come from `ordered_atom_ids`, so the lookup cannot miss.
    let anchor_position = system
        .atom(anchor)
        .map(|atom| atom.position)
        .unwrap_or_default();
    Port::from_anchor(anchor, &anchor_position, direction, bond_length)
}

fn fixed_direction(axis: Axis, label: PortLabel) -> Unit<Vector3<f64>> {
    match label {
        PortLabel::Up => axis.unit(),
        PortLabel::Down => -axis.unit(),
    }
}

/// Chooses the outward axis for a port anchored on `anchor`.
fn outward_direction(
    system: &MolecularSystem,
    anchor: AtomId,
    label: PortLabel,
    orientation: PortOrientation,
) -> Unit<Vector3<f64>> {
    let axis = match orientation {
        PortOrientation::FixedAxis(axis) => return fixed_direction(axis, label),
        PortOrientation::BondGeometry => Axis::X,
    };
    let Some(anchor_position) = system.atom(anchor).map(|a| a.position) else {
        return fixed_direction(axis, label);
    };

    let away_from_neighbors: Vector3<f64> = system
        .get_bonded_neighbors(anchor)
        .unwrap_or_default()
        .iter()
        .filter_map(|&n| system.atom(n))
        .filter_map(|n| (anchor_position - n.position).try_normalize(DIRECTION_EPSILON))
        .sum();
    if let Some(direction) = Unit::try_new(away_from_neighbors, DIRECTION_EPSILON) {
        return direction;
    }

    let away_from_center = system
        .centroid()
        .map(|c| anchor_position - c)
        .unwrap_or_else(Vector3::zeros);
    if let Some(direction) = Unit::try_new(away_from_center, DIRECTION_EPSILON) {
        return direction;
    }

    fixed_direction(axis, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::BondOrder;
    use nalgebra::Point3;

    const BOND_LENGTH: f64 = 0.05;

    fn params(orientation: PortOrientation) -> PortParams {
        PortParams {
            bond_length: BOND_LENGTH,
            orientation,
        }
    }

    fn bent_triatomic() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let res = system.add_residue("UNL");
        let ids: Vec<_> = [[0.0, 0.0, 0.0], [1.0, 0.5, 0.0], [2.0, 0.0, 0.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| {
                system
                    .add_atom_to_residue(res, Atom::new(&format!("C{}", i + 1), res, Point3::from(*p)))
                    .unwrap()
            })
            .collect();
        system.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();
        system.add_bond(ids[1], ids[2], BondOrder::Single).unwrap();
        system
    }

    #[test]
    fn fixed_axis_ports_are_offset_along_the_axis() {
        let template = MonomerTemplate::new(
            "alpha",
            bent_triatomic(),
            (2, 0),
            &params(PortOrientation::FixedAxis(Axis::X)),
        )
        .unwrap();

        assert!((template.up().position - Point3::new(2.05, 0.0, 0.0)).norm() < 1e-12);
        assert!((template.down().position - Point3::new(-0.05, 0.0, 0.0)).norm() < 1e-12);
        assert_eq!(template.up().direction, Vector3::x_axis());
        assert_eq!(template.down().direction, -Vector3::x_axis());
        assert_eq!(template.anchors(), (2, 0));
    }

    #[test]
    fn ports_are_exactly_bond_length_from_their_anchors() {
        for orientation in [
            PortOrientation::FixedAxis(Axis::Y),
            PortOrientation::BondGeometry,
        ] {
            let template =
                MonomerTemplate::new("alpha", bent_triatomic(), (2, 0), &params(orientation)).unwrap();
            for port in [template.up(), template.down()] {
                let anchor = template.system().atom(port.anchor).unwrap().position;
                assert!(((port.position - anchor).norm() - BOND_LENGTH).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn bond_geometry_points_away_from_bonded_neighbors() {
        let template = MonomerTemplate::new(
            "alpha",
            bent_triatomic(),
            (2, 0),
            &params(PortOrientation::BondGeometry),
        )
        .unwrap();
        // Atom 2 is bonded only to atom 1 at (1, 0.5, 0).
        let expected = Unit::new_normalize(Vector3::new(1.0, -0.5, 0.0));
        assert!((template.up().direction.into_inner() - expected.into_inner()).norm() < 1e-12);
        let expected_down = Unit::new_normalize(Vector3::new(-1.0, -0.5, 0.0));
        assert!(
            (template.down().direction.into_inner() - expected_down.into_inner()).norm() < 1e-12
        );
    }

    #[test]
    fn bond_geometry_falls_back_to_centroid_then_axis() {
        let mut system = MolecularSystem::new();
        let res = system.add_residue("UNL");
        system
            .add_atom_to_residue(res, Atom::new("O", res, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        system
            .add_atom_to_residue(res, Atom::new("C", res, Point3::new(0.0, 0.0, 2.0)))
            .unwrap();
        let template =
            MonomerTemplate::new("pair", system, (1, 0), &params(PortOrientation::BondGeometry))
                .unwrap();
        assert!((template.up().direction.into_inner() - Vector3::z()).norm() < 1e-12);
        assert!((template.down().direction.into_inner() + Vector3::z()).norm() < 1e-12);

        let mut single = MolecularSystem::new();
        let res = single.add_residue("UNL");
        single
            .add_atom_to_residue(res, Atom::new("C", res, Point3::new(1.0, 1.0, 1.0)))
            .unwrap();
        let bead =
            MonomerTemplate::new("bead", single, (0, 0), &params(PortOrientation::BondGeometry))
                .unwrap();
        assert_eq!(bead.up().direction, Vector3::x_axis());
        assert_eq!(bead.down().direction, -Vector3::x_axis());
    }

    #[test]
    fn out_of_range_anchor_is_rejected() {
        let result =
            MonomerTemplate::new("alpha", bent_triatomic(), (3, 0), &params(PortOrientation::default()));
        assert_eq!(
            result.unwrap_err(),
            TemplateError::InvalidAnchor {
                name: "alpha".to_string(),
                label: PortLabel::Up,
                index: 3,
                atom_count: 3,
            }
        );

        let result =
            MonomerTemplate::new("alpha", bent_triatomic(), (0, 9), &params(PortOrientation::default()));
        assert!(matches!(
            result,
            Err(TemplateError::InvalidAnchor { label: PortLabel::Down, index: 9, .. })
        ));
    }

    #[test]
    fn invalid_bond_length_and_empty_structure_are_rejected() {
        let bad = PortParams {
            bond_length: 0.0,
            orientation: PortOrientation::default(),
        };
        assert_eq!(
            MonomerTemplate::new("alpha", bent_triatomic(), (0, 1), &bad).unwrap_err(),
            TemplateError::InvalidBondLength(0.0)
        );
        assert_eq!(
            MonomerTemplate::new(
                "ghost",
                MolecularSystem::new(),
                (0, 0),
                &params(PortOrientation::default())
            )
            .unwrap_err(),
            TemplateError::EmptyStructure("ghost".to_string())
        );
    }

    #[test]
    fn residues_are_renamed_after_the_monomer() {
        let template =
            MonomerTemplate::new("peg", bent_triatomic(), (1, 0), &params(PortOrientation::default()))
                .unwrap();
        assert!(template.system().residues_iter().all(|(_, r)| r.name == "peg"));
        assert_eq!(template.name(), "peg");
        assert_eq!(template.atom_count(), 3);
    }
}
