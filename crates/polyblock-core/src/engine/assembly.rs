use super::progress::{Progress, ProgressReporter};
use crate::core::models::block::{PolymerBlock, Segment};
use crate::core::models::port::{Port, PortLabel};
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::BondOrder;
use crate::core::models::unit::Attachable;
use crate::core::utils::geometry::RigidTransform;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error, PartialEq)]
pub enum AssemblyError {
    #[error(
        "Unit '{name}' at position {position} is malformed: expected 2 attachment points, found {found}"
    )]
    MalformedMonomer {
        name: String,
        position: usize,
        found: usize,
    },
    #[error("The '{label}' port of unit '{name}' is anchored on an atom the unit does not contain")]
    MissingAnchor { name: String, label: PortLabel },
}

/// Joins `units` head to tail into a single rigid chain.
///
/// The first unit is copied as-is and fixes the chain's frame. Every later unit is copied,
/// rotated and translated so its `up` port lands on the trailing unit's `down` port with
/// the two axes antiparallel, and a single bond is added between the two anchor atoms.
/// Units themselves are never modified.
///
/// # Arguments
///
/// * `name` - Name of the resulting block.
/// * `units` - The ordered sequence of units to place.
/// * `reporter` - Receives one task step per placed unit.
///
/// # Errors
///
/// Every unit is checked before any atom is placed. A unit without both ports yields
/// [`AssemblyError::MalformedMonomer`]; a port whose anchor is not one of the unit's
/// atoms yields [`AssemblyError::MissingAnchor`].
#[instrument(skip_all, name = "chain_assembly", fields(block = name, units = units.len()))]
pub fn assemble<U: Attachable>(
    name: &str,
    units: &[U],
    reporter: &ProgressReporter,
) -> Result<PolymerBlock, AssemblyError> {
    let ports = validate_units(units)?;
    if units.is_empty() {
        info!("Empty sequence; block '{}' has no atoms and no ports.", name);
        return Ok(PolymerBlock::empty(name));
    }

    reporter.report(Progress::TaskStart {
        total_steps: units.len() as u64,
    });

    let mut system = MolecularSystem::new();
    let mut segments: Vec<Segment> = Vec::with_capacity(units.len());

    for (unit, (up, down)) in units.iter().zip(ports) {
        let transform = match segments.last() {
            None => RigidTransform::identity(),
            Some(trailing) => up.alignment_onto(&trailing.down),
        };

        let id_map = system.merge_transformed(unit.system(), &transform);
        let place = |port: Port, label: PortLabel| {
            id_map
                .get(&port.anchor)
                .map(|&anchor| port.transformed(&transform).with_anchor(anchor))
                .ok_or_else(|| AssemblyError::MissingAnchor {
                    name: unit.name().to_string(),
                    label,
                })
        };
        let placed_up = place(up, PortLabel::Up)?;
        let placed_down = place(down, PortLabel::Down)?;

        if let Some(trailing) = segments.last() {
            system.add_bond(trailing.down.anchor, placed_up.anchor, BondOrder::Single);
            debug!(
                unit = unit.name(),
                position = segments.len(),
                "Joined unit to the trailing end."
            );
        }

        let atoms = unit
            .system()
            .ordered_atom_ids()
            .iter()
            .filter_map(|id| id_map.get(id).copied())
            .collect();
        segments.push(Segment {
            unit_name: unit.name().to_string(),
            atoms,
            up: placed_up,
            down: placed_down,
        });
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    info!(
        "Assembled block '{}' from {} units ({} atoms).",
        name,
        segments.len(),
        system.atom_count()
    );
    Ok(PolymerBlock::from_parts(name, system, segments))
}

fn validate_units<U: Attachable>(units: &[U]) -> Result<Vec<(Port, Port)>, AssemblyError> {
    units
        .iter()
        .enumerate()
        .map(|(position, unit)| {
            let (Some(up), Some(down)) = (unit.port(PortLabel::Up), unit.port(PortLabel::Down))
            else {
                return Err(AssemblyError::MalformedMonomer {
                    name: unit.name().to_string(),
                    position,
                    found: unit.port_count(),
                });
            };
            for (port, label) in [(up, PortLabel::Up), (down, PortLabel::Down)] {
                if unit.system().atom(port.anchor).is_none() {
                    return Err(AssemblyError::MissingAnchor {
                        name: unit.name().to_string(),
                        label,
                    });
                }
            }
            Ok((*up, *down))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::ids::AtomId;
    use crate::core::models::monomer::MonomerTemplate;
    use crate::core::models::port::{PortOrientation, PortParams};
    use crate::core::models::unit::MonomerRef;
    use crate::core::utils::geometry::{calculate_rmsd, max_internal_distance_deviation};
    use nalgebra::Point3;
    use std::sync::{Arc, Mutex};

    const TOLERANCE: f64 = 1e-9;

    fn template(name: &str, orientation: PortOrientation) -> MonomerTemplate {
        let mut system = MolecularSystem::new();
        let res = system.add_residue("UNL");
        let coords = [[0.0, 0.0, 0.0], [0.7, 0.9, 0.1], [1.5, 0.2, -0.3]];
        let ids: Vec<_> = coords
            .iter()
            .map(|c| {
                system
                    .add_atom_to_residue(res, Atom::new("C", res, Point3::from(*c)))
                    .unwrap()
            })
            .collect();
        system.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();
        system.add_bond(ids[1], ids[2], BondOrder::Single).unwrap();
        let params = PortParams {
            bond_length: 0.05,
            orientation,
        };
        MonomerTemplate::new(name, system, (2, 0), &params).unwrap()
    }

    fn positions(system: &MolecularSystem, atoms: &[AtomId]) -> Vec<Point3<f64>> {
        atoms
            .iter()
            .map(|&id| system.atom(id).unwrap().position)
            .collect()
    }

    /// Lengths of every bond joining atoms of two different residues.
    fn junction_bond_lengths(system: &MolecularSystem) -> Vec<f64> {
        system
            .bonds()
            .iter()
            .filter_map(|bond| {
                let a1 = system.atom(bond.atom1_id)?;
                let a2 = system.atom(bond.atom2_id)?;
                (a1.residue_id != a2.residue_id).then(|| (a1.position - a2.position).norm())
            })
            .collect()
    }

    #[test]
    fn chain_of_three_keeps_all_atoms_and_joins_every_junction() {
        let a = MonomerRef::from(template("A", PortOrientation::default()));
        let b = MonomerRef::from(template("B", PortOrientation::default()));
        let block = assemble("AAB", &[a.clone(), a, b], &ProgressReporter::new()).unwrap();

        assert_eq!(block.atom_count(), 9);
        assert_eq!(block.sequence(), vec!["A", "A", "B"]);
        assert_eq!(block.system().residue_count(), 3);
        assert!(block.junctions_hold(TOLERANCE));
        // Two intra-monomer bonds per unit plus one per junction.
        assert_eq!(block.system().bonds().len(), 3 * 2 + 2);
    }

    #[test]
    fn first_unit_is_not_moved() {
        let a = template("A", PortOrientation::default());
        let block = assemble("A2", &[&a, &a], &ProgressReporter::new()).unwrap();
        let first = &block.segments()[0];
        let placed = positions(block.system(), &first.atoms);
        let rmsd = calculate_rmsd(&placed, &a.system().positions()).unwrap();
        assert!(rmsd < TOLERANCE);
        assert_eq!(block.up().unwrap().position, a.up().position);
    }

    #[test]
    fn placed_units_are_rigid_copies() {
        for orientation in [PortOrientation::default(), PortOrientation::BondGeometry] {
            let a = template("A", orientation);
            let units = vec![&a; 5];
            let block = assemble("A5", &units, &ProgressReporter::new()).unwrap();
            assert!(block.junctions_hold(TOLERANCE), "{} junctions", orientation);
            for segment in block.segments() {
                let placed = positions(block.system(), &segment.atoms);
                let deviation =
                    max_internal_distance_deviation(&placed, &a.system().positions()).unwrap();
                assert!(deviation < TOLERANCE);
            }
        }
    }

    #[test]
    fn junction_bonds_connect_the_anchor_atoms() {
        let a = template("A", PortOrientation::default());
        let block = assemble("AA", &[&a, &a], &ProgressReporter::new()).unwrap();
        let segments = block.segments();
        let down_anchor = segments[0].down.anchor;
        let up_anchor = segments[1].up.anchor;
        assert!(
            block
                .system()
                .get_bonded_neighbors(down_anchor)
                .unwrap()
                .contains(&up_anchor)
        );
        let gap = (block.system().atom(down_anchor).unwrap().position
            - block.system().atom(up_anchor).unwrap().position)
            .norm();
        assert!((gap - 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn blocks_nest_as_units() {
        let a = Arc::new(template("A", PortOrientation::default()));
        let b = Arc::new(template("B", PortOrientation::default()));
        let inner = assemble(
            "AB",
            &[MonomerRef::from(a.clone()), MonomerRef::from(b)],
            &ProgressReporter::new(),
        )
        .unwrap();
        let inner_atoms = inner.atom_count();
        let inner = MonomerRef::from(inner);
        let leaf = MonomerRef::from(a.clone());

        let outer = assemble(
            "outer",
            &[inner.clone(), inner.clone(), inner, leaf],
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(outer.atom_count(), 3 * inner_atoms + a.atom_count());
        assert_eq!(outer.sequence(), vec!["AB", "AB", "AB", "A"]);
        assert!(outer.junctions_hold(TOLERANCE));
        // Each placed leaf monomer keeps its own residue.
        assert_eq!(outer.system().residue_count(), 7);

        // Joins inside the placed inner blocks must survive their transforms too.
        let lengths = junction_bond_lengths(outer.system());
        assert_eq!(lengths.len(), 6);
        for length in lengths {
            assert!((length - 2.0 * 0.05).abs() < TOLERANCE, "junction bond of {}", length);
        }
    }

    #[test]
    fn empty_sequence_gives_empty_block_that_cannot_be_placed() {
        let empty = assemble::<MonomerRef>("none", &[], &ProgressReporter::new()).unwrap();
        assert!(empty.is_empty());
        assert!(empty.up().is_none());

        let a = MonomerRef::from(template("A", PortOrientation::default()));
        let result = assemble("bad", &[a, MonomerRef::from(empty)], &ProgressReporter::new());
        assert_eq!(
            result.unwrap_err(),
            AssemblyError::MalformedMonomer {
                name: "none".to_string(),
                position: 1,
                found: 0,
            }
        );
    }

    #[test]
    fn progress_reports_one_step_per_unit() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));
        let a = template("A", PortOrientation::default());
        assemble("A3", &[&a, &a, &a], &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(events.first(), Some(&Progress::TaskStart { total_steps: 3 }));
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == Progress::TaskIncrement)
                .count(),
            3
        );
        assert_eq!(events.last(), Some(&Progress::TaskFinish));
    }
}
