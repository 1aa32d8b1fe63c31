use super::ids::AtomId;
use super::port::Port;
use super::system::MolecularSystem;
use crate::core::utils::geometry::RigidTransform;
use nalgebra::Vector3;

/// One placed unit inside an assembled block.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Name of the monomer or block this segment was copied from.
    pub unit_name: String,
    /// Atoms of the copy, in the unit's own order.
    pub atoms: Vec<AtomId>,
    /// The copy's incoming port, after placement.
    pub up: Port,
    /// The copy's outgoing port, after placement.
    pub down: Port,
}

impl Segment {
    fn transform(&mut self, transform: &RigidTransform) {
        self.up = self.up.transformed(transform);
        self.down = self.down.transformed(transform);
    }
}

/// A linear chain produced by assembly.
///
/// A block owns every atom of every placed copy. It exposes the leading `up` port of its
/// first segment and the trailing `down` port of its last one, so it can itself be placed
/// as a unit inside a larger block. An empty block has no ports.
#[derive(Debug, Clone)]
pub struct PolymerBlock {
    name: String,
    system: MolecularSystem,
    segments: Vec<Segment>,
    up: Option<Port>,
    down: Option<Port>,
}

impl PolymerBlock {
    pub(crate) fn from_parts(name: &str, system: MolecularSystem, segments: Vec<Segment>) -> Self {
        let up = segments.first().map(|s| s.up);
        let down = segments.last().map(|s| s.down);
        Self {
            name: name.to_string(),
            system,
            segments,
            up,
            down,
        }
    }

    pub fn empty(name: &str) -> Self {
        Self::from_parts(name, MolecularSystem::new(), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system(&self) -> &MolecularSystem {
        &self.system
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn up(&self) -> Option<&Port> {
        self.up.as_ref()
    }

    pub fn down(&self) -> Option<&Port> {
        self.down.as_ref()
    }

    pub fn atom_count(&self) -> usize {
        self.system.atom_count()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Names of the placed units, in chain order.
    pub fn sequence(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.unit_name.as_str()).collect()
    }

    /// Per-junction `(gap, 1 + cos)` between each segment's `down` and the next one's `up`.
    pub fn junction_errors(&self) -> Vec<(f64, f64)> {
        self.segments
            .windows(2)
            .map(|pair| pair[1].up.junction_error(&pair[0].down))
            .collect()
    }

    /// Returns `true` when every adjacent pair of segments meets within `tolerance`.
    pub fn junctions_hold(&self, tolerance: f64) -> bool {
        self.segments
            .windows(2)
            .all(|pair| pair[1].up.is_joined_to(&pair[0].down, tolerance))
    }

    /// Translates the whole block so that its first atom sits at the origin.
    ///
    /// Ports and segments move with the atoms. An empty block is returned unchanged.
    pub fn centered_on_first_atom(mut self) -> Self {
        let Some(first) = self.system.atoms_iter().next().map(|(_, atom)| atom.position) else {
            return self;
        };
        let offset: Vector3<f64> = -first.coords;
        let transform = RigidTransform::from_translation(offset);

        self.system.apply_transform(&transform);
        for segment in &mut self.segments {
            segment.transform(&transform);
        }
        self.up = self.up.map(|p| p.transformed(&transform));
        self.down = self.down.map(|p| p.transformed(&transform));
        self
    }
}
