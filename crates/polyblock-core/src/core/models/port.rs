use super::ids::AtomId;
use crate::core::utils::geometry::{RigidTransform, rotation_onto};
use nalgebra::{Point3, Unit, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Names the two attachment points every monomer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortLabel {
    /// The incoming end, joined to the previous unit's `Down` port.
    Up,
    /// The outgoing end, left open for the next unit.
    Down,
}

impl fmt::Display for PortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortLabel::Up => f.write_str("up"),
            PortLabel::Down => f.write_str("down"),
        }
    }
}

/// An attachment point: a position offset from an anchor atom along an outward axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    /// The atom this port hangs off; inter-unit bonds are made to it.
    pub anchor: AtomId,
    /// Where a neighbouring unit's matching port must be placed.
    pub position: Point3<f64>,
    /// Outward bond axis, pointing away from the anchor's own unit.
    pub direction: Unit<Vector3<f64>>,
}

impl Port {
    pub fn from_anchor(
        anchor: AtomId,
        anchor_position: &Point3<f64>,
        direction: Unit<Vector3<f64>>,
        bond_length: f64,
    ) -> Self {
        Self {
            anchor,
            position: anchor_position + direction.into_inner() * bond_length,
            direction,
        }
    }

    pub fn transformed(&self, transform: &RigidTransform) -> Self {
        Self {
            anchor: self.anchor,
            position: transform.apply_point(&self.position),
            direction: Unit::new_normalize(transform.apply_vector(&self.direction)),
        }
    }

    pub fn with_anchor(self, anchor: AtomId) -> Self {
        Self { anchor, ..self }
    }

    /// Computes the rigid transform that carries this port onto `target`.
    ///
    /// After the transform this port sits exactly on `target.position` and its axis is
    /// antiparallel to `target.direction`, so the moved unit extends away from the
    /// target's unit instead of folding back into it.
    pub fn alignment_onto(&self, target: &Port) -> RigidTransform {
        let wanted = -target.direction.into_inner();
        let rotation = rotation_onto(&self.direction, &wanted);
        RigidTransform::about_pivot(rotation, &self.position, &target.position)
    }

    /// Distance between the two port positions and `1 + cos` of the angle between axes.
    ///
    /// Both are zero for perfectly joined ports.
    pub fn junction_error(&self, other: &Port) -> (f64, f64) {
        let gap = (self.position - other.position).norm();
        let alignment = 1.0 + self.direction.dot(&*other.direction);
        (gap, alignment)
    }

    pub fn is_joined_to(&self, other: &Port, tolerance: f64) -> bool {
        let (gap, alignment) = self.junction_error(other);
        gap <= tolerance && alignment.abs() <= tolerance
    }
}

/// A Cartesian axis used for fixed port orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// How the outward axis of a port is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOrientation {
    /// `up` points along `+axis` and `down` along `-axis` for every monomer.
    FixedAxis(Axis),
    /// Derived per anchor from the directions to its bonded neighbours.
    BondGeometry,
}

impl Default for PortOrientation {
    fn default() -> Self {
        PortOrientation::FixedAxis(Axis::X)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid port orientation '{0}'. Expected 'x', 'y', 'z' or 'bond-geometry'")]
pub struct ParsePortOrientationError(pub String);

impl FromStr for PortOrientation {
    type Err = ParsePortOrientationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x" => Ok(Self::FixedAxis(Axis::X)),
            "y" => Ok(Self::FixedAxis(Axis::Y)),
            "z" => Ok(Self::FixedAxis(Axis::Z)),
            "bond-geometry" | "bond_geometry" | "local" => Ok(Self::BondGeometry),
            _ => Err(ParsePortOrientationError(s.to_string())),
        }
    }
}

impl fmt::Display for PortOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortOrientation::FixedAxis(Axis::X) => f.write_str("x"),
            PortOrientation::FixedAxis(Axis::Y) => f.write_str("y"),
            PortOrientation::FixedAxis(Axis::Z) => f.write_str("z"),
            PortOrientation::BondGeometry => f.write_str("bond-geometry"),
        }
    }
}

/// Parameters shared by every port created for a set of templates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortParams {
    /// Distance between an anchor atom and its port.
    pub bond_length: f64,
    pub orientation: PortOrientation,
}
