use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::f64::consts::PI;

/// A proper rigid-body motion: a rotation followed by a translation.
///
/// Applying a `RigidTransform` never scales or shears, so every internal distance of a
/// transformed point set is preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Rotation3::identity(), Vector3::zeros())
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(Rotation3::identity(), translation)
    }

    /// Builds the transform that rotates about `pivot` and then moves `pivot` onto `target`.
    pub fn about_pivot(rotation: Rotation3<f64>, pivot: &Point3<f64>, target: &Point3<f64>) -> Self {
        let translation = target.coords - rotation * pivot.coords;
        Self::new(rotation, translation)
    }

    #[inline]
    pub fn apply_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    #[inline]
    pub fn apply_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }
}

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Returns a unit vector perpendicular to `v`.
pub fn any_perpendicular(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let n = v.normalize();
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(n.cross(&helper))
}

/// Minimal rotation taking the direction of `from` onto the direction of `to`.
///
/// Antiparallel inputs have no unique minimal rotation; a half-turn about an arbitrary
/// perpendicular axis is returned for them.
pub fn rotation_onto(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::rotation_between(from, to)
        .unwrap_or_else(|| Rotation3::from_axis_angle(&any_perpendicular(from), PI))
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Largest change of any pairwise distance between two equally sized point sets.
///
/// Zero (up to rounding) exactly when the second set is a rigid motion of the first.
pub fn max_internal_distance_deviation(
    coords1: &[Point3<f64>],
    coords2: &[Point3<f64>],
) -> Option<f64> {
    if coords1.len() != coords2.len() {
        return None;
    }
    let mut max_dev: f64 = 0.0;
    for i in 0..coords1.len() {
        for j in (i + 1)..coords1.len() {
            let d1 = (coords1[i] - coords1[j]).norm();
            let d2 = (coords2[i] - coords2[j]).norm();
            max_dev = max_dev.max((d1 - d2).abs());
        }
    }
    Some(max_dev)
}
