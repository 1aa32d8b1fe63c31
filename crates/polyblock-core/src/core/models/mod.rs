//! # Core Models Module
//!
//! Data structures describing molecular structures and the units a polymer is assembled from.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atoms with coordinates, element and force-field labels
//! - [`residue`] - Residues; each placed monomer copy becomes one residue
//! - [`system`] - A complete structure with atoms, residues and bond connectivity
//! - [`topology`] - Bonds and bond orders
//! - [`builder`] - Serial-number based construction used by the file readers
//! - [`port`] - Attachment points and the rigid alignment between them
//! - [`monomer`] - Immutable monomer templates with `up` and `down` ports
//! - [`block`] - Assembled chains and the per-unit segments they record
//! - [`unit`] - The [`unit::Attachable`] trait and shared [`unit::MonomerRef`] references
//! - [`ids`] - Key types for atoms and residues
//!
//! ## Usage
//!
//! ```ignore
//! use polyblock::core::models::{atom::Atom, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::new();
//! let residue_id = system.add_residue("PEG");
//! let atom = Atom::new("C1", residue_id, Point3::new(0.0, 0.0, 0.0));
//! system.add_atom_to_residue(residue_id, atom);
//! ```

pub mod atom;
pub mod block;
pub mod builder;
pub mod ids;
pub mod monomer;
pub mod port;
pub mod residue;
pub mod system;
pub mod topology;
pub mod unit;
