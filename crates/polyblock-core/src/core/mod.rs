//! # Core Module
//!
//! Stateless building blocks: molecular data models, structure file I/O, and the
//! geometry and mass utilities the engine relies on.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, bonds, ports, monomers and blocks
//! - **File I/O** ([`io`]) - BGF and PDB readers and writers
//! - **Utilities** ([`utils`]) - Rigid transforms, element masses and density conversions

pub mod io;
pub mod models;
pub mod utils;
