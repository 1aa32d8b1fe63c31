//! # polyblock
//!
//! Procedural assembly of linear block-copolymer structures from reusable monomer templates.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Data models (`MolecularSystem`, `MonomerTemplate`,
//!   `PolymerBlock`), rigid-body geometry and structure file I/O.
//!
//! - **[`engine`]: The Logic Core.** Sequence generation (repeated patterns and weighted
//!   random draws) and the chain assembler that joins each unit's `up` port to the previous
//!   unit's `down` port without distorting either.
//!
//! - **[`workflows`]: The Public API.** Runs a complete TOML recipe: loads monomers, builds
//!   blocks in order (blocks may contain earlier blocks) and returns the requested one.

pub mod core;
pub mod engine;
pub mod workflows;
