//! # Workflows Module
//!
//! Top-level entry points that tie the `core` and `engine` layers together.
//!
//! - **Recipes** ([`recipe`]) - Parsing and validation of TOML build recipes.
//! - **Build Workflow** ([`build`]) - Loads the monomers a recipe names, assembles its
//!   blocks in order and returns the requested target block.

pub mod build;
pub mod recipe;
