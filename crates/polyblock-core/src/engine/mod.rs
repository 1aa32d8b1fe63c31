//! # Engine Module
//!
//! The assembly logic of the library: turning unit lists into sequences and sequences
//! into rigid chains.
//!
//! - **Sequences** ([`sequence`]) - Repeated-pattern and ratio-weighted random sequence generation
//! - **Assembly** ([`assembly`]) - Port-to-port placement of unit copies into one structure
//! - **Block Building** ([`builder`]) - Sequence generation followed by assembly
//! - **Configuration** ([`config`]) - Port parameters, seeding and centering options
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The aggregate [`error::EngineError`]

pub mod assembly;
pub mod builder;
pub mod config;
pub mod error;
pub mod progress;
pub mod sequence;
