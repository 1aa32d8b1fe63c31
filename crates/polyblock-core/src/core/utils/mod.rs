//! Stateless helpers shared by the models and the engine: rigid-body geometry and
//! mass/density arithmetic.

pub mod geometry;
pub mod mass;
