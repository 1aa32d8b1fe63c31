use thiserror::Error;

use super::assembly::AssemblyError;
use super::config::ConfigError;
use super::sequence::SequenceError;
use crate::core::io::StructureIoError;
use crate::core::models::monomer::TemplateError;
use crate::core::utils::mass::MassError;
use crate::workflows::recipe::RecipeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid recipe: {source}")]
    Recipe {
        #[from]
        source: RecipeError,
    },

    #[error("Structure file error: {source}")]
    StructureIo {
        #[from]
        source: StructureIoError,
    },

    #[error("Invalid monomer template: {source}")]
    Template {
        #[from]
        source: TemplateError,
    },

    #[error("Invalid sequence for block '{block}': {source}")]
    Sequence {
        block: String,
        #[source]
        source: SequenceError,
    },

    #[error("Failed to assemble block '{block}': {source}")]
    Assembly {
        block: String,
        #[source]
        source: AssemblyError,
    },

    #[error("Mass calculation failed: {source}")]
    Mass {
        #[from]
        source: MassError,
    },

    #[error("Block '{block}' uses unit '{unit}', which is neither a loaded monomer nor an earlier block")]
    UnknownUnit { block: String, unit: String },

    #[error("Block '{0}' was not built")]
    UnknownBlock(String),
}
