//! Reading and writing molecular structure files.
//!
//! Each format implements [`traits::MolecularFile`]. The free functions in this module
//! pick the format from a path's extension so callers can stay format-agnostic.

pub mod bgf;
pub mod pdb;
pub mod traits;

use crate::core::models::system::MolecularSystem;
use bgf::{BgfError, BgfFile};
use pdb::{PdbError, PdbFile};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use traits::{MolecularFile, WritePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Bgf,
    Pdb,
}

impl StructureFormat {
    /// Determines the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, StructureIoError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("bgf") => Ok(StructureFormat::Bgf),
            Some("pdb") | Some("ent") => Ok(StructureFormat::Pdb),
            _ => Err(StructureIoError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureFormat::Bgf => f.write_str("BGF"),
            StructureFormat::Pdb => f.write_str("PDB"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StructureIoError {
    #[error("Unsupported structure file '{path}': expected a .bgf, .pdb or .ent extension")]
    UnsupportedFormat { path: String },
    #[error("Failed to process BGF file '{path}': {source}")]
    Bgf {
        path: String,
        #[source]
        source: BgfError,
    },
    #[error("Failed to process PDB file '{path}': {source}")]
    Pdb {
        path: String,
        #[source]
        source: PdbError,
    },
}

/// Reads a structure, choosing the reader from the file extension.
pub fn read_structure(path: &Path) -> Result<MolecularSystem, StructureIoError> {
    let display = || path.display().to_string();
    match StructureFormat::from_path(path)? {
        StructureFormat::Bgf => BgfFile::read_from_path(path).map_err(|source| StructureIoError::Bgf {
            path: display(),
            source,
        }),
        StructureFormat::Pdb => PdbFile::read_from_path(path).map_err(|source| StructureIoError::Pdb {
            path: display(),
            source,
        }),
    }
}

/// Writes a structure, choosing the writer from the file extension.
pub fn write_structure(
    system: &MolecularSystem,
    path: &Path,
    policy: WritePolicy,
) -> Result<(), StructureIoError> {
    let display = || path.display().to_string();
    match StructureFormat::from_path(path)? {
        StructureFormat::Bgf => {
            BgfFile::write_to_path(system, path, policy).map_err(|source| StructureIoError::Bgf {
                path: display(),
                source,
            })
        }
        StructureFormat::Pdb => {
            PdbFile::write_to_path(system, path, policy).map_err(|source| StructureIoError::Pdb {
                path: display(),
                source,
            })
        }
    }
}
