use crate::core::models::system::MolecularSystem;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Controls what happens when an output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Replace any existing file.
    #[default]
    Overwrite,
    /// Fail with [`io::ErrorKind::AlreadyExists`] instead of replacing a file.
    CreateNew,
}

impl WritePolicy {
    fn open(self, path: &Path) -> io::Result<File> {
        match self {
            WritePolicy::Overwrite => File::create(path),
            WritePolicy::CreateNew => OpenOptions::new().write(true).create_new(true).open(path),
        }
    }
}

/// Defines the interface for reading and writing molecular file formats.
///
/// Readers preserve the atom order of the file, which is what monomer anchor indices
/// refer to. Writers emit atoms in the same residue order the system iterates in.
pub trait MolecularFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a molecular system from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error>;

    /// Writes a molecular system to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a molecular system from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<MolecularSystem, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a molecular system to a file path.
    ///
    /// # Arguments
    ///
    /// * `system` - The molecular system to write.
    /// * `path` - The path to the file to write.
    /// * `policy` - Whether an existing file may be replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the system cannot be represented in the format, if the file
    /// cannot be created (including when it exists under [`WritePolicy::CreateNew`]) or if
    /// writing fails. The file is only touched once the whole record set has been formatted.
    fn write_to_path<P: AsRef<Path>>(
        system: &MolecularSystem,
        path: P,
        policy: WritePolicy,
    ) -> Result<(), Self::Error> {
        let mut buffer = Vec::new();
        Self::write_to(system, &mut buffer)?;
        let mut file = policy.open(path.as_ref())?;
        file.write_all(&buffer)?;
        file.flush()?;
        Ok(())
    }
}
