use super::traits::MolecularFile;
use crate::core::models::builder::{BuilderError, MolecularSystemBuilder};
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Partner serials per `CONECT` line in the fixed-column layout.
const CONECT_PARTNERS_PER_LINE: usize = 4;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(#[from] BuilderError),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error(
        "Atom {serial} has coordinate {value}, outside the 8-column PDB field (-999.999 to 9999.999)"
    )]
    CoordinateOutOfRange { serial: usize, value: f64 },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

/// Width of each `x`, `y`, `z` field in an ATOM/HETATM record.
const COORDINATE_WIDTH: usize = 8;

/// Rejects coordinates that would not fit `{:>8.3}`, which would shift every later column.
fn check_coordinates(system: &MolecularSystem) -> Result<(), PdbError> {
    for (index, (_, atom)) in system.atoms_iter().enumerate() {
        for &value in atom.position.coords.iter() {
            if !value.is_finite() || format!("{:.3}", value).len() > COORDINATE_WIDTH {
                return Err(PdbError::CoordinateOutOfRange {
                    serial: index + 1,
                    value,
                });
            }
        }
    }
    Ok(())
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_field<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    make_kind: fn(String, String) -> PdbParseErrorKind,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: make_kind(format!("{}-{}", start + 1, end), value.to_string()),
    })
}

fn invalid_int(columns: String, value: String) -> PdbParseErrorKind {
    PdbParseErrorKind::InvalidInt { columns, value }
}

fn invalid_float(columns: String, value: String) -> PdbParseErrorKind {
    PdbParseErrorKind::InvalidFloat { columns, value }
}

/// Pads a name into the four-column atom-name field, leaving column 13 blank for
/// one-letter elements as most viewers expect.
fn pdb_atom_name(name: &str, element: &str) -> String {
    if element.len() == 1 && name.len() < 4 {
        format!(" {:<3}", name)
    } else {
        format!("{:<4.4}", name)
    }
}

/// Reader and writer for the legacy Protein Data Bank (`.pdb`) format.
///
/// Only `ATOM`/`HETATM` and `CONECT` records are interpreted. Every atom is kept, in file
/// order; alternate locations are not filtered.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut conect: Vec<(usize, usize)> = Vec::new();
        let mut current_residue: Option<(isize, String)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let serial: usize = parse_field(&line, line_num, 6, 11, invalid_int)?;
                    let res_name = slice_and_trim(&line, 17, 20);
                    // Some writers leave the residue number blank for single molecules.
                    let res_seq: isize = if slice_and_trim(&line, 22, 26).is_empty() {
                        1
                    } else {
                        parse_field(&line, line_num, 22, 26, invalid_int)?
                    };
                    let x: f64 = parse_field(&line, line_num, 30, 38, invalid_float)?;
                    let y: f64 = parse_field(&line, line_num, 38, 46, invalid_float)?;
                    let z: f64 = parse_field(&line, line_num, 46, 54, invalid_float)?;
                    let element = slice_and_trim(&line, 76, 78);

                    let residue_key = (res_seq, res_name.to_string());
                    if current_residue.as_ref() != Some(&residue_key) {
                        builder.start_residue(res_seq, res_name);
                        current_residue = Some(residue_key);
                    }
                    builder.add_atom(
                        serial,
                        name,
                        Some(element).filter(|e| !e.is_empty()),
                        Point3::new(x, y, z),
                        0.0,
                        "",
                    )?;
                }
                "CONECT" => {
                    let origin: usize = parse_field(&line, line_num, 6, 11, invalid_int)?;
                    for start in (11..31).step_by(5) {
                        if slice_and_trim(&line, start, start + 5).is_empty() {
                            continue;
                        }
                        let partner: usize =
                            parse_field(&line, line_num, start, start + 5, invalid_int)?;
                        conect.push((origin, partner));
                    }
                }
                "END" | "ENDMDL" => break,
                _ => {}
            }
        }

        if builder.atom_count() == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        for (origin, partner) in conect {
            builder.add_bond(origin, partner, BondOrder::Single)?;
        }
        Ok(builder.build())
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        check_coordinates(system)?;
        writeln!(writer, "REMARK   1 GENERATED BY POLYBLOCK")?;

        let mut serials: HashMap<AtomId, usize> = HashMap::with_capacity(system.atom_count());
        for (index, (atom_id, atom)) in system.atoms_iter().enumerate() {
            let serial = index + 1;
            serials.insert(atom_id, serial);
            let (res_number, res_name) = system
                .residue(atom.residue_id)
                .map_or((1, "UNL"), |r| (r.number, r.name.as_str()));
            writeln!(
                writer,
                "HETATM{:>5} {} {:>3.3} {:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2.2}",
                serial % 100_000,
                pdb_atom_name(&atom.name, &atom.element),
                res_name,
                "A",
                res_number.rem_euclid(10_000),
                atom.position.x,
                atom.position.y,
                atom.position.z,
                1.0,
                0.0,
                atom.element.to_uppercase()
            )?;
        }

        let mut bond_map: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for bond in system.bonds() {
            if let (Some(&s1), Some(&s2)) = (serials.get(&bond.atom1_id), serials.get(&bond.atom2_id)) {
                bond_map.entry(s1).or_default().push(s2);
                bond_map.entry(s2).or_default().push(s1);
            }
        }
        for (serial, partners) in &bond_map {
            for chunk in partners.chunks(CONECT_PARTNERS_PER_LINE) {
                write!(writer, "CONECT{:>5}", serial)?;
                for partner in chunk {
                    write!(writer, "{:>5}", partner)?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}
