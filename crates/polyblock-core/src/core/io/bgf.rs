use super::traits::MolecularFile;
use crate::core::models::builder::{BuilderError, MolecularSystemBuilder};
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const ATOM_FORMAT: &str =
    "FORMAT ATOM   (a6,1x,i5,1x,a5,1x,a3,1x,a1,1x,a5,3f10.5,1x,a5,i3,i2,1x,f8.5)";
const CONECT_FORMAT: &str = "FORMAT CONECT (a6,12i6)";

#[derive(Debug, Error)]
pub enum BgfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: BgfParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(#[from] BuilderError),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error(
        "Atom {serial} has coordinate {value}, outside the 10-column BGF field (-9999.99999 to 99999.99999)"
    )]
    CoordinateOutOfRange { serial: usize, value: f64 },
}

#[derive(Debug, Error)]
pub enum BgfParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 80 chars)")]
    LineTooShort,
    #[error("Invalid atom serial '{0}' in bond record")]
    InvalidBondSerial(String),
}

const COORDINATE_WIDTH: usize = 10;

fn check_coordinates(system: &MolecularSystem) -> Result<(), BgfError> {
    for (index, (_, atom)) in system.atoms_iter().enumerate() {
        for &value in atom.position.coords.iter() {
            if !value.is_finite() || format!("{:.5}", value).len() > COORDINATE_WIDTH {
                return Err(BgfError::CoordinateOutOfRange {
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

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, BgfError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| BgfError::Parse {
        line: line_num,
        kind: BgfParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_serial_list(parts: &[&str], line_num: usize) -> Result<Vec<usize>, BgfError> {
    parts
        .iter()
        .map(|p| {
            p.parse().map_err(|_| BgfError::Parse {
                line: line_num,
                kind: BgfParseErrorKind::InvalidBondSerial(p.to_string()),
            })
        })
        .collect()
}

/// Reader and writer for the fixed-column BIOGRF (`.bgf`) format.
pub struct BgfFile;

impl MolecularFile for BgfFile {
    type Error = BgfError;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut conect: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut orders: HashMap<usize, Vec<BondOrder>> = HashMap::new();
        let mut current_residue: Option<(isize, String)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    if line.len() < 80 {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::LineTooShort,
                        });
                    }

                    let serial_str = slice_and_trim(&line, 7, 12);
                    let name_str = slice_and_trim(&line, 13, 18);
                    let res_name_str = slice_and_trim(&line, 19, 22);
                    let res_id_str = slice_and_trim(&line, 25, 30);
                    let ff_type_str = slice_and_trim(&line, 61, 66);

                    if name_str.is_empty() {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::MissingRequiredField {
                                columns: "14-18".into(),
                            },
                        });
                    }
                    let serial: usize = serial_str.parse().map_err(|_| BgfError::Parse {
                        line: line_num,
                        kind: BgfParseErrorKind::InvalidInt {
                            columns: "8-12".into(),
                            value: serial_str.into(),
                        },
                    })?;
                    let res_id: isize = res_id_str.parse().map_err(|_| BgfError::Parse {
                        line: line_num,
                        kind: BgfParseErrorKind::InvalidInt {
                            columns: "26-30".into(),
                            value: res_id_str.into(),
                        },
                    })?;
                    let x = parse_float(&line, line_num, 30, 40)?;
                    let y = parse_float(&line, line_num, 40, 50)?;
                    let z = parse_float(&line, line_num, 50, 60)?;
                    let charge = parse_float(&line, line_num, 72, 80)?;
                    if ff_type_str.is_empty() {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::MissingRequiredField {
                                columns: "62-66".into(),
                            },
                        });
                    }

                    let residue_key = (res_id, res_name_str.to_string());
                    if current_residue.as_ref() != Some(&residue_key) {
                        builder.start_residue(res_id, res_name_str);
                        current_residue = Some(residue_key);
                    }
                    // DREIDING-style types ("C_3", "O_2") carry the element before the underscore.
                    let element = ff_type_str
                        .split_once('_')
                        .map(|(symbol, _)| symbol)
                        .filter(|symbol| !symbol.is_empty());
                    builder.add_atom(
                        serial,
                        name_str,
                        element,
                        Point3::new(x, y, z),
                        charge,
                        ff_type_str,
                    )?;
                }
                record @ ("CONECT" | "ORDER") => {
                    let parts: Vec<&str> = line.split_whitespace().skip(1).collect();
                    let Some((first, rest)) = parts.split_first() else {
                        continue;
                    };
                    let serials = parse_serial_list(&[*first], line_num)?;
                    let origin = serials[0];
                    if record == "CONECT" {
                        conect.push((origin, parse_serial_list(rest, line_num)?));
                    } else {
                        let parsed = rest.iter().map(|o| o.parse().unwrap_or_default()).collect();
                        orders.insert(origin, parsed);
                    }
                }
                "END" => break,
                _ => {}
            }
        }

        if builder.atom_count() == 0 {
            return Err(BgfError::MissingRecord("ATOM/HETATM records".into()));
        }

        for (origin, partners) in conect {
            for (position, partner) in partners.into_iter().enumerate() {
                let order = orders
                    .get(&origin)
                    .and_then(|o| o.get(position))
                    .copied()
                    .unwrap_or_default();
                builder.add_bond(origin, partner, order)?;
            }
        }
        Ok(builder.build())
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        check_coordinates(system)?;
        writeln!(writer, "BIOGRF  200")?;
        writeln!(writer, "REMARK Generated by polyblock")?;
        writeln!(writer, "{}", ATOM_FORMAT)?;

        let mut serials: HashMap<AtomId, usize> = HashMap::with_capacity(system.atom_count());
        for (index, (atom_id, atom)) in system.atoms_iter().enumerate() {
            let serial = index + 1;
            serials.insert(atom_id, serial);
            let (res_number, res_name) = system
                .residue(atom.residue_id)
                .map_or((1, "UNL"), |r| (r.number, r.name.as_str()));
            let ff_type = if atom.force_field_type.is_empty() {
                atom.element.as_str()
            } else {
                atom.force_field_type.as_str()
            };
            let bond_count = system
                .get_bonded_neighbors(atom_id)
                .map_or(0, |neighbors| neighbors.len());
            writeln!(
                writer,
                "{:<6} {:>5} {:<5.5} {:<3.3} {:1} {:>5}{:>10.5}{:>10.5}{:>10.5} {:<5.5}{:>3}{:>2} {:>8.5}",
                "HETATM",
                serial,
                atom.name,
                res_name,
                "A",
                res_number,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                ff_type,
                bond_count,
                0,
                atom.partial_charge
            )?;
        }

        let mut bond_map: BTreeMap<usize, Vec<(usize, BondOrder)>> = BTreeMap::new();
        for bond in system.bonds() {
            if let (Some(&s1), Some(&s2)) = (serials.get(&bond.atom1_id), serials.get(&bond.atom2_id)) {
                bond_map.entry(s1).or_default().push((s2, bond.order));
                bond_map.entry(s2).or_default().push((s1, bond.order));
            }
        }
        if !bond_map.is_empty() {
            writeln!(writer, "{}", CONECT_FORMAT)?;
        }
        for (serial, partners) in &bond_map {
            write!(writer, "CONECT{:>6}", serial)?;
            for (partner, _) in partners {
                write!(writer, "{:>6}", partner)?;
            }
            writeln!(writer)?;
            if partners.iter().any(|(_, order)| *order != BondOrder::Single) {
                write!(writer, "ORDER {:>6}", serial)?;
                for (_, order) in partners {
                    write!(writer, "{:>6}", *order as u8)?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::traits::WritePolicy;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
BIOGRF  200
DESCRP acetic
FORMAT ATOM   (a6,1x,i5,1x,a5,1x,a3,1x,a1,1x,a5,3f10.5,1x,a5,i3,i2,1x,f8.5)
HETATM     1 C1    ACE A     1   0.00000   0.00000   0.00000 C_3    2 0 -0.18000
HETATM     2 C2    ACE A     1   1.52000   0.00000   0.00000 C_2    3 0  0.52000
HETATM     3 O1    ACE A     1   2.20000   1.10000   0.00000 O_2    1 0 -0.44000
FORMAT CONECT (a6,12i6)
CONECT     1     2
CONECT     2     1     3
ORDER      2     1     2
CONECT     3     2
ORDER      3     2
END
";

    fn read_sample() -> MolecularSystem {
        BgfFile::read_from(&mut Cursor::new(SAMPLE)).unwrap()
    }

    #[test]
    fn interleaved_residues_keep_record_order() {
        let input = SAMPLE.replacen("C2    ACE A     1", "C2    BBB A     2", 1);
        let system = BgfFile::read_from(&mut Cursor::new(input)).unwrap();
        let names: Vec<_> = system.atoms_iter().map(|(_, a)| a.name.as_str()).collect();
        assert_eq!(names, vec!["C1", "C2", "O1"]);
        let residues: Vec<_> = system.residues_iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(residues, vec!["ACE", "BBB", "ACE"]);
    }

    #[test]
    fn reads_atoms_in_file_order() {
        let system = read_sample();
        let atoms: Vec<_> = system.atoms_iter().map(|(_, a)| a).collect();
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[0].name, "C1");
        assert_eq!(atoms[2].name, "O1");
        assert_eq!(atoms[2].element, "O");
        assert_eq!(atoms[1].force_field_type, "C_2");
        assert_eq!(atoms[1].position, Point3::new(1.52, 0.0, 0.0));
        assert!((atoms[0].partial_charge + 0.18).abs() < 1e-12);
        assert_eq!(system.residue_count(), 1);
    }

    #[test]
    fn reads_bonds_with_orders() {
        let system = read_sample();
        assert_eq!(system.bonds().len(), 2);
        let double = system
            .bonds()
            .iter()
            .find(|b| b.order == BondOrder::Double)
            .unwrap();
        let ids = system.ordered_atom_ids();
        let pair = [double.atom1_id, double.atom2_id];
        assert!(pair.contains(&ids[1]) && pair.contains(&ids[2]));
    }

    #[test]
    fn short_atom_line_is_rejected() {
        let input = "HETATM     1 C1    ACE A     1   0.00000\n";
        let result = BgfFile::read_from(&mut Cursor::new(input));
        assert!(matches!(
            result,
            Err(BgfError::Parse {
                line: 1,
                kind: BgfParseErrorKind::LineTooShort
            })
        ));
    }

    #[test]
    fn file_without_atoms_is_rejected() {
        let result = BgfFile::read_from(&mut Cursor::new("BIOGRF  200\nEND\n"));
        assert!(matches!(result, Err(BgfError::MissingRecord(_))));
    }

    #[test]
    fn bond_to_unknown_serial_is_rejected() {
        let input = SAMPLE.replace("CONECT     3     2", "CONECT     3     9");
        let result = BgfFile::read_from(&mut Cursor::new(input));
        assert!(matches!(
            result,
            Err(BgfError::Inconsistency(BuilderError::UnknownSerial(9)))
        ));
    }

    #[test]
    fn written_file_reads_back_identically() {
        let original = read_sample();
        let mut buffer = Vec::new();
        BgfFile::write_to(&original, &mut buffer).unwrap();
        let reread = BgfFile::read_from(&mut Cursor::new(buffer)).unwrap();

        assert_eq!(reread.atom_count(), original.atom_count());
        for ((_, a), (_, b)) in original.atoms_iter().zip(reread.atoms_iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.element, b.element);
            assert!((a.position - b.position).norm() < 1e-5);
        }
        let orders: Vec<_> = reread.bonds().iter().map(|b| b.order).collect();
        assert_eq!(orders.len(), 2);
        assert!(orders.contains(&BondOrder::Double));
    }

    #[test]
    fn create_new_refuses_to_overwrite() {
        let system = read_sample();
        let file = NamedTempFile::new().unwrap();
        let result = BgfFile::write_to_path(&system, file.path(), WritePolicy::CreateNew);
        assert!(matches!(result, Err(BgfError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists));

        BgfFile::write_to_path(&system, file.path(), WritePolicy::Overwrite).unwrap();
        let reread = BgfFile::read_from_path(file.path()).unwrap();
        assert_eq!(reread.atom_count(), 3);
    }

    #[test]
    fn coordinates_wider_than_the_field_are_rejected() {
        let wide = SAMPLE.replacen("   2.20000", "-10000.000", 1);
        let system = BgfFile::read_from(&mut Cursor::new(wide)).unwrap();

        let mut buffer = Vec::new();
        let result = BgfFile::write_to(&system, &mut buffer);
        assert!(matches!(
            result,
            Err(BgfError::CoordinateOutOfRange { serial: 3, value }) if value == -10000.0
        ));
        assert!(buffer.is_empty());
    }
}
