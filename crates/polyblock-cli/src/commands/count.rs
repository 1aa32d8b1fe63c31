use crate::cli::CountArgs;
use crate::error::{CliError, Result};
use polyblock::core::io::read_structure;
use polyblock::core::utils::mass::{density_to_count, molecular_weight};
use polyblock::engine::error::EngineError;
use tracing::info;

pub fn run(args: CountArgs) -> Result<()> {
    let (mw, count) = count_molecules(&args)?;
    println!("Molecular weight: {:.3} g/mol", mw);
    println!(
        "✓ {} molecule(s) reach {} g/mL in a {} x {} x {} nm box.",
        count, args.density, args.box_dimensions[0], args.box_dimensions[1], args.box_dimensions[2]
    );
    Ok(())
}

fn count_molecules(args: &CountArgs) -> Result<(f64, usize)> {
    let box_dimensions: [f64; 3] = args.box_dimensions.as_slice().try_into().map_err(|_| {
        CliError::Argument(format!(
            "Expected exactly 3 box dimensions, got {}",
            args.box_dimensions.len()
        ))
    })?;

    let mw = match (args.molecular_weight, &args.structure) {
        (Some(mw), _) => mw,
        (None, Some(path)) => {
            info!("Computing molecular weight from {:?}", path);
            let system = read_structure(path).map_err(EngineError::from)?;
            molecular_weight(&system).map_err(EngineError::from)?
        }
        (None, None) => {
            return Err(CliError::Argument(
                "Either --molecular-weight or --structure is required".to_string(),
            ));
        }
    };

    let count = density_to_count(args.density, mw, box_dimensions).map_err(EngineError::from)?;
    Ok((mw, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(density: f64, mw: Option<f64>) -> CountArgs {
        CountArgs {
            density,
            molecular_weight: mw,
            structure: None,
            box_dimensions: vec![3.0, 3.0, 3.0],
        }
    }

    #[test]
    fn counts_water_molecules_in_a_cubic_box() {
        let (mw, count) = count_molecules(&args(1.0, Some(18.015))).unwrap();
        assert_eq!(mw, 18.015);
        assert_eq!(count, 902);
    }

    #[test]
    fn molecular_weight_can_come_from_a_structure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.pdb");
        fs::write(
            &path,
            "\
HETATM    1  O   HOH     1       0.000   0.000   0.000  1.00  0.00           O
HETATM    2  H1  HOH     1       0.957   0.000   0.000  1.00  0.00           H
HETATM    3  H2  HOH     1      -0.240   0.927   0.000  1.00  0.00           H
END
",
        )
        .unwrap();
        let mut count_args = args(1.0, None);
        count_args.structure = Some(path);

        let (mw, count) = count_molecules(&count_args).unwrap();
        assert!((mw - 18.015).abs() < 0.01);
        assert!((901..=903).contains(&count));
    }

    #[test]
    fn invalid_inputs_are_reported() {
        assert!(matches!(
            count_molecules(&args(-1.0, Some(18.0))),
            Err(CliError::Core(EngineError::Mass { .. }))
        ));

        let mut bad_box = args(1.0, Some(18.0));
        bad_box.box_dimensions = vec![1.0, 2.0];
        assert!(matches!(count_molecules(&bad_box), Err(CliError::Argument(_))));

        assert!(matches!(count_molecules(&args(1.0, None)), Err(CliError::Argument(_))));
    }
}
