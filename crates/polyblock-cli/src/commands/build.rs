use crate::cli::BuildArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use polyblock::{
    core::io::{StructureFormat, traits::WritePolicy, write_structure},
    core::utils::mass::molecular_weight,
    engine::{error::EngineError, progress::ProgressReporter},
    workflows::{
        self,
        build::{BlockSummary, BuildResult},
        recipe::Recipe,
    },
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Serialize, Debug)]
struct BuildReport<'a> {
    seed: u64,
    target: &'a str,
    output: String,
    atoms: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    molecular_weight: Option<f64>,
    blocks: Vec<BlockReport<'a>>,
}

#[derive(Serialize, Debug)]
struct BlockReport<'a> {
    name: &'a str,
    units: usize,
    atoms: usize,
}

impl<'a> From<&'a BlockSummary> for BlockReport<'a> {
    fn from(summary: &'a BlockSummary) -> Self {
        Self {
            name: &summary.name,
            units: summary.units,
            atoms: summary.atoms,
        }
    }
}

pub fn run(args: BuildArgs, quiet: bool) -> Result<()> {
    info!("Loading recipe from {:?}", &args.recipe);
    let mut recipe = Recipe::load(&args.recipe).map_err(EngineError::from)?;
    if let Some(block) = &args.block {
        info!("Overriding output block with '{}'.", block);
        recipe = recipe.with_target(block).map_err(EngineError::from)?;
    }

    // Fail on an unusable output path before any work is done.
    let format = StructureFormat::from_path(&args.output).map_err(EngineError::from)?;
    if args.output.exists() && !args.force {
        return Err(CliError::Argument(format!(
            "Output file '{}' already exists. Use --force to overwrite it.",
            args.output.display()
        )));
    }

    let config = build_config(&args, &recipe.settings)?;
    info!("Final build configuration: {:?}", config);

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Building {} block(s) from {} monomer(s)...",
        recipe.blocks.len(),
        recipe.monomers.len()
    );
    let result = workflows::build::run(&recipe, &config, &reporter)?;

    let policy = if args.force {
        WritePolicy::Overwrite
    } else {
        WritePolicy::CreateNew
    };
    info!("Writing block '{}' as {} to {:?}", result.target.name(), format, &args.output);
    write_structure(result.target.system(), &args.output, policy).map_err(EngineError::from)?;

    print_summary(&result, &args.output);
    if args.print_sequence {
        println!("Sequence: {}", result.target.sequence().join("-"));
    }

    if let Some(report_path) = &args.report {
        write_report(&result, &args.output, report_path)?;
        println!("Build report written to: {}", report_path.display());
    }

    Ok(())
}

fn print_summary(result: &BuildResult, output: &Path) {
    for block in &result.blocks {
        println!(
            "  {:<16} {:>6} unit(s) {:>8} atom(s)",
            block.name, block.units, block.atoms
        );
    }
    println!(
        "✓ Block '{}' ({} atoms) written to: {}",
        result.target.name(),
        result.target.atom_count(),
        output.display()
    );
    println!("Random seed: {}", result.seed);
}

fn write_report(result: &BuildResult, output: &Path, report_path: &Path) -> Result<()> {
    let molecular_weight = match molecular_weight(result.target.system()) {
        Ok(mw) => Some(mw),
        Err(e) => {
            warn!("Molecular weight omitted from report: {}", e);
            None
        }
    };
    let report = BuildReport {
        seed: result.seed,
        target: result.target.name(),
        output: output.display().to_string(),
        atoms: result.target.atom_count(),
        molecular_weight,
        blocks: result.blocks.iter().map(BlockReport::from).collect(),
    };

    let content = toml::to_string_pretty(&report).map_err(|e| CliError::Report {
        path: report_path.to_path_buf(),
        source: e.into(),
    })?;
    std::fs::write(report_path, content).map_err(|e| CliError::Report {
        path: report_path.to_path_buf(),
        source: e.into(),
    })
}
