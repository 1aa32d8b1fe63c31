use clap::{Args, Parser, Subcommand};
use polyblock::core::models::port::PortOrientation;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Polyblock Developers",
    version,
    about = "polyblock - assemble block-copolymer chains from monomer structure files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the blocks described by a recipe and write the target block to a structure file.
    Build(BuildArgs),
    /// Compute how many molecules reach a target density in a box.
    Count(CountArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    // --- Core Arguments ---
    /// Path to the build recipe in TOML format.
    #[arg(short = 'c', long = "recipe", required = true, value_name = "PATH")]
    pub recipe: PathBuf,

    /// Path for the output structure file (.pdb or .bgf).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Export this block instead of the recipe's `[output]` block.
    #[arg(short, long, value_name = "NAME")]
    pub block: Option<String>,

    /// Replace the output file if it already exists.
    #[arg(short, long)]
    pub force: bool,

    // --- Setting Overrides ---
    /// Seed for random blocks. A fresh seed is drawn and printed when omitted.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Distance between an anchor atom and its attachment point.
    #[arg(long, value_name = "FLOAT")]
    pub bond_length: Option<f64>,

    /// Port axis rule: 'x', 'y', 'z' or 'bond-geometry'.
    #[arg(long, value_name = "RULE")]
    pub port_orientation: Option<PortOrientation>,

    /// Translate the output so that its first atom sits at the origin.
    #[arg(long)]
    pub center: bool,

    /// Set a specific recipe setting, overriding the recipe file.
    /// Can be used multiple times. Example: -S settings.seed=42
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    // --- Reporting ---
    /// Print the unit sequence of the target block.
    #[arg(long)]
    pub print_sequence: bool,

    /// Write a TOML build report (seed, block sizes, molecular weight) to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for the `count` subcommand.
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Target density in g/mL.
    #[arg(short, long, required = true, value_name = "FLOAT")]
    pub density: f64,

    /// Molecular weight in g/mol.
    #[arg(
        short,
        long,
        value_name = "FLOAT",
        required_unless_present = "structure",
        conflicts_with = "structure"
    )]
    pub molecular_weight: Option<f64>,

    /// Structure file to compute the molecular weight from.
    #[arg(short, long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// Box edge lengths in nm.
    #[arg(
        long = "box",
        required = true,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true
    )]
    pub box_dimensions: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_arguments_parse() {
        let cli = Cli::parse_from([
            "polyblock",
            "-vv",
            "build",
            "-c",
            "recipe.toml",
            "-o",
            "out.pdb",
            "--seed",
            "9",
            "--port-orientation",
            "bond-geometry",
            "-S",
            "settings.center=true",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.recipe, PathBuf::from("recipe.toml"));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.port_orientation, Some(PortOrientation::BondGeometry));
        assert_eq!(args.set_values, vec!["settings.center=true".to_string()]);
        assert!(!args.force);
    }

    #[test]
    fn count_requires_a_weight_source() {
        let missing = Cli::try_parse_from(["polyblock", "count", "-d", "1", "--box", "5", "5", "5"]);
        assert!(missing.is_err());

        let cli = Cli::try_parse_from([
            "polyblock", "count", "-d", "1", "-m", "18.02", "--box", "5", "5", "5",
        ])
        .unwrap();
        let Commands::Count(args) = cli.command else {
            panic!("expected count command");
        };
        assert_eq!(args.box_dimensions, vec![5.0, 5.0, 5.0]);
        assert_eq!(args.molecular_weight, Some(18.02));
    }
}
