//! TOML build recipes: which monomer files to load and which blocks to assemble from them.
//!
//! ```toml
//! [settings]
//! bond-length = 0.05
//!
//! [monomers.alpha]
//! path = "molecules/alpha_acetic_acid.pdb"
//! anchors = [2, 0]
//!
//! [[blocks]]
//! name = "block-a"
//! type = "random"
//! units = ["alpha", "beta"]
//! ratios = [1, 3]
//! chain-length = 10
//!
//! [[blocks]]
//! name = "polymer"
//! type = "repeated"
//! units = ["block-a", "peg-block"]
//! amounts = [1, 1]
//!
//! [output]
//! block = "polymer"
//! ```
//!
//! Blocks are built in the order listed and may use any monomer or any earlier block as a unit.

use crate::engine::sequence::SequenceError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::Value;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Name '{0}' is defined more than once (monomer and block names share one namespace)")]
    DuplicateName(String),
    #[error("Block '{block}' uses unit '{unit}', which is neither a monomer nor an earlier block")]
    UnknownUnit { block: String, unit: String },
    #[error("Block '{block}' is missing the '{field}' field required for {kind} blocks")]
    MissingField {
        block: String,
        field: &'static str,
        kind: BlockType,
    },
    #[error("Invalid definition of block '{block}': {source}")]
    Sequence {
        block: String,
        #[source]
        source: SequenceError,
    },
    #[error("Recipe defines no blocks")]
    NoBlocks,
    #[error("Output block '{0}' is not defined in the recipe")]
    UnknownOutputBlock(String),
}

/// Optional build settings; command-line values take precedence over these.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RecipeSettings {
    pub bond_length: Option<f64>,
    pub port_orientation: Option<String>,
    pub seed: Option<u64>,
    pub center: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Repeated,
    Random,
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Repeated => f.write_str("repeated"),
            BlockType::Random => f.write_str("random"),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawRecipe {
    #[serde(default)]
    settings: RecipeSettings,
    #[serde(default)]
    monomers: BTreeMap<String, RawMonomer>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
    output: Option<RawOutput>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawMonomer {
    path: PathBuf,
    anchors: [usize; 2],
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawBlock {
    name: String,
    #[serde(rename = "type")]
    kind: BlockType,
    units: Value,
    amounts: Option<Value>,
    repeat: Option<usize>,
    ratios: Option<Value>,
    chain_length: Option<usize>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    block: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonomerSpec {
    pub name: String,
    /// Structure file, resolved against the recipe's directory.
    pub path: PathBuf,
    /// `(up, down)` anchor atom indices in file order.
    pub anchors: (usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Repeated { amounts: Vec<usize>, repeat: usize },
    Random { ratios: Vec<f64>, chain_length: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub name: String,
    pub units: Vec<String>,
    pub kind: BlockKind,
}

/// A validated recipe. Every unit a block names is known to exist when the block is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub settings: RecipeSettings,
    pub monomers: Vec<MonomerSpec>,
    pub blocks: Vec<BlockSpec>,
    /// Name of the block to export.
    pub target: String,
}

impl Recipe {
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let content = std::fs::read_to_string(path).map_err(|e| RecipeError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&content, base_dir).map_err(|e| match e {
            RecipeError::Toml { source, .. } => RecipeError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parses recipe text, resolving relative monomer paths against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self, RecipeError> {
        let raw: RawRecipe = toml::from_str(content).map_err(|e| RecipeError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;

        let mut known: HashSet<String> = HashSet::new();
        let monomers: Vec<MonomerSpec> = raw
            .monomers
            .into_iter()
            .map(|(name, m)| {
                known.insert(name.clone());
                MonomerSpec {
                    path: base_dir.join(&m.path),
                    anchors: (m.anchors[0], m.anchors[1]),
                    name,
                }
            })
            .collect();

        if raw.blocks.is_empty() {
            return Err(RecipeError::NoBlocks);
        }
        let mut blocks = Vec::with_capacity(raw.blocks.len());
        for raw_block in raw.blocks {
            let block = convert_block(raw_block)?;
            if let Some(unit) = block.units.iter().find(|u| !known.contains(*u)) {
                return Err(RecipeError::UnknownUnit {
                    block: block.name.clone(),
                    unit: unit.clone(),
                });
            }
            if !known.insert(block.name.clone()) {
                return Err(RecipeError::DuplicateName(block.name));
            }
            blocks.push(block);
        }

        let target = match raw.output {
            Some(output) => output.block,
            None => blocks
                .last()
                .map(|b: &BlockSpec| b.name.clone())
                .ok_or(RecipeError::NoBlocks)?,
        };
        if !blocks.iter().any(|b| b.name == target) {
            return Err(RecipeError::UnknownOutputBlock(target));
        }

        debug!(
            "Parsed recipe with {} monomers and {} blocks (target '{}').",
            monomers.len(),
            blocks.len(),
            target
        );
        Ok(Self {
            settings: raw.settings,
            monomers,
            blocks,
            target,
        })
    }

    /// Selects a different block to export.
    pub fn with_target(mut self, target: &str) -> Result<Self, RecipeError> {
        if !self.blocks.iter().any(|b| b.name == target) {
            return Err(RecipeError::UnknownOutputBlock(target.to_string()));
        }
        self.target = target.to_string();
        Ok(self)
    }
}

fn convert_block(raw: RawBlock) -> Result<BlockSpec, RecipeError> {
    let name = raw.name;
    let sequence_error = |source| RecipeError::Sequence {
        block: name.clone(),
        source,
    };
    let missing = |field| RecipeError::MissingField {
        block: name.clone(),
        field,
        kind: raw.kind,
    };

    let units = string_list(&raw.units, "units").map_err(sequence_error)?;
    let kind = match raw.kind {
        BlockType::Repeated => {
            let amounts = raw.amounts.as_ref().ok_or_else(|| missing("amounts"))?;
            BlockKind::Repeated {
                amounts: integer_list(amounts, "amounts").map_err(sequence_error)?,
                repeat: raw.repeat.unwrap_or(1),
            }
        }
        BlockType::Random => {
            let ratios = raw.ratios.as_ref().ok_or_else(|| missing("ratios"))?;
            BlockKind::Random {
                ratios: number_list(ratios, "ratios").map_err(sequence_error)?,
                chain_length: raw.chain_length.ok_or_else(|| missing("chain-length"))?,
            }
        }
    };
    Ok(BlockSpec { name, units, kind })
}

fn type_mismatch(field: &str, expected: &'static str, found: &Value) -> SequenceError {
    SequenceError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: describe(found),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("the string \"{}\"", s),
        other => format!("a {}", other.type_str()),
    }
}

fn array<'v>(
    value: &'v Value,
    field: &str,
    expected: &'static str,
) -> Result<&'v [Value], SequenceError> {
    value
        .as_array()
        .map(|a| a.as_slice())
        .ok_or_else(|| type_mismatch(field, expected, value))
}

fn string_list(value: &Value, field: &str) -> Result<Vec<String>, SequenceError> {
    const EXPECTED: &str = "an array of unit names";
    array(value, field, EXPECTED)?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| type_mismatch(field, EXPECTED, v))
        })
        .collect()
}

fn integer_list(value: &Value, field: &str) -> Result<Vec<usize>, SequenceError> {
    const EXPECTED: &str = "an array of non-negative integers";
    array(value, field, EXPECTED)?
        .iter()
        .map(|v| {
            v.as_integer()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| type_mismatch(field, EXPECTED, v))
        })
        .collect()
}

fn number_list(value: &Value, field: &str) -> Result<Vec<f64>, SequenceError> {
    const EXPECTED: &str = "an array of numbers";
    array(value, field, EXPECTED)?
        .iter()
        .map(|v| match v {
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(type_mismatch(field, EXPECTED, other)),
        })
        .collect()
}
