use crate::cli::BuildArgs;
use crate::error::{CliError, Result};
use polyblock::core::models::port::PortOrientation;
use polyblock::engine::config::{BuildConfig, BuildConfigBuilder};
use polyblock::workflows::recipe::RecipeSettings;
use tracing::debug;

pub struct DefaultsConfig {
    pub bond_length: f64,
    pub port_orientation: PortOrientation,
    pub center: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bond_length: 0.05,
            port_orientation: PortOrientation::default(),
            center: false,
        }
    }
}

/// Resolves the final build settings.
///
/// Precedence: command-line flags, then `-S` values, then the recipe's `[settings]`,
/// then built-in defaults.
pub fn build_config(args: &BuildArgs, recipe_settings: &RecipeSettings) -> Result<BuildConfig> {
    let defaults = DefaultsConfig::default();
    let settings = apply_set_values(recipe_settings.clone(), &args.set_values)?;
    debug!("Recipe settings after --set overrides: {:?}", settings);

    let bond_length = args
        .bond_length
        .or(settings.bond_length)
        .unwrap_or(defaults.bond_length);

    let port_orientation = match (args.port_orientation, settings.port_orientation.as_deref()) {
        (Some(orientation), _) => orientation,
        (None, Some(text)) => text
            .parse::<PortOrientation>()
            .map_err(|e| CliError::Config(e.to_string()))?,
        (None, None) => defaults.port_orientation,
    };

    let center = args.center || settings.center.unwrap_or(defaults.center);

    BuildConfigBuilder::new()
        .bond_length(bond_length)
        .port_orientation(port_orientation)
        .seed(args.seed.or(settings.seed))
        .center_on_first_atom(center)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn apply_set_values(mut settings: RecipeSettings, set_values: &[String]) -> Result<RecipeSettings> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "settings.bond-length" => {
                settings.bond_length = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })?);
            }
            "settings.port-orientation" => {
                settings.port_orientation = Some(value_str.to_string());
            }
            "settings.seed" => {
                settings.seed = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
                })?);
            }
            "settings.center" => {
                settings.center = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid boolean value for {}: {}", key, value_str))
                })?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyblock::core::models::port::Axis;
    use std::path::PathBuf;

    fn base_build_args() -> BuildArgs {
        BuildArgs {
            recipe: PathBuf::from("recipe.toml"),
            output: PathBuf::from("out.pdb"),
            block: None,
            force: false,
            seed: None,
            bond_length: None,
            port_orientation: None,
            center: false,
            set_values: vec![],
            print_sequence: false,
            report: None,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = build_config(&base_build_args(), &RecipeSettings::default()).unwrap();
        assert_eq!(config.port.bond_length, 0.05);
        assert_eq!(config.port.orientation, PortOrientation::FixedAxis(Axis::X));
        assert_eq!(config.seed, None);
        assert!(!config.center_on_first_atom);
    }

    #[test]
    fn recipe_settings_override_defaults() {
        let settings = RecipeSettings {
            bond_length: Some(0.1),
            port_orientation: Some("z".to_string()),
            seed: Some(3),
            center: Some(true),
        };
        let config = build_config(&base_build_args(), &settings).unwrap();
        assert_eq!(config.port.bond_length, 0.1);
        assert_eq!(config.port.orientation, PortOrientation::FixedAxis(Axis::Z));
        assert_eq!(config.seed, Some(3));
        assert!(config.center_on_first_atom);
    }

    #[test]
    fn set_values_override_recipe_and_flags_override_both() {
        let settings = RecipeSettings {
            bond_length: Some(0.1),
            seed: Some(3),
            ..Default::default()
        };
        let mut args = base_build_args();
        args.set_values = vec![
            "settings.bond-length=0.2".to_string(),
            "settings.seed=4".to_string(),
            "settings.port-orientation=bond-geometry".to_string(),
        ];
        let config = build_config(&args, &settings).unwrap();
        assert_eq!(config.port.bond_length, 0.2);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.port.orientation, PortOrientation::BondGeometry);

        args.bond_length = Some(0.3);
        args.seed = Some(5);
        args.port_orientation = Some(PortOrientation::FixedAxis(Axis::Y));
        let config = build_config(&args, &settings).unwrap();
        assert_eq!(config.port.bond_length, 0.3);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.port.orientation, PortOrientation::FixedAxis(Axis::Y));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in [
            "settings.seed",
            "settings.seed=abc",
            "settings.center=maybe",
            "optimization.num-solutions=2",
        ] {
            let mut args = base_build_args();
            args.set_values = vec![bad.to_string()];
            let result = build_config(&args, &RecipeSettings::default());
            assert!(matches!(result, Err(CliError::Config(_))), "accepted '{}'", bad);
        }
    }

    #[test]
    fn invalid_orientation_in_recipe_is_a_config_error() {
        let settings = RecipeSettings {
            port_orientation: Some("diagonal".to_string()),
            ..Default::default()
        };
        let result = build_config(&base_build_args(), &settings);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("diagonal")));
    }
}
