use crate::core::models::port::{PortOrientation, PortParams};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Settings shared by every template and block of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub port: PortParams,
    /// Seed for random blocks; `None` draws one from the operating system.
    pub seed: Option<u64>,
    /// Translate the finished target block so its first atom sits at the origin.
    pub center_on_first_atom: bool,
}

#[derive(Default)]
pub struct BuildConfigBuilder {
    bond_length: Option<f64>,
    port_orientation: Option<PortOrientation>,
    seed: Option<u64>,
    center_on_first_atom: bool,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bond_length(mut self, length: f64) -> Self {
        self.bond_length = Some(length);
        self
    }
    pub fn port_orientation(mut self, orientation: PortOrientation) -> Self {
        self.port_orientation = Some(orientation);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn center_on_first_atom(mut self, center: bool) -> Self {
        self.center_on_first_atom = center;
        self
    }

    pub fn build(self) -> Result<BuildConfig, ConfigError> {
        let port = PortParams {
            bond_length: self
                .bond_length
                .ok_or(ConfigError::MissingParameter("bond_length"))?,
            orientation: self
                .port_orientation
                .ok_or(ConfigError::MissingParameter("port_orientation"))?,
        };
        Ok(BuildConfig {
            port,
            seed: self.seed,
            center_on_first_atom: self.center_on_first_atom,
        })
    }
}
