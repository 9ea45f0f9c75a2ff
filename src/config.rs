//! Heat-diffusion simulation parameters used to locate and scale its output.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted grid side
pub const MAX_GRID_SIZE: usize = 65_536;

/// One labelled simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatConfig {
    /// Label used in file names, e.g. `A` in `point_evolution_configA.txt`
    pub label: String,
    /// Hot boundary temperature, upper end of the map colour scale [°C]
    pub hot_temperature: f64,
    /// Whether the simulation also dumped centre-column profiles
    #[serde(default)]
    pub column_profiles: bool,
}

/// Grid and schedule of the simulation run being plotted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Grid side N (the grid is N x N)
    pub grid_size: usize,
    pub max_iter: u32,
    /// A temperature map is dumped every this many iterations
    pub map_interval: u32,
    /// Cold/ambient temperature, lower end of the map colour scale [°C]
    pub ambient_temperature: f64,
    pub configs: Vec<HeatConfig>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            grid_size: 1024,
            max_iter: 10_000,
            map_interval: 1000,
            ambient_temperature: 15.0,
            configs: vec![
                HeatConfig {
                    label: "A".to_string(),
                    hot_temperature: 250.0,
                    column_profiles: false,
                },
                HeatConfig {
                    label: "B".to_string(),
                    hot_temperature: 540.0,
                    column_profiles: true,
                },
            ],
        }
    }
}

impl SimulationParams {
    /// Load parameters from a JSON file; missing fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;
        let params: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid parameter file: {}", path.display()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            anyhow::bail!("grid_size must be positive");
        }
        if self.grid_size > MAX_GRID_SIZE {
            anyhow::bail!("grid_size {} exceeds {}", self.grid_size, MAX_GRID_SIZE);
        }
        if self.max_iter == 0 {
            anyhow::bail!("max_iter must be positive");
        }
        if self.map_interval == 0 {
            anyhow::bail!("map_interval must be positive");
        }
        Ok(())
    }

    /// Index of the centre row/column whose profiles are dumped
    pub fn line_index(&self) -> usize {
        self.grid_size / 2
    }

    /// Iterations with dumped profiles: start, quarter, half, last
    pub fn profile_iterations(&self) -> Vec<u32> {
        let m = self.max_iter;
        let mut iters = vec![0, m / 4, m / 2, m.saturating_sub(1)];
        iters.dedup();
        iters
    }

    /// Iterations with dumped maps: interval, 2*interval, ..., up to max_iter
    pub fn map_iterations(&self) -> Vec<u32> {
        if self.map_interval == 0 {
            return Vec::new();
        }
        (self.map_interval..=self.max_iter)
            .step_by(self.map_interval as usize)
            .collect()
    }

    pub fn config(&self, label: &str) -> Option<&HeatConfig> {
        self.configs.iter().find(|c| c.label == label)
    }

    /// Keep only the configurations named in `labels` (all if empty)
    pub fn retain_configs(&mut self, labels: &[String]) {
        if !labels.is_empty() {
            self.configs.retain(|c| labels.contains(&c.label));
        }
    }
}
