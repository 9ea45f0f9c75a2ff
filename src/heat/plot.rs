//! Profile overlays, centre-temperature trace and heat maps for each configuration.

use super::files::{
    load_point_trace, load_profile, map_file_name, point_evolution_file_name, profile_file_name, Axis,
    Trace,
};
use super::map::load_map;
use crate::chart::{cycle_color, render, Chart, HeatMapChart, ImageFormat, LineChart, Series, TAB10};
use crate::config::{HeatConfig, SimulationParams};
use crate::report::RunReport;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Heat maps larger than this are block-averaged before drawing
const MAX_MAP_CELLS_PER_SIDE: usize = 256;

/// Generates every heat-diffusion chart for a set of configurations
pub struct HeatPlotter<'a> {
    params: &'a SimulationParams,
    input_dir: PathBuf,
    output_dir: PathBuf,
    format: ImageFormat,
}

impl<'a> HeatPlotter<'a> {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        params: &'a SimulationParams,
        input_dir: P,
        output_dir: Q,
        format: ImageFormat,
    ) -> Self {
        Self {
            params,
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            format,
        }
    }

    /// Run profiles, centre trace and maps for every configuration
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        for config in &self.params.configs {
            report.merge(self.plot_profiles(config));
            report.merge(self.plot_center_temperature(config));
            report.merge(self.plot_maps(config));
        }
        info!(
            "All plots generated and saved in '{}' ({} saved, {} skipped, {} failed)",
            self.output_dir.display(),
            report.saved.len(),
            report.skipped,
            report.failed
        );
        report
    }

    /// Load one profile, logging and returning `None` for missing or bad files
    fn profile(&self, config: &str, axis: Axis, iteration: u32) -> Option<Trace> {
        let line = self.params.line_index();
        match load_profile(&self.input_dir, config, axis, line, iteration) {
            Ok(Some(trace)) => {
                debug!("Loaded {} points from {}", trace.len(), trace.path.display());
                Some(trace)
            }
            Ok(None) => {
                warn!("Missing file: {}", profile_file_name(config, axis, line, iteration));
                None
            }
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    fn save(&self, chart: &impl Chart, stem: &str, report: &mut RunReport) {
        match render(chart, &self.output_dir, stem, self.format) {
            Ok(path) => report.record_saved(path),
            Err(e) => {
                error!("Error generating {}: {:#}", stem, e);
                report.record_failed();
            }
        }
    }

    /// Overlay one line per sampled iteration along an axis
    fn overlay(&self, config: &HeatConfig, axis: Axis) -> LineChart {
        let (title, x_desc) = match axis {
            Axis::Row => ("Center Row", "Column Index"),
            Axis::Column => ("Center Column", "Row Index"),
        };
        let mut chart = LineChart::new(
            format!("Temperature Profile Along {} (Config {})", title, config.label),
            x_desc,
            "Temperature [°C]",
        );
        for (idx, iteration) in self.params.profile_iterations().into_iter().enumerate() {
            let trace = self.profile(&config.label, axis, iteration);
            if let Some(trace) = trace.filter(|t| !t.is_empty()) {
                chart.push(
                    Series::new(trace.points)
                        .label(format!("Iteration {}", iteration))
                        .color(cycle_color(&TAB10, idx)),
                );
            }
        }
        chart
    }

    pub fn plot_profiles(&self, config: &HeatConfig) -> RunReport {
        info!("Plotting temperature profiles for configuration {}...", config.label);
        let mut report = RunReport::default();

        let mut axes = vec![Axis::Row];
        if config.column_profiles {
            axes.push(Axis::Column);
        }
        for axis in axes {
            let chart = self.overlay(config, axis);
            let stem = format!("temp_profile_{}_config{}", axis.name(), config.label);
            if chart.is_empty() {
                warn!("No {} profiles found for configuration {}, skipping {}", axis.name(), config.label, stem);
                report.record_skipped();
                continue;
            }
            self.save(&chart, &stem, &mut report);
        }

        if config.column_profiles {
            for iteration in self.params.profile_iterations() {
                let row = self.profile(&config.label, Axis::Row, iteration);
                let col = self.profile(&config.label, Axis::Column, iteration);
                let (Some(row), Some(col)) = (row, col) else {
                    report.record_skipped();
                    continue;
                };
                let chart = LineChart::new(
                    format!("Temperature Profiles at Iteration {} (Config {})", iteration, config.label),
                    "Grid Index",
                    "Temperature [°C]",
                )
                .with_series(Series::new(row.points).label("Center Row").color(TAB10[0]))
                .with_series(Series::new(col.points).label("Center Column").color(TAB10[1]));
                let stem = format!("temp_profile_row_col_config{}_iter{}", config.label, iteration);
                self.save(&chart, &stem, &mut report);
            }
        }

        report
    }

    pub fn plot_center_temperature(&self, config: &HeatConfig) -> RunReport {
        let mut report = RunReport::default();
        let trace = match load_point_trace(&self.input_dir, &config.label) {
            Ok(Some(trace)) => trace,
            Ok(None) => {
                warn!(
                    "Missing center temperature file: {}",
                    point_evolution_file_name(&config.label)
                );
                report.record_skipped();
                return report;
            }
            Err(e) => {
                error!("{}", e);
                report.record_skipped();
                return report;
            }
        };

        let chart = LineChart::new(
            format!("Temperature Evolution at Grid Center (Config {})", config.label),
            "Iteration",
            "Temperature [°C]",
        )
        .with_series(Series::new(trace.points));
        self.save(&chart, &format!("center_temperature_config{}", config.label), &mut report);
        report
    }

    pub fn plot_maps(&self, config: &HeatConfig) -> RunReport {
        info!("Plotting temperature maps for configuration {}...", config.label);
        let mut report = RunReport::default();
        let size = self.params.grid_size;

        for iteration in self.params.map_iterations() {
            let name = map_file_name(&config.label, iteration);
            let map = match load_map(self.input_dir.join(&name), size) {
                Ok(Some(map)) => map,
                Ok(None) => {
                    warn!("Map file not found: {}", name);
                    report.record_skipped();
                    continue;
                }
                Err(e) => {
                    error!("{}", e);
                    report.record_skipped();
                    continue;
                }
            };

            let view = map.downsample(MAX_MAP_CELLS_PER_SIDE);
            debug!("{}: drawing {}x{} cells", name, view.side(), view.side());
            let extent = view.extent() as f64;
            let chart = HeatMapChart::new(
                format!("Temperature Map (Config {}, Iteration {})", config.label, iteration),
                (extent, extent),
                (self.params.ambient_temperature, config.hot_temperature),
                view.heat_cells(),
            )
            .colorbar_desc("Temperature [°C]");
            let stem = format!("temp_map_config{}_iter{}", config.label, iteration);
            self.save(&chart, &stem, &mut report);
        }

        report
    }
}

/// Convenience entry used by the CLI
pub fn run(params: &SimulationParams, input_dir: &Path, output_dir: &Path, format: ImageFormat) -> Result<RunReport> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    Ok(HeatPlotter::new(params, input_dir, output_dir, format).run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::fs;
    use tempfile::TempDir;

    fn small_params() -> SimulationParams {
        SimulationParams {
            grid_size: 4,
            max_iter: 8,
            map_interval: 4,
            ..Default::default()
        }
    }

    fn write_profile(dir: &Path, config: &str, axis: Axis, iteration: u32) {
        let mut text = String::from("Index Temperature\n");
        for i in 0..4 {
            writeln!(text, "{} {:.4}", i, 15.0 + i as f64 * iteration as f64).unwrap();
        }
        fs::write(dir.join(profile_file_name(config, axis, 2, iteration)), text).unwrap();
    }

    fn write_map(dir: &Path, config: &str, iteration: u32, rows: usize) {
        let mut text = String::from("Row Column Temperature\n");
        for k in 0..rows {
            writeln!(text, "{} {} {:.4}", k / 4, k % 4, 15.0 + k as f64).unwrap();
        }
        fs::write(dir.join(map_file_name(config, iteration)), text).unwrap();
    }

    #[test]
    fn test_missing_inputs_are_skipped() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let params = small_params();
        let report = run(&params, input.path(), output.path(), ImageFormat::Svg).unwrap();
        assert!(report.saved.is_empty());
        assert_eq!(report.failed, 0);
        assert!(report.skipped > 0);
    }

    #[test]
    fn test_profiles_partial_series() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let params = small_params();
        // Only two of the four sampled iterations exist
        write_profile(input.path(), "A", Axis::Row, 0);
        write_profile(input.path(), "A", Axis::Row, 4);

        let plotter = HeatPlotter::new(&params, input.path(), output.path(), ImageFormat::Svg);
        let report = plotter.plot_profiles(params.config("A").unwrap());
        assert_eq!(report.saved.len(), 1);
        assert!(output.path().join("temp_profile_row_configA.svg").exists());
    }

    #[test]
    fn test_row_and_column_profiles_for_b() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let params = small_params();
        write_profile(input.path(), "B", Axis::Row, 2);
        write_profile(input.path(), "B", Axis::Column, 2);
        write_profile(input.path(), "B", Axis::Row, 7);

        let plotter = HeatPlotter::new(&params, input.path(), output.path(), ImageFormat::Svg);
        let report = plotter.plot_profiles(params.config("B").unwrap());
        assert!(output.path().join("temp_profile_row_configB.svg").exists());
        assert!(output.path().join("temp_profile_col_configB.svg").exists());
        assert!(output.path().join("temp_profile_row_col_configB_iter2.svg").exists());
        assert!(!output.path().join("temp_profile_row_col_configB_iter7.svg").exists());
        assert_eq!(report.saved.len(), 3);
    }

    #[test]
    fn test_center_temperature() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let params = small_params();
        fs::write(
            input.path().join("point_evolution_configA.txt"),
            "Iteration Temp_Center\n0 15.0\n1 15.5\n2 16.1\n",
        )
        .unwrap();
        let plotter = HeatPlotter::new(&params, input.path(), output.path(), ImageFormat::Svg);
        let report = plotter.plot_center_temperature(params.config("A").unwrap());
        assert_eq!(report.saved.len(), 1);
        assert!(output.path().join("center_temperature_configA.svg").exists());
    }

    #[test]
    fn test_maps_skip_wrong_size_and_continue() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let params = small_params();
        write_map(input.path(), "A", 4, 15);
        write_map(input.path(), "A", 8, 16);

        let plotter = HeatPlotter::new(&params, input.path(), output.path(), ImageFormat::Svg);
        let report = plotter.plot_maps(params.config("A").unwrap());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.saved.len(), 1);
        assert!(!output.path().join("temp_map_configA_iter4.svg").exists());
        assert!(output.path().join("temp_map_configA_iter8.svg").exists());
    }
}
