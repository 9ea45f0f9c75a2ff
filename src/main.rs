//! perfplot - plots and scaling tables for heat-diffusion and systolic-array runs.
//!
//! Reads the text dumps of the heat-diffusion simulation, thread-count timing
//! tables, massif heap summaries and benchmark performance logs, averages
//! them, prints tables and writes charts.

mod chart;
mod config;
mod error;
mod exec_time;
mod heat;
mod report;
mod scaling;
mod stats;
mod systolic;
mod table;

use anyhow::Result;
use chart::ImageFormat;
use clap::{Args, Parser, Subcommand};
use config::SimulationParams;
use report::RunReport;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Plotting and scaling analysis for simulation and benchmark output
#[derive(Parser, Debug)]
#[command(name = "perfplot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image format for generated charts
    #[arg(short, long, value_enum, default_value_t = ImageFormat::Svg, global = true)]
    format: ImageFormat,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Temperature profiles, centre-point evolution and heat maps
    Temp(TempArgs),

    /// Execution time and speedup against thread count for one configuration
    ExecTime {
        /// Table of `Num_Threads Execution_Time_Seconds`
        file: PathBuf,

        /// Configuration label used in titles and file names
        config: String,

        /// Directory for generated charts
        #[arg(short, long, default_value = "graphs")]
        output_dir: PathBuf,
    },

    /// Average peak heap per process count, one line per matrix size
    Heap {
        /// massif summary CSV
        input: PathBuf,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Matrix size printed as its own table
        #[arg(long, default_value = "500")]
        focus_size: u32,
    },

    /// Peak heap of rank 0 against the other ranks
    HeapRanks {
        /// massif summary CSV with a RANK column
        input: PathBuf,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// One chart per resource metric of the performance log
    PerfLog {
        /// Performance log CSV
        input: PathBuf,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Matrix size printed as its own table
        #[arg(long, default_value = "500")]
        focus_size: u32,
    },

    /// Speedup and efficiency against process count
    Speedup {
        /// Performance log CSV
        input: PathBuf,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TempArgs {
    /// Directory holding the simulation dumps
    #[arg(short, long, default_value = ".")]
    input_dir: PathBuf,

    /// Directory for generated charts
    #[arg(short, long, default_value = "graphs")]
    output_dir: PathBuf,

    /// JSON file with simulation parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// Grid side length N
    #[arg(long)]
    grid_size: Option<usize>,

    /// Number of simulated iterations
    #[arg(long)]
    max_iter: Option<u32>,

    /// Iterations between dumped maps
    #[arg(long)]
    map_interval: Option<u32>,

    /// Only plot these configurations (e.g. A, B)
    #[arg(long, value_delimiter = ',')]
    configs: Vec<String>,
}

impl TempArgs {
    fn simulation_params(&self) -> Result<SimulationParams> {
        let mut params = match &self.params {
            Some(path) => SimulationParams::load(path)?,
            None => SimulationParams::default(),
        };
        if let Some(n) = self.grid_size {
            params.grid_size = n;
        }
        if let Some(m) = self.max_iter {
            params.max_iter = m;
        }
        if let Some(i) = self.map_interval {
            params.map_interval = i;
        }
        for label in &self.configs {
            if params.config(label).is_none() {
                warn!("Unknown configuration {}, ignoring", label);
            }
        }
        params.retain_configs(&self.configs);
        params.validate()?;
        if params.configs.is_empty() {
            anyhow::bail!("No configuration matches {:?}", self.configs);
        }
        Ok(params)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<RunReport> {
    let format = cli.format.resolve();
    match cli.command {
        Command::Temp(args) => {
            let params = args.simulation_params()?;
            debug!("Simulation parameters: {:?}", params);
            heat::plot::run(&params, &args.input_dir, &args.output_dir, format)
        }
        Command::ExecTime {
            file,
            config,
            output_dir,
        } => Ok(exec_time::run(&file, &config, &output_dir, format)),
        Command::Heap {
            input,
            output_dir,
            focus_size,
        } => systolic::heap::run_heap(&input, &output_dir, focus_size, format),
        Command::HeapRanks { input, output_dir } => {
            systolic::heap::run_heap_ranks(&input, &output_dir, format)
        }
        Command::PerfLog {
            input,
            output_dir,
            focus_size,
        } => systolic::perf::run(&input, &output_dir, focus_size, format),
        Command::Speedup { input, output_dir } => systolic::speedup::run(&input, &output_dir, format),
    }
}

/// Usage errors exit with 1, `--help` and `--version` with 0
fn exit_code(e: &clap::Error) -> i32 {
    if e.use_stderr() {
        1
    } else {
        0
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_code(&e));
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(report) => debug!(
            "{} saved, {} skipped, {} failed",
            report.saved.len(),
            report.skipped,
            report.failed
        ),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exec_time_needs_two_arguments() {
        assert!(Cli::try_parse_from(["perfplot", "exec-time", "exec.txt"]).is_err());
        let cli = Cli::try_parse_from(["perfplot", "exec-time", "exec.txt", "configA"]).unwrap();
        match cli.command {
            Command::ExecTime { config, output_dir, .. } => {
                assert_eq!(config, "configA");
                assert_eq!(output_dir, PathBuf::from("graphs"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = Cli::try_parse_from(["perfplot", "exec-time", "x.txt"]).unwrap_err();
        assert_eq!(exit_code(&err), 1);
        let help = Cli::try_parse_from(["perfplot", "--help"]).unwrap_err();
        assert_eq!(exit_code(&help), 0);
    }

    #[test]
    fn test_temp_overrides() {
        let cli = Cli::try_parse_from([
            "perfplot", "temp", "--grid-size", "64", "--max-iter", "100", "--configs", "B",
        ])
        .unwrap();
        let Command::Temp(args) = cli.command else {
            panic!("expected temp");
        };
        let params = args.simulation_params().unwrap();
        assert_eq!(params.grid_size, 64);
        assert_eq!(params.max_iter, 100);
        assert_eq!(params.map_interval, 1000);
        assert_eq!(params.configs.len(), 1);
        assert_eq!(params.configs[0].label, "B");
    }

    #[test]
    fn test_unknown_config_rejected() {
        let cli = Cli::try_parse_from(["perfplot", "temp", "--configs", "Z"]).unwrap();
        let Command::Temp(args) = cli.command else {
            panic!("expected temp");
        };
        assert!(args.simulation_params().is_err());
    }

    #[test]
    fn test_global_format_flag() {
        let cli = Cli::try_parse_from(["perfplot", "speedup", "perf.csv", "--format", "png"]).unwrap();
        assert_eq!(cli.format, ImageFormat::Png);
    }
}
