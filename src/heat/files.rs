//! File naming and loaders for profile and point-evolution dumps.

use crate::error::DataResult;
use crate::table::load_table;
use std::path::{Path, PathBuf};

/// Which centre line a profile follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    /// Letter used in dump file names
    pub fn code(self) -> char {
        match self {
            Axis::Row => 'r',
            Axis::Column => 'c',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Column => "col",
        }
    }
}

pub fn profile_file_name(config: &str, axis: Axis, line_index: usize, iteration: u32) -> String {
    format!(
        "temp_profile_config{}_{}{}_iter{}.txt",
        config,
        axis.code(),
        line_index,
        iteration
    )
}

pub fn point_evolution_file_name(config: &str) -> String {
    format!("point_evolution_config{}.txt", config)
}

pub fn map_file_name(config: &str, iteration: u32) -> String {
    format!("temp_map_config{}_iter{}.txt", config, iteration)
}

/// Ordered `(x, temperature)` pairs: a line profile or a point-evolution trace
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub path: PathBuf,
    pub points: Vec<(f64, f64)>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn load_trace(path: &Path) -> DataResult<Option<Trace>> {
    let Some(table) = load_table(path)? else {
        return Ok(None);
    };
    Ok(Some(Trace {
        path: path.to_path_buf(),
        points: table.pairs(0, 1)?,
    }))
}

/// Load a centre-line profile as `(index, temperature)` pairs
pub fn load_profile(
    dir: &Path,
    config: &str,
    axis: Axis,
    line_index: usize,
    iteration: u32,
) -> DataResult<Option<Trace>> {
    load_trace(&dir.join(profile_file_name(config, axis, line_index, iteration)))
}

/// Load the centre-point trace as `(iteration, temperature)` pairs
pub fn load_point_trace(dir: &Path, config: &str) -> DataResult<Option<Trace>> {
    load_trace(&dir.join(point_evolution_file_name(config)))
}
