//! Square temperature grids reshaped from `Row Column Temperature` dumps.

use crate::chart::HeatCell;
use crate::error::{DataError, DataResult};
use crate::table::{load_table, NumericTable};
use std::path::Path;

/// Temperatures on a square grid, row-major, row 0 at the bottom.
///
/// A map may be a block-averaged view of a larger grid: each cell then covers
/// `span` x `span` original cells, clipped at `extent`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureMap {
    side: usize,
    span: usize,
    extent: usize,
    cells: Vec<f64>,
}

impl TemperatureMap {
    /// Reshape the temperature column of a dump into a `size` x `size` grid
    pub fn from_table(table: &NumericTable, size: usize) -> DataResult<Self> {
        if size.checked_mul(size) != Some(table.len()) {
            return Err(DataError::GridSize {
                path: table.path().to_path_buf(),
                side: size,
                found: table.len(),
            });
        }
        Ok(Self {
            side: size,
            span: 1,
            extent: size,
            cells: table.column(2)?,
        })
    }

    /// Number of cells along one side
    pub fn side(&self) -> usize {
        self.side
    }

    /// Side of the original grid
    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.side + col]
    }

    /// Block-average so that no side has more than `max_side` cells.
    pub fn downsample(&self, max_side: usize) -> TemperatureMap {
        let max_side = max_side.max(1);
        if self.side <= max_side {
            return self.clone();
        }
        let block = self.side.div_ceil(max_side);
        let side = self.side.div_ceil(block);
        let mut cells = Vec::with_capacity(side * side);

        for br in 0..side {
            for bc in 0..side {
                let rows = br * block..((br + 1) * block).min(self.side);
                let cols = bc * block..((bc + 1) * block).min(self.side);
                let count = rows.len() * cols.len();
                let sum: f64 = rows
                    .flat_map(|r| cols.clone().map(move |c| (r, c)))
                    .map(|(r, c)| self.get(r, c))
                    .sum();
                cells.push(sum / count as f64);
            }
        }

        TemperatureMap {
            side,
            span: self.span * block,
            extent: self.extent,
            cells,
        }
    }

    /// Cells in data coordinates spanning `[0, extent]` on both axes
    pub fn heat_cells(&self) -> Vec<HeatCell> {
        let extent = self.extent as f64;
        let edge = |i: usize| ((i * self.span) as f64).min(extent);
        let mut out = Vec::with_capacity(self.cells.len());
        for row in 0..self.side {
            for col in 0..self.side {
                out.push(HeatCell {
                    x: (edge(col), edge(col + 1)),
                    y: (edge(row), edge(row + 1)),
                    value: self.get(row, col),
                });
            }
        }
        out
    }
}

/// Load and reshape a map dump. `Ok(None)` when the file does not exist.
pub fn load_map<P: AsRef<Path>>(path: P, size: usize) -> DataResult<Option<TemperatureMap>> {
    match load_table(path)? {
        Some(table) => TemperatureMap::from_table(&table, size).map(Some),
        None => Ok(None),
    }
}
