//! CSV records produced by the systolic-array benchmark runs.

use crate::error::{DataError, DataResult};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

/// One massif peak-heap measurement
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeapSample {
    #[serde(rename = "MATRIX_SIZE", alias = "matrix_size")]
    pub matrix_size: u32,
    #[serde(rename = "PROCS", alias = "processes")]
    pub processes: u32,
    #[serde(rename = "RANK", alias = "rank", default)]
    pub rank: Option<u32>,
    #[serde(rename = "PEAK_HEAP_BYTES", alias = "peak_heap_bytes")]
    pub peak_heap_bytes: f64,
}

/// One timed benchmark run with its resource usage
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerfSample {
    #[serde(alias = "PROCS")]
    pub processes: u32,
    #[serde(alias = "MATRIX_SIZE", alias = "matrix size")]
    pub matrix_size: u32,
    pub elapsed_time_sec: f64,
    #[serde(default)]
    pub user_cpu_sec: Option<f64>,
    #[serde(default)]
    pub sys_cpu_sec: Option<f64>,
    #[serde(default)]
    pub max_rss_kb: Option<f64>,
    #[serde(rename = "#context_switch", alias = "context_switch", default)]
    pub context_switches: Option<f64>,
}

/// Deserialize every row of a headed CSV file.
///
/// Returns `Ok(None)` when the file does not exist. Unknown columns are ignored.
pub fn read_csv<T, P>(path: P) -> DataResult<Option<Vec<T>>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = match ReaderBuilder::new().trim(Trim::All).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            if let csv::ErrorKind::Io(io) = e.kind() {
                if io.kind() == ErrorKind::NotFound {
                    return Ok(None);
                }
            }
            return Err(DataError::Csv {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    reader
        .deserialize()
        .map(|row| {
            row.map_err(|source| DataError::Csv {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect::<DataResult<Vec<T>>>()
        .map(Some)
}
