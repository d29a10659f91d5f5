//! In-memory reader and directory fixtures for loader/averager tests.

use ndarray::{Array1, Array2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use crate::extent::GridExtent;
use crate::projection::ProjectionDescriptor;
use crate::readers::{DatasetReader, ReadError, SicDataset};

pub const SPATIAL_REF: &str = r#"PROJCS["NSIDC Sea Ice Polar Stereographic North",GEOGCS["Hughes 1980"],PROJECTION["Polar_Stereographic"],PARAMETER["latitude_of_origin",70],PARAMETER["central_meridian",-45]]"#;

/// Serves datasets by file name and records every read.
#[derive(Debug, Default)]
pub struct FakeReader {
    datasets: HashMap<String, Array2<f64>>,
    pub reads: RefCell<Vec<PathBuf>>,
    /// Serve datasets whose grid boundaries were unusable.
    pub without_extent: bool,
}

impl FakeReader {
    pub fn insert(&mut self, file_name: &str, concentration: Array2<f64>) {
        self.datasets.insert(file_name.to_string(), concentration);
    }
}

impl DatasetReader for FakeReader {
    fn read_dataset(&self, path: &Path) -> Result<SicDataset, ReadError> {
        self.reads.borrow_mut().push(path.to_path_buf());

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let concentration = self
            .datasets
            .get(name)
            .cloned()
            .ok_or_else(|| ReadError::InvalidFormat(format!("no fixture for {}", name)))?;

        let (rows, cols) = concentration.dim();
        let x = Array1::from_shape_fn(cols, |j| j as f64 * 25000.0);
        let y = Array1::from_shape_fn(rows, |i| i as f64 * -25000.0);
        let (a, b) = (6378273.0, 6356889.449);
        let projection = ProjectionDescriptor::new(SPATIAL_REF.to_string(), a, b, 70.0, -45.0)?;
        let extent = if self.without_extent {
            None
        } else {
            let extent = GridExtent::new(-3850000.0, 3750000.0, 5850000.0, -5350000.0)
                .map_err(ReadError::InvalidFormat)?;
            Some(extent)
        };

        Ok(
            SicDataset::new(path.to_path_buf(), x, y, concentration, projection, extent)?
                .with_time(Some("0".to_string())),
        )
    }
}

pub fn file_name(year: i32, month: u32) -> String {
    format!("seaice_conc_monthly_nh_{}{:02}_f13_v04r00.nc", year, month)
}

/// Temporary directory holding one (empty) file per entry plus a reader
/// that serves the given concentrations for them.
pub fn sic_dir(entries: &[(i32, u32, Array2<f64>)]) -> (TempDir, FakeReader) {
    let dir = tempdir().unwrap();
    let mut reader = FakeReader::default();

    for (year, month, concentration) in entries {
        let name = file_name(*year, *month);
        File::create(dir.path().join(&name)).unwrap();
        reader.insert(&name, concentration.clone());
    }

    (dir, reader)
}
