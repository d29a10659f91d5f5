//! NASA ocean-colour (chlorophyll-a) L3 mapped files.
//!
//! Longitudes are moved from [-180, 180) to [0, 360) so the Bering Sea is not
//! split at the dateline, then a fixed column window is kept. The window
//! assumes the 4 km global grid (8640 columns).

use gdal::Dataset;
use ndarray::{Array1, Array2, Axis};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::readers::{ReadError, netcdf_subdataset};

/// Columns kept after the longitude shift.
pub const LON_WINDOW: Range<usize> = 3500..6000;

#[derive(Debug, Clone)]
pub struct ChlorData {
    pub path: PathBuf,
    /// Longitude mesh in [0, 360), `(lat.len(), window.len())`.
    pub lons: Array2<f64>,
    pub lats: Array2<f64>,
    /// Chlorophyll-a in mg m^-3, fill values as NaN.
    pub chlor_a: Array2<f64>,
}

pub fn grab_chlor(path: &Path) -> Result<ChlorData, ReadError> {
    gdal::config::set_config_option("GDAL_NETCDF_BOTTOMUP", "NO")?;

    let lon = read_axis(path, "lon")?;
    let lat = read_axis(path, "lat")?;

    let dataset = Dataset::open(netcdf_subdataset(path, "chlor_a"))?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let fill = band.no_data_value();
    let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
    let values: Vec<f64> = buffer
        .data()
        .iter()
        .map(|&v| if fill == Some(v) { f64::NAN } else { v })
        .collect();
    let chlor_a = Array2::from_shape_vec((height, width), values)?;
    debug!(path = %path.display(), width, height, "read chlor_a");

    let (lons, lats, chlor_a) = shift_and_crop(&lon, &lat, &chlor_a, LON_WINDOW)?;

    Ok(ChlorData {
        path: path.to_path_buf(),
        lons,
        lats,
        chlor_a,
    })
}

fn read_axis(path: &Path, variable: &str) -> Result<Array1<f64>, ReadError> {
    let dataset = Dataset::open(netcdf_subdataset(path, variable))?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
    Ok(Array1::from_vec(buffer.data().to_vec()))
}

/// Maps negative longitudes to `lon + 360` and returns the shifted axis in
/// ascending order along with the column permutation that sorts it.
pub fn shift_longitudes(lon: &Array1<f64>) -> (Array1<f64>, Vec<usize>) {
    let shifted = lon.mapv(|l| if l < 0.0 { l + 360.0 } else { l });

    let mut order: Vec<usize> = (0..shifted.len()).collect();
    order.sort_by(|&a, &b| shifted[a].total_cmp(&shifted[b]));

    let sorted = order.iter().map(|&i| shifted[i]).collect();
    (sorted, order)
}

/// Shifts and sorts longitudes, reorders `data` columns to match, keeps
/// `window` columns and builds the lon/lat meshes.
pub fn shift_and_crop(
    lon: &Array1<f64>,
    lat: &Array1<f64>,
    data: &Array2<f64>,
    window: Range<usize>,
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>), ReadError> {
    if data.dim() != (lat.len(), lon.len()) {
        return Err(ReadError::InvalidFormat(format!(
            "chlor_a shape {:?} does not match (lat, lon) = ({}, {})",
            data.dim(),
            lat.len(),
            lon.len()
        )));
    }
    if window.end > lon.len() || window.start >= window.end {
        return Err(ReadError::InvalidFormat(format!(
            "longitude window {:?} does not fit {} columns",
            window,
            lon.len()
        )));
    }

    let (sorted, order) = shift_longitudes(lon);
    let kept = &order[window.clone()];

    let lon = sorted.slice(ndarray::s![window]).to_owned();
    let data = data.select(Axis(1), kept);

    let shape = (lat.len(), lon.len());
    let lons = Array2::from_shape_fn(shape, |(_, j)| lon[j]);
    let lats = Array2::from_shape_fn(shape, |(i, _)| lat[i]);

    Ok((lons, lats, data))
}
