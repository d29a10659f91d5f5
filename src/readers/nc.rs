use gdal::{Dataset, Metadata};
use ndarray::{Array1, Array2};
use std::path::Path;
use tracing::{debug, warn};

use super::utils::netcdf_subdataset;
use super::{DatasetReader, ReadError, SicDataset};
use crate::extent::GridExtent;
use crate::projection::ProjectionDescriptor;

/// Reads NSIDC-style monthly SIC NetCDF files through GDAL subdatasets.
///
/// Variable attributes show up in GDAL metadata as `variable#attribute`.
#[derive(Debug, Clone)]
pub struct NcReader {
    pub concentration_variable: String,
    pub x_variable: String,
    pub y_variable: String,
    pub projection_variable: String,
}

impl Default for NcReader {
    fn default() -> Self {
        Self {
            concentration_variable: "cdr_seaice_conc_monthly".to_string(),
            x_variable: "xgrid".to_string(),
            y_variable: "ygrid".to_string(),
            projection_variable: "projection".to_string(),
        }
    }
}

impl NcReader {
    fn open(&self, path: &Path, variable: &str) -> Result<Dataset, ReadError> {
        // Keep rows in file order so they line up with the y axis variable.
        gdal::config::set_config_option("GDAL_NETCDF_BOTTOMUP", "NO")?;
        Ok(Dataset::open(netcdf_subdataset(path, variable))?)
    }

    fn read_axis(&self, path: &Path, variable: &str) -> Result<Array1<f64>, ReadError> {
        let dataset = self.open(path, variable)?;
        let (width, height) = dataset.raster_size();
        let band = dataset.rasterband(1)?;
        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

        Ok(Array1::from_vec(buffer.data().to_vec()))
    }

    /// First band (time slice) with `scale_factor`/`add_offset` applied.
    fn read_concentration(
        &self,
        dataset: &Dataset,
    ) -> Result<(Array2<f64>, Option<String>), ReadError> {
        let (width, height) = dataset.raster_size();
        let band = dataset.rasterband(1)?;
        let time = band.metadata_item("NETCDF_DIM_time", "");

        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let values = decode(buffer.data(), band.scale(), band.offset());

        Ok((Array2::from_shape_vec((height, width), values)?, time))
    }

    fn attribute(&self, dataset: &Dataset, path: &Path, name: &str) -> Result<String, ReadError> {
        let key = format!("{}#{}", self.projection_variable, name);
        let value = dataset.metadata_item(&key, "");
        required(path, key, value)
    }

    fn numeric_attribute(
        &self,
        dataset: &Dataset,
        path: &Path,
        name: &str,
    ) -> Result<f64, ReadError> {
        let raw = self.attribute(dataset, path, name)?;
        numeric(path, name, raw)
    }

    /// Grid boundaries from the projection attributes. Unordered or
    /// non-finite boundaries only cost the extent, not the whole load.
    fn read_extent(&self, dataset: &Dataset, path: &Path) -> Result<Option<GridExtent>, ReadError> {
        Ok(checked_extent(
            path,
            self.numeric_attribute(dataset, path, "grid_boundary_left_projected_x")?,
            self.numeric_attribute(dataset, path, "grid_boundary_right_projected_x")?,
            self.numeric_attribute(dataset, path, "grid_boundary_top_projected_y")?,
            self.numeric_attribute(dataset, path, "grid_boundary_bottom_projected_y")?,
        ))
    }
}

/// Applies CF `scale_factor`/`add_offset` to raw stored values. Fill and
/// flag codes are decoded like any other value.
pub fn decode(raw: &[f64], scale: Option<f64>, offset: Option<f64>) -> Vec<f64> {
    let scale = scale.unwrap_or(1.0);
    let offset = offset.unwrap_or(0.0);
    raw.iter().map(|&v| v * scale + offset).collect()
}

/// Parses a numeric attribute as GDAL prints it. Array-valued attributes
/// come wrapped in braces (`{70}`).
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim_matches(|c: char| c == '{' || c == '}' || c.is_whitespace())
        .parse::<f64>()
        .ok()
}

fn required(path: &Path, key: String, value: Option<String>) -> Result<String, ReadError> {
    value.ok_or_else(|| ReadError::MissingAttribute {
        path: path.to_path_buf(),
        name: key,
    })
}

fn numeric(path: &Path, name: &str, raw: String) -> Result<f64, ReadError> {
    parse_numeric(&raw).ok_or_else(|| ReadError::InvalidAttribute {
        path: path.to_path_buf(),
        name: name.to_string(),
        value: raw,
    })
}

fn checked_extent(path: &Path, left: f64, right: f64, top: f64, bottom: f64) -> Option<GridExtent> {
    match GridExtent::new(left, right, top, bottom) {
        Ok(extent) => {
            debug!(extent = ?extent.as_image_extent(), "grid extent");
            Some(extent)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring grid extent");
            None
        }
    }
}

impl DatasetReader for NcReader {
    fn read_dataset(&self, path: &Path) -> Result<SicDataset, ReadError> {
        let dataset = self.open(path, &self.concentration_variable)?;
        let (concentration, time) = self.read_concentration(&dataset)?;
        debug!(path = %path.display(), time = ?time, "read concentration slice");

        let projection = ProjectionDescriptor::new(
            self.attribute(&dataset, path, "spatial_ref")?,
            self.numeric_attribute(&dataset, path, "semimajor_radius")?,
            self.numeric_attribute(&dataset, path, "semiminor_radius")?,
            self.numeric_attribute(&dataset, path, "standard_parallel")?,
            self.numeric_attribute(&dataset, path, "longitude_of_projection_origin")?,
        )?;
        debug!(
            projection = %projection.projection_name,
            standard_parallel = projection.standard_parallel,
            longitude_of_projection_origin = projection.longitude_of_projection_origin,
            "parsed projection"
        );

        let extent = self.read_extent(&dataset, path)?;

        let x = self.read_axis(path, &self.x_variable)?;
        let y = self.read_axis(path, &self.y_variable)?;

        let record = SicDataset::new(path.to_path_buf(), x, y, concentration, projection, extent)?;
        Ok(record.with_time(time))
    }
}
