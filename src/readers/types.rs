use ndarray::{Array1, Array2};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extent::GridExtent;
use crate::projection::{ProjectionDescriptor, ProjectionError};

/// Opens a raw SIC file. Implemented over GDAL by [`super::NcReader`].
pub trait DatasetReader {
    fn read_dataset(&self, path: &Path) -> Result<SicDataset, ReadError>;
}

impl<R: DatasetReader + ?Sized> DatasetReader for &R {
    fn read_dataset(&self, path: &Path) -> Result<SicDataset, ReadError> {
        (**self).read_dataset(path)
    }
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
    #[error("{path}: missing attribute {name}")]
    MissingAttribute { path: PathBuf, name: String },
    #[error("{path}: attribute {name} is not a number: {value:?}")]
    InvalidAttribute {
        path: PathBuf,
        name: String,
        value: String,
    },
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),
}

/// Contents of one monthly SIC file.
#[derive(Debug, Clone)]
pub struct SicDataset {
    pub path: PathBuf,
    /// 1-D projected x axis (columns).
    pub x: Array1<f64>,
    /// 1-D projected y axis (rows).
    pub y: Array1<f64>,
    /// First time slice of the concentration variable, `(y.len(), x.len())`.
    pub concentration: Array2<f64>,
    pub time: Option<String>,
    pub projection: ProjectionDescriptor,
    /// `None` when the file's grid boundaries are unordered or not finite.
    pub extent: Option<GridExtent>,
}

impl SicDataset {
    pub fn new(
        path: PathBuf,
        x: Array1<f64>,
        y: Array1<f64>,
        concentration: Array2<f64>,
        projection: ProjectionDescriptor,
        extent: Option<GridExtent>,
    ) -> Result<Self, ReadError> {
        let expected = (y.len(), x.len());
        if concentration.dim() != expected {
            return Err(ReadError::InvalidFormat(format!(
                "{}: concentration shape {:?} does not match axes {:?}",
                path.display(),
                concentration.dim(),
                expected
            )));
        }

        Ok(Self {
            path,
            x,
            y,
            concentration,
            time: None,
            projection,
            extent,
        })
    }

    pub fn with_time(mut self, time: Option<String>) -> Self {
        self.time = time;
        self
    }

    /// Coordinate mesh of shape `(len(y), len(x))`: `xx[i, j] = x[j]`, `yy[i, j] = y[i]`.
    pub fn meshgrid(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = (self.y.len(), self.x.len());
        let xx = Array2::from_shape_fn(shape, |(_, j)| self.x[j]);
        let yy = Array2::from_shape_fn(shape, |(i, _)| self.y[i]);
        (xx, yy)
    }
}

impl fmt::Display for SicDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File: {}\nTime: {}\nRows: {}\nCols: {}\nProjection: {}\nExtent: ",
            self.path.display(),
            self.time.as_deref().unwrap_or("unknown"),
            self.y.len(),
            self.x.len(),
            self.projection.projection_name,
        )?;
        match self.extent {
            Some(extent) => write!(f, "{:?}", extent.as_image_extent()),
            None => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn descriptor() -> ProjectionDescriptor {
        ProjectionDescriptor::new(
            "PROJECTION[\"Polar_Stereographic\"]".to_string(),
            6378273.0,
            6356889.449,
            70.0,
            -45.0,
        )
        .unwrap()
    }

    fn extent() -> Option<GridExtent> {
        GridExtent::new(-3850000.0, 3750000.0, 5850000.0, -5350000.0).ok()
    }

    #[test]
    fn test_meshgrid_shape_and_values() {
        let dataset = SicDataset::new(
            PathBuf::from("a.nc"),
            array![10.0, 20.0, 30.0],
            array![5.0, -5.0],
            Array2::zeros((2, 3)),
            descriptor(),
            extent(),
        )
        .unwrap();

        let (xx, yy) = dataset.meshgrid();
        assert_eq!(xx, array![[10.0, 20.0, 30.0], [10.0, 20.0, 30.0]]);
        assert_eq!(yy, array![[5.0, 5.0, 5.0], [-5.0, -5.0, -5.0]]);
    }

    #[test]
    fn test_concentration_must_match_axes() {
        let result = SicDataset::new(
            PathBuf::from("a.nc"),
            array![10.0, 20.0, 30.0],
            array![5.0, -5.0],
            Array2::zeros((3, 2)),
            descriptor(),
            extent(),
        );

        assert!(matches!(result, Err(ReadError::InvalidFormat(_))));
    }

    #[test]
    fn test_display_without_extent() {
        let dataset = SicDataset::new(
            PathBuf::from("a.nc"),
            array![10.0],
            array![5.0],
            Array2::zeros((1, 1)),
            descriptor(),
            None,
        )
        .unwrap();

        let text = dataset.to_string();
        assert!(text.contains("Projection: Polar_Stereographic"), "{text}");
        assert!(text.ends_with("Extent: unknown"), "{text}");
    }
}
