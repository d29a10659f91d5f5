use chrono::Month;
use ndarray::Array2;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use super::SicError;
use super::locator::{find_single_file, name_prefix};
use crate::calendar::month_from_number;
use crate::extent::GridExtent;
use crate::masked::MaskedArray;
use crate::projection::PolarStereographic;
use crate::readers::{DatasetReader, SicDataset};

/// Concentrations above this are flag values (land, coast, pole hole...).
pub const MAX_VALID_CONCENTRATION: f64 = 1.0;

/// Fields that can be requested from [`SicLoader::grab_monthly_sic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SicField {
    /// x coordinate mesh
    #[serde(rename = "xx")]
    Xx,
    /// y coordinate mesh
    #[serde(rename = "yy")]
    Yy,
    /// masked concentration raster
    #[serde(rename = "sic")]
    Sic,
    /// raw `spatial_ref` string
    #[serde(rename = "proj_info")]
    ProjInfo,
    /// the opened dataset record
    #[serde(rename = "ds")]
    Dataset,
    /// polar stereographic projection
    #[serde(rename = "proj")]
    Proj,
}

impl SicField {
    pub const ALL: [SicField; 6] = [
        SicField::Xx,
        SicField::Yy,
        SicField::Sic,
        SicField::ProjInfo,
        SicField::Dataset,
        SicField::Proj,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SicField::Xx => "xx",
            SicField::Yy => "yy",
            SicField::Sic => "sic",
            SicField::ProjInfo => "proj_info",
            SicField::Dataset => "ds",
            SicField::Proj => "proj",
        }
    }
}

impl fmt::Display for SicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SicField {
    type Err = SicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SicField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| SicError::InputValidation(format!("unknown field: {}", s)))
    }
}

#[derive(Debug, Clone)]
pub enum SicValue {
    Xx(Array2<f64>),
    Yy(Array2<f64>),
    Sic(MaskedArray),
    ProjInfo(String),
    Dataset(Box<SicDataset>),
    Proj(PolarStereographic),
}

impl SicValue {
    pub fn field(&self) -> SicField {
        match self {
            SicValue::Xx(_) => SicField::Xx,
            SicValue::Yy(_) => SicField::Yy,
            SicValue::Sic(_) => SicField::Sic,
            SicValue::ProjInfo(_) => SicField::ProjInfo,
            SicValue::Dataset(_) => SicField::Dataset,
            SicValue::Proj(_) => SicField::Proj,
        }
    }

    pub fn into_sic(self) -> Option<MaskedArray> {
        match self {
            SicValue::Sic(sic) => Some(sic),
            _ => None,
        }
    }

    pub fn into_coords(self) -> Option<Array2<f64>> {
        match self {
            SicValue::Xx(coords) | SicValue::Yy(coords) => Some(coords),
            _ => None,
        }
    }

    pub fn into_proj(self) -> Option<PolarStereographic> {
        match self {
            SicValue::Proj(proj) => Some(proj),
            _ => None,
        }
    }
}

/// Result of a field request: one field comes back bare, several as a list
/// in request order.
#[derive(Debug, Clone)]
pub enum Selection {
    Single(SicValue),
    Many(Vec<SicValue>),
}

impl Selection {
    pub fn into_vec(self) -> Vec<SicValue> {
        match self {
            Selection::Single(value) => vec![value],
            Selection::Many(values) => values,
        }
    }
}

/// Everything read for one (year, month).
#[derive(Debug, Clone)]
pub struct MonthlySic {
    pub xx: Array2<f64>,
    pub yy: Array2<f64>,
    pub sic: MaskedArray,
    pub proj: PolarStereographic,
    pub dataset: SicDataset,
}

impl MonthlySic {
    pub fn from_dataset(dataset: SicDataset) -> Result<Self, SicError> {
        let (xx, yy) = dataset.meshgrid();
        let concentration = dataset.concentration.clone();
        let sic = MaskedArray::masked_greater(concentration, MAX_VALID_CONCENTRATION);
        let proj = dataset.projection.polar_stereographic()?;

        Ok(Self {
            xx,
            yy,
            sic,
            proj,
            dataset,
        })
    }

    pub fn proj_info(&self) -> &str {
        &self.dataset.projection.spatial_ref
    }

    pub fn extent(&self) -> Option<GridExtent> {
        self.dataset.extent
    }

    pub fn value(&self, field: SicField) -> SicValue {
        match field {
            SicField::Xx => SicValue::Xx(self.xx.clone()),
            SicField::Yy => SicValue::Yy(self.yy.clone()),
            SicField::Sic => SicValue::Sic(self.sic.clone()),
            SicField::ProjInfo => SicValue::ProjInfo(self.proj_info().to_string()),
            SicField::Dataset => SicValue::Dataset(Box::new(self.dataset.clone())),
            SicField::Proj => SicValue::Proj(self.proj),
        }
    }

    pub fn select(&self, fields: &[SicField]) -> Selection {
        match fields {
            [single] => Selection::Single(self.value(*single)),
            _ => Selection::Many(fields.iter().map(|&f| self.value(f)).collect()),
        }
    }
}

/// Locates and loads monthly SIC files from one directory.
#[derive(Debug, Clone)]
pub struct SicLoader<R> {
    main_path: PathBuf,
    reader: R,
}

impl<R: DatasetReader> SicLoader<R> {
    pub fn new(main_path: impl Into<PathBuf>, reader: R) -> Result<Self, SicError> {
        let main_path = main_path.into();
        if !main_path.is_dir() {
            return Err(SicError::InputValidation(format!(
                "\"{}\" not an existing directory",
                main_path.display()
            )));
        }

        Ok(Self { main_path, reader })
    }

    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn locate(&self, year: i32, month: u32) -> Result<PathBuf, SicError> {
        let month = validate_date(year, month)?;
        find_single_file(&self.main_path, &name_prefix(year, month))
    }

    pub fn load_monthly(&self, year: i32, month: u32) -> Result<MonthlySic, SicError> {
        let path = self.locate(year, month)?;
        debug!(path = %path.display(), "opening");

        let monthly = MonthlySic::from_dataset(self.reader.read_dataset(&path)?)?;
        debug!(
            time = ?monthly.dataset.time,
            masked = monthly.sic.count_masked(),
            "loaded monthly SIC"
        );
        Ok(monthly)
    }

    /// Loads `(year, month)` and returns `fields` in the order given.
    pub fn grab_monthly_sic(
        &self,
        year: i32,
        month: u32,
        fields: &[SicField],
    ) -> Result<Selection, SicError> {
        if fields.is_empty() {
            return Err(SicError::InputValidation(
                "field list is empty, must request at least one field".to_string(),
            ));
        }

        Ok(self.load_monthly(year, month)?.select(fields))
    }

    /// Grid boundaries of the file for (year, month), `None` when the file
    /// carries unusable ones.
    pub fn grid_extent(&self, year: i32, month: u32) -> Result<Option<GridExtent>, SicError> {
        Ok(self.load_monthly(year, month)?.extent())
    }
}

fn validate_date(year: i32, month: u32) -> Result<Month, SicError> {
    if year <= 0 {
        return Err(SicError::InputValidation(format!(
            "year must be positive, got {}",
            year
        )));
    }
    month_from_number(month)
        .ok_or_else(|| SicError::InputValidation(format!("month must be in 1..=12, got {}", month)))
}
