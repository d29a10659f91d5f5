//! Two-dimensional masked rasters.
//!
//! Each cell carries a value and a mask flag (`true` = invalid/missing).
//! Arithmetic between rasters masks a result cell whenever any operand cell
//! is masked, so invalid values never leak into sums or means.

use ndarray::{Array2, Zip};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    data: Array2<f64>,
    mask: Array2<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub expected: (usize, usize),
    pub found: (usize, usize),
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "raster shape {:?} does not match {:?}",
            self.found, self.expected
        )
    }
}

impl std::error::Error for ShapeMismatch {}

impl MaskedArray {
    /// Wraps `data` with nothing masked.
    pub fn new(data: Array2<f64>) -> Self {
        let mask = Array2::from_elem(data.dim(), false);
        Self { data, mask }
    }

    /// Masks every cell whose value is strictly greater than `threshold`.
    /// Other values, negatives included, are kept as they are.
    pub fn masked_greater(data: Array2<f64>, threshold: f64) -> Self {
        let mask = data.mapv(|v| v > threshold);
        Self { data, mask }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Value at `(row, col)`, or `None` when the cell is masked or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self.mask.get((row, col)) {
            Some(false) => self.data.get((row, col)).copied(),
            _ => None,
        }
    }

    pub fn count_masked(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter(|&(_, &m)| !m)
            .map(|(&v, _)| v)
    }

    /// Plain array with masked cells replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Array2<f64> {
        let mut out = self.data.clone();
        Zip::from(&mut out).and(&self.mask).for_each(|v, &m| {
            if m {
                *v = fill;
            }
        });
        out
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            data: self.data.mapv(|v| v * factor),
            mask: self.mask.clone(),
        }
    }

    pub fn divide(&self, divisor: f64) -> Self {
        Self {
            data: self.data.mapv(|v| v / divisor),
            mask: self.mask.clone(),
        }
    }

    pub fn try_add(&self, other: &MaskedArray) -> Result<Self, ShapeMismatch> {
        let mut out = self.clone();
        out.try_add_assign(other)?;
        Ok(out)
    }

    /// In-place `self += other`; the mask becomes the union of both masks.
    pub fn try_add_assign(&mut self, other: &MaskedArray) -> Result<(), ShapeMismatch> {
        self.check_shape(other)?;
        Zip::from(&mut self.data)
            .and(&mut self.mask)
            .and(&other.data)
            .and(&other.mask)
            .for_each(|v, m, &ov, &om| {
                *v += ov;
                *m |= om;
            });
        Ok(())
    }

    /// In-place `self += weight * other`.
    pub fn try_add_scaled(
        &mut self,
        other: &MaskedArray,
        weight: f64,
    ) -> Result<(), ShapeMismatch> {
        self.check_shape(other)?;
        Zip::from(&mut self.data)
            .and(&mut self.mask)
            .and(&other.data)
            .and(&other.mask)
            .for_each(|v, m, &ov, &om| {
                *v += weight * ov;
                *m |= om;
            });
        Ok(())
    }

    fn check_shape(&self, other: &MaskedArray) -> Result<(), ShapeMismatch> {
        if self.shape() != other.shape() {
            return Err(ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for MaskedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        let (mut min, mut max, mut sum, mut n) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize);
        for v in self.valid_values().filter(|v| !v.is_nan()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            n += 1;
        }
        let mean = if n == 0 { f64::NAN } else { sum / n as f64 };

        write!(
            f,
            "Rows: {}\nCols: {}\nMasked cells: {}\nMin value: {}\nMax value: {}\nMean value: {}",
            rows,
            cols,
            self.count_masked(),
            min,
            max,
            mean,
        )
    }
}
