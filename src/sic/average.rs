use ndarray::Array2;
use tracing::{debug, info};

use super::SicError;
use super::loader::{MonthlySic, SicLoader};
use crate::calendar::{AveragingWindow, month_weight};
use crate::masked::{MaskedArray, ShapeMismatch};
use crate::projection::PolarStereographic;
use crate::readers::DatasetReader;

/// Running `Σ weight·raster` and `Σ weight`.
#[derive(Debug, Default)]
pub struct WeightedAccumulator {
    sum: Option<MaskedArray>,
    total_weight: u32,
    count: usize,
}

impl WeightedAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, raster: &MaskedArray, weight: u32) -> Result<(), ShapeMismatch> {
        match self.sum.as_mut() {
            Some(sum) => sum.try_add_scaled(raster, weight as f64)?,
            None => self.sum = Some(raster.scale(weight as f64)),
        }
        self.total_weight += weight;
        self.count += 1;
        Ok(())
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Weighted mean, `None` if nothing was added.
    pub fn finish(self) -> Option<MaskedArray> {
        let total = self.total_weight;
        self.sum
            .filter(|_| total > 0)
            .map(|sum| sum.divide(total as f64))
    }
}

/// Day-weighted mean SIC over an averaging window.
#[derive(Debug, Clone)]
pub struct MeanSic {
    pub xx: Array2<f64>,
    pub yy: Array2<f64>,
    pub mean_sic: MaskedArray,
    pub proj: PolarStereographic,
    pub months_averaged: usize,
    pub total_weight: u32,
}

impl<R: DatasetReader> SicLoader<R> {
    /// Averages every month of `months` in every year of `years`, weighting
    /// each monthly raster by its number of days.
    ///
    /// The grid and projection come from the first month loaded and are
    /// assumed to hold for the rest of the window. A cell masked in any
    /// month is masked in the mean.
    pub fn calc_mean_sic(&self, years: &[i32], months: &[u32]) -> Result<MeanSic, SicError> {
        let window = AveragingWindow::new(years, months).map_err(|err| {
            if err.is_empty_selection() {
                SicError::InvalidAveragingWindow(err.to_string())
            } else {
                SicError::InputValidation(err.to_string())
            }
        })?;
        info!(
            years = ?years,
            months = ?months,
            pairs = window.len(),
            "averaging SIC"
        );

        let mut accumulator = WeightedAccumulator::new();
        let mut grid = None;

        for (year, month) in window.pairs() {
            let weight = month_weight(year, month);
            let month_number = month.number_from_month();
            debug!(year, month = month.name(), weight, "adding month");

            let sic = if grid.is_none() {
                let MonthlySic {
                    xx, yy, sic, proj, ..
                } = self.load_monthly(year, month_number)?;
                grid = Some((xx, yy, proj));
                sic
            } else {
                self.load_monthly(year, month_number)?.sic
            };

            accumulator.add(&sic, weight)?;
        }

        let months_averaged = accumulator.count();
        let total_weight = accumulator.total_weight();
        let (xx, yy, proj) = grid.ok_or_else(|| {
            SicError::InvalidAveragingWindow("no months were loaded".to_string())
        })?;
        let mean_sic = accumulator.finish().ok_or_else(|| {
            SicError::InvalidAveragingWindow("total weight is zero".to_string())
        })?;

        Ok(MeanSic {
            xx,
            yy,
            mean_sic,
            proj,
            months_averaged,
            total_weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sic::testing::sic_dir;
    use crate::sic::{SicField, Selection, SicValue};
    use ndarray::array;

    #[test]
    fn test_accumulator_empty_has_no_mean() {
        let accumulator = WeightedAccumulator::new();
        assert_eq!(accumulator.total_weight(), 0);
        assert!(accumulator.finish().is_none());
    }

    #[test]
    fn test_accumulator_weights_by_days() {
        let mut accumulator = WeightedAccumulator::new();
        accumulator.add(&MaskedArray::new(array![[0.0]]), 31).unwrap();
        accumulator.add(&MaskedArray::new(array![[0.59]]), 28).unwrap();

        let mean = accumulator.finish().unwrap();
        assert!((mean.get(0, 0).unwrap() - 0.28).abs() < 1e-12);
    }

    #[test]
    fn test_single_month_mean_equals_loaded_raster() {
        let raw = array![[0.15, 0.73, 2.53], [0.0, 1.0, 0.333]];
        let (dir, reader) = sic_dir(&[(2003, 4, raw)]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        let Selection::Single(SicValue::Sic(loaded)) =
            loader.grab_monthly_sic(2003, 4, &[SicField::Sic]).unwrap()
        else {
            panic!("expected a bare sic raster");
        };
        let mean = loader.calc_mean_sic(&[2003], &[4]).unwrap();

        assert_eq!(mean.mean_sic.mask(), loaded.mask());
        for ((r, c), _) in loaded.data().indexed_iter() {
            match (loaded.get(r, c), mean.mean_sic.get(r, c)) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-12),
                (None, None) => {}
                other => panic!("cell ({r}, {c}) differs: {:?}", other),
            }
        }
        assert_eq!(mean.total_weight, 30);
    }

    #[test]
    fn test_constant_input_gives_constant_mean() {
        let v = 0.42;
        let (dir, reader) = sic_dir(&[
            (2001, 1, Array2::from_elem((3, 4), v)),
            (2001, 2, Array2::from_elem((3, 4), v)),
        ]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        let mean = loader.calc_mean_sic(&[2001], &[1, 2]).unwrap();

        assert_eq!(mean.total_weight, 31 + 28);
        assert_eq!(mean.mean_sic.count_masked(), 0);
        assert!(mean.mean_sic.valid_values().all(|m| (m - v).abs() < 1e-12));
    }

    #[test]
    fn test_mask_in_any_month_masks_mean() {
        let (dir, reader) = sic_dir(&[
            (2000, 1, array![[0.2, 0.2], [0.2, 2.52]]),
            (2000, 2, array![[0.4, 2.54], [0.4, 0.4]]),
        ]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        let mean = loader.calc_mean_sic(&[2000], &[1, 2]).unwrap();

        assert_eq!(mean.mean_sic.mask(), &array![[false, true], [false, true]]);
        let expected = (31.0 * 0.2 + 29.0 * 0.4) / 60.0;
        assert!((mean.mean_sic.get(0, 0).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_years_and_months_are_crossed() {
        let (dir, reader) = sic_dir(&[
            (2000, 1, Array2::from_elem((1, 1), 0.1)),
            (2000, 2, Array2::from_elem((1, 1), 0.2)),
            (2001, 1, Array2::from_elem((1, 1), 0.3)),
            (2001, 2, Array2::from_elem((1, 1), 0.4)),
        ]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        let mean = loader.calc_mean_sic(&[2000, 2001], &[1, 2]).unwrap();

        assert_eq!(mean.months_averaged, 4);
        assert_eq!(loader.reader().reads.borrow().len(), 4);
        assert_eq!(mean.total_weight, 31 + 29 + 31 + 28);

        let expected = (31.0 * 0.1 + 29.0 * 0.2 + 31.0 * 0.3 + 28.0 * 0.4) / 119.0;
        assert!((mean.mean_sic.get(0, 0).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_grid_and_projection_come_from_first_month() {
        let (dir, reader) = sic_dir(&[
            (2005, 6, Array2::zeros((2, 3))),
            (2005, 7, Array2::zeros((2, 3))),
        ]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        let mean = loader.calc_mean_sic(&[2005], &[6, 7]).unwrap();

        assert_eq!(mean.xx.dim(), (2, 3));
        assert_eq!(mean.yy.dim(), (2, 3));
        assert_eq!(mean.proj.central_longitude, -45);
        assert_eq!(mean.mean_sic.shape(), (2, 3));
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let (dir, reader) = sic_dir(&[]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        assert!(matches!(
            loader.calc_mean_sic(&[], &[1]),
            Err(SicError::InvalidAveragingWindow(_))
        ));
        assert!(matches!(
            loader.calc_mean_sic(&[2000], &[]),
            Err(SicError::InvalidAveragingWindow(_))
        ));
    }

    #[test]
    fn test_out_of_range_year_or_month_is_input_validation() {
        let (dir, reader) = sic_dir(&[(2000, 1, Array2::zeros((1, 1)))]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        assert!(matches!(
            loader.calc_mean_sic(&[2000], &[13]),
            Err(SicError::InputValidation(_))
        ));
        assert!(matches!(
            loader.calc_mean_sic(&[2000], &[0]),
            Err(SicError::InputValidation(_))
        ));
        assert!(matches!(
            loader.calc_mean_sic(&[0], &[1]),
            Err(SicError::InputValidation(_))
        ));
        assert!(loader.reader().reads.borrow().is_empty());
    }

    #[test]
    fn test_missing_month_aborts_average() {
        let (dir, reader) = sic_dir(&[(2000, 1, Array2::zeros((1, 1)))]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        assert!(matches!(
            loader.calc_mean_sic(&[2000], &[1, 2]),
            Err(SicError::AmbiguousOrMissingFile { count: 0, .. })
        ));
    }

    #[test]
    fn test_shape_change_between_months_is_an_error() {
        let (dir, reader) = sic_dir(&[
            (2000, 1, Array2::zeros((2, 2))),
            (2000, 2, Array2::zeros((3, 2))),
        ]);
        let loader = SicLoader::new(dir.path(), reader).unwrap();

        assert!(matches!(
            loader.calc_mean_sic(&[2000], &[1, 2]),
            Err(SicError::ShapeMismatch(_))
        ));
    }
}
