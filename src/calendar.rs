use chrono::Month;
use thiserror::Error;

/// Day-count weight of a monthly mean.
///
/// February uses the simplified divisible-by-4 leap rule (no century
/// exception), so 1900 and 2100 get 29 days.
pub fn month_weight(year: i32, month: Month) -> u32 {
    match month {
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if year % 4 == 0 {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

/// Converts a 1-based month number, `None` outside 1..=12.
pub fn month_from_number(month: u32) -> Option<Month> {
    u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("no years to average over")]
    NoYears,
    #[error("no months to average over")]
    NoMonths,
    #[error("year must be positive, got {0}")]
    Year(i32),
    #[error("month must be in 1..=12, got {0}")]
    Month(u32),
}

impl WindowError {
    /// The selection itself is empty, as opposed to holding a bad value.
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, WindowError::NoYears | WindowError::NoMonths)
    }
}

/// Years × months selection to average over.
///
/// Every listed month is taken in every listed year; pairs are yielded
/// year-major in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AveragingWindow {
    years: Vec<i32>,
    months: Vec<Month>,
}

impl AveragingWindow {
    pub fn new(years: &[i32], months: &[u32]) -> Result<Self, WindowError> {
        if years.is_empty() {
            return Err(WindowError::NoYears);
        }
        if months.is_empty() {
            return Err(WindowError::NoMonths);
        }
        if let Some(&bad) = years.iter().find(|&&y| y <= 0) {
            return Err(WindowError::Year(bad));
        }

        let months = months
            .iter()
            .map(|&m| month_from_number(m).ok_or(WindowError::Month(m)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            years: years.to_vec(),
            months,
        })
    }

    pub fn len(&self) -> usize {
        self.years.len() * self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = (i32, Month)> + '_ {
        self.years
            .iter()
            .flat_map(move |&year| self.months.iter().map(move |&month| (year, month)))
    }

    pub fn total_weight(&self) -> u32 {
        self.pairs().map(|(year, month)| month_weight(year, month)).sum()
    }
}
