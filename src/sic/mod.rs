//! Monthly sea-ice-concentration (SIC) discovery, loading and
//! day-weighted averaging.

pub mod average;
pub mod error;
pub mod loader;
pub mod locator;

#[cfg(test)]
mod testing;

pub use average::{MeanSic, WeightedAccumulator};
pub use error::SicError;
pub use loader::{MonthlySic, Selection, SicField, SicLoader, SicValue};
pub use locator::{find_single_file, name_prefix};
