pub mod nc;
pub mod types;
pub mod utils;

pub use nc::NcReader;
pub use types::{DatasetReader, ReadError, SicDataset};
pub use utils::{is_netcdf, netcdf_subdataset};
