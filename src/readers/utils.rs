use std::path::Path;

pub fn is_netcdf(path: &Path) -> bool {
    matches!(path.extension().and_then(|ext| ext.to_str()), Some("nc"))
}

/// GDAL connection string for one variable of a NetCDF file.
pub fn netcdf_subdataset(path: &Path, variable: &str) -> String {
    format!("NETCDF:\"{}\":{}", path.display(), variable)
}
