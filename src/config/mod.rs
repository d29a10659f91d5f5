use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::calendar::month_from_number;

pub mod error;
pub use error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    sic_directory: PathBuf,
    years: Vec<i32>,
    months: Vec<u32>,
    chlor_file: Option<PathBuf>,
    log_level: String,
}

// Deserializes a Config, making sure the averaging window is non-empty and
// every month is a calendar month.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            sic_directory: PathBuf,
            years: Vec<i32>,
            months: Vec<u32>,
            chlor_file: Option<PathBuf>,
            log_level: Option<String>,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        if helper.years.is_empty() {
            return Err(D::Error::custom(ConfigError::NoYears));
        }
        if let Some(&year) = helper.years.iter().find(|&&y| y <= 0) {
            return Err(D::Error::custom(ConfigError::Year(year)));
        }

        if helper.months.is_empty() {
            return Err(D::Error::custom(ConfigError::NoMonths));
        }
        if let Some(&month) = helper
            .months
            .iter()
            .find(|&&m| month_from_number(m).is_none())
        {
            return Err(D::Error::custom(ConfigError::Month(month)));
        }

        Ok(Config {
            sic_directory: helper.sic_directory,
            years: helper.years,
            months: helper.months,
            chlor_file: helper.chlor_file,
            log_level: helper.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader)?;

        Ok(config)
    }

    pub fn sic_directory(&self) -> &Path {
        &self.sic_directory
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn chlor_file(&self) -> Option<&Path> {
        self.chlor_file.as_deref()
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r#"
    {
        "sic_directory": "/data/sicCDRNOAANSIDC/",
        "years": [2000, 2001],
        "months": [4, 5, 6],
        "chlor_file": "/data/AQUA_MODIS.20000601_20000630.L3m.MO.CHL.chlor_a.4km.nc"
    }
    "#;

        file.write_all(config_data.as_bytes()).unwrap();

        let config = Config::from_file(file_path).unwrap();

        assert_eq!(config.sic_directory(), Path::new("/data/sicCDRNOAANSIDC/"));
        assert_eq!(config.years(), &[2000, 2001]);
        assert_eq!(config.months(), &[4, 5, 6]);
        assert!(config.chlor_file().is_some());
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let result: Result<Config, _> = serde_json::from_str(
            r#"{"sic_directory": "/data", "years": [2000], "months": [0, 13]}"#,
        );

        let err = result.unwrap_err().to_string();
        assert!(err.contains("month should be in 1..=12, got 0"), "{err}");
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let no_years: Result<Config, _> =
            serde_json::from_str(r#"{"sic_directory": "/data", "years": [], "months": [1]}"#);
        assert!(no_years.is_err());

        let no_months: Result<Config, _> =
            serde_json::from_str(r#"{"sic_directory": "/data", "years": [2000], "months": []}"#);
        assert!(no_months.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_log_level_override() {
        let config: Config = serde_json::from_str(
            r#"{"sic_directory": "/data", "years": [2000], "months": [1], "log_level": "debug"}"#,
        )
        .unwrap();

        assert_eq!(config.log_level(), "debug");
        assert!(config.chlor_file().is_none());
    }
}
