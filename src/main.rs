use icebloom::chlor::grab_chlor;
use icebloom::config::Config;
use icebloom::readers::NcReader;
use icebloom::sic::SicLoader;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG: &str = "./data/config/sic_config.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = Config::from_file(&config_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    fmt().with_env_filter(filter).with_target(true).init();

    info!(config = %config_path, "starting sea ice concentration averaging");

    let loader = SicLoader::new(config.sic_directory(), NcReader::default())?;
    let mean = loader.calc_mean_sic(config.years(), config.months())?;

    println!(
        "Mean SIC - months averaged: {}, total days: {}",
        mean.months_averaged, mean.total_weight
    );
    println!("{}", mean.mean_sic);
    println!(
        "  Valid cells: {} / {}",
        mean.mean_sic.valid_values().count(),
        mean.xx.len()
    );
    println!("  Projection: {}", mean.proj.to_proj4());
    println!("  CRS: {}", mean.proj.spatial_ref()?.to_wkt()?);

    if let Some(chlor_file) = config.chlor_file() {
        let chlor = grab_chlor(chlor_file)?;
        let valid: Vec<f64> = chlor
            .chlor_a
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();

        println!("Chlorophyll-a - {}", chlor.path.display());
        println!("  Shape: {:?}", chlor.chlor_a.dim());
        if !valid.is_empty() {
            println!(
                "  Mean: {:.3} mg m-3 over {} valid cells",
                valid.iter().sum::<f64>() / valid.len() as f64,
                valid.len()
            );
        }
    }

    Ok(())
}
