use crate::input::JobConfig;
use crate::record::BandRecord;
use std::time::Duration;

/// Initialises the `log` backend; `RUST_LOG` takes precedence over the flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let env = env_logger::Env::default().default_filter_or(level);
    // a second initialisation (tests, embedding) keeps the first logger
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

pub fn show_greeting(subject: &str) {
    println!("=== NetCDF Band Resolver ===");
    println!("Resolving: {}", subject);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!(
        "  Subdataset: {}",
        config.subdataset.as_deref().unwrap_or("<none>")
    );
    println!("  Requested dimensions: {}", config.dimensions.len());
    for (name, value) in config.dimensions.iter() {
        println!("    {} = {}", name, value);
    }
    if config.bands.is_empty() {
        println!("  Bands: all");
    } else {
        println!("  Bands: {}", config.bands.join(", "));
    }
}

pub fn show_record(record: &BandRecord) {
    println!("\n{} -> band {} of {}", record.variable, record.source_band, record.band_count);
    println!("  Raster size: {} x {}", record.raster_x_size, record.raster_y_size);
    println!("  src:");
    for (key, value) in record.src() {
        println!("    {}: {}", key, value);
    }
    println!("  dst:");
    for (key, value) in record.dst() {
        println!("    {}: {}", key, value);
    }
}

pub fn show_band_table(records: &[BandRecord]) {
    println!();
    for record in records {
        let coords: Vec<String> = record
            .resolved_coordinates
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        println!(
            "  {:<12} band {:>4}: {}",
            record.variable,
            record.source_band,
            coords.join(" ")
        );
    }
    println!("  {} band(s)", records.len());
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Resolution completed in {:.2?} ===", elapsed);
}
