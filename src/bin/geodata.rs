//! geodata: serve and query a geobase file.

use clap::{Parser, Subcommand};
use geodata::{Config, Database, LocationProvider};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "geodata")]
#[command(version)]
#[command(about = "IP geolocation over a binary geobase file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the database and serve the HTTP API
    Serve {
        /// Path to YAML config
        #[arg(short, long, env = "GEODATA_CONFIG")]
        config: Option<PathBuf>,

        /// Override http.port
        #[arg(short, long, env = "GEODATA_PORT")]
        port: Option<u16>,

        /// Override db.path
        #[arg(long, env = "GEODATA_DB")]
        db: Option<PathBuf>,
    },

    /// Look up the location of an IPv4 address
    Ip {
        /// Geobase file
        #[arg(long, env = "GEODATA_DB")]
        db: PathBuf,

        /// Dotted-quad IPv4 address
        ip: String,
    },

    /// List the locations of a city
    City {
        /// Geobase file
        #[arg(long, env = "GEODATA_DB")]
        db: PathBuf,

        /// Exact city name
        city: String,
    },

    /// Print the header and checksum of a geobase file
    Info {
        /// Geobase file
        #[arg(long, env = "GEODATA_DB")]
        db: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, port, db } => serve(config, port, db),
        Commands::Ip { db, ip } => lookup_ip(&db, &ip),
        Commands::City { db, city } => lookup_city(&db, &city),
        Commands::Info { db } => info(&db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    db_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => {
            log::warn!("No config file given, using defaults");
            Config::default()
        }
    };
    if let Some(port) = port {
        config.http.port = port;
    }
    if let Some(path) = db_path {
        config.db.path = path;
    }
    config.validate()?;

    let db = Arc::new(open_database(&config.db.path)?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(geodata::server::serve(&config.http, db))?;
    Ok(())
}

/// Load a geobase, naming the file in the error.
fn open_database(path: &Path) -> Result<Database, String> {
    Database::open(path).map_err(|e| format!("loading data file {}: {}", path.display(), e))
}

fn lookup_ip(path: &Path, ip: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(path)?;
    let location = db.location_by_ip(ip)?;
    println!("{}", serde_json::to_string_pretty(location)?);
    Ok(())
}

fn lookup_city(path: &Path, city: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(path)?;
    let locations = db.locations_by_city(city)?;
    println!("{}", serde_json::to_string_pretty(&locations)?);
    Ok(())
}

fn info(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(path)?;
    let header = db.header();

    let checksum = Sha256::digest(fs::read(path)?);
    let checksum: String = checksum.iter().map(|b| format!("{:02x}", b)).collect();

    println!("File:       {}", path.display());
    println!("Name:       {}", header.name);
    println!("Version:    {}", header.version);
    println!("Timestamp:  {}", header.timestamp);
    println!("Records:    {}", header.records);
    println!(
        "Offsets:    ranges={} cities={} locations={}",
        header.offset_ranges, header.offset_cities, header.offset_locations
    );
    println!("SHA-256:    {}", checksum);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");

        let err = open_database(&path).unwrap_err();
        assert!(err.starts_with(&format!("loading data file {}: ", path.display())));
    }

    #[test]
    fn test_open_errors_keep_decode_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.dat");
        fs::write(&path, [0u8; 10]).unwrap();

        let err = open_database(&path).unwrap_err();
        assert!(err.contains("short.dat"));
        assert!(err.contains("reading header"));
    }
}
