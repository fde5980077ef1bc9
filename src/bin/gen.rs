//! geodata-gen: CLI tool for building geobase files.

use clap::{Parser, Subcommand};
use geodata::binary::{GeobaseBuilder, GeobaseWriter, CITY_SIZE};
use geodata::Location;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "geodata-gen")]
#[command(version)]
#[command(about = "Build geobase files from source data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a YAML or JSON source document to the binary format
    Convert {
        /// Input document (.yml, .yaml or .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output binary file
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a synthetic database covering the whole IPv4 space
    Synth {
        /// Number of records
        #[arg(short, long, default_value_t = 10_000)]
        records: u32,

        /// Output binary file
        #[arg(short, long, default_value = "data/geodata.dat")]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Source document accepted by `convert`.
#[derive(Debug, Deserialize)]
struct SourceDocument {
    name: String,
    #[serde(default = "default_version")]
    version: i32,
    #[serde(default)]
    timestamp: Option<u64>,
    locations: Vec<Location>,
    ranges: Vec<SourceRange>,
}

#[derive(Debug, Deserialize)]
struct SourceRange {
    from: Ipv4Addr,
    to: Ipv4Addr,
    location: u32,
}

fn default_version() -> i32 {
    1
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            verbose,
        } => convert_file(&input, &output, verbose),
        Commands::Synth {
            records,
            output,
            verbose,
        } => synthesize(records, &output, verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn convert_file(input: &Path, output: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("Reading input file: {:?}", input);
    }

    let content = fs::read_to_string(input)?;
    let document: SourceDocument = if input.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(geodata::Error::from)?
    } else {
        serde_yaml::from_str(&content).map_err(geodata::Error::from)?
    };

    if verbose {
        println!(
            "Parsed {} locations, {} ranges",
            document.locations.len(),
            document.ranges.len()
        );
    }

    let mut builder = GeobaseBuilder::new(document.name).with_version(document.version);
    builder.timestamp = document.timestamp;
    builder.locations = document.locations;
    for range in &document.ranges {
        builder.add_range(u32::from(range.from), u32::from(range.to), range.location);
    }

    write_output(&builder, output, verbose)?;
    println!("Successfully converted {:?} -> {:?}", input, output);
    Ok(())
}

fn synthesize(records: u32, output: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if records == 0 {
        return Err("records must be greater than 0".into());
    }

    let builder = synthetic_database(records);
    if verbose {
        println!("Generated {} records", builder.locations.len());
    }

    write_output(&builder, output, verbose)?;
    println!("Generated {:?} ({} records)", output, records);
    Ok(())
}

fn write_output(
    builder: &GeobaseBuilder,
    output: &Path,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = GeobaseWriter::new().write(builder)?;

    if verbose {
        println!("Writing output file: {:?} ({} bytes)", output, data.len());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(output)?;
    file.write_all(&data)?;
    Ok(())
}

/// Deterministic database: contiguous ranges over the whole IPv4 space,
/// about four locations per city.
fn synthetic_database(records: u32) -> GeobaseBuilder {
    let mut builder = GeobaseBuilder::new("Geo.IP synthetic").with_version(1);
    let cities = (records / 4).max(1) as u64;
    let step = (1u64 << 32) / records as u64;

    for i in 0..records as u64 {
        let seed = mix(i);
        let city_seed = mix(i % cities + 0x5EED);

        let location = Location {
            county: word("cou_", seed, 8),
            region: word("reg_", seed >> 8, 12),
            postal: format!("pos_{}", seed % 100_000_000),
            city: word("cit_", city_seed, CITY_SIZE),
            organization: word("org_", seed >> 16, 32),
            latitude: ((seed >> 20) % 18_000) as f32 / 100.0 - 90.0,
            longitude: ((seed >> 36) % 36_000) as f32 / 100.0 - 180.0,
        };
        let index = builder.add_location(location);

        let from = i * step;
        let to = if i + 1 == records as u64 {
            u32::MAX as u64
        } else {
            (i + 1) * step - 1
        };
        builder.add_range(from as u32, to as u32, index);
    }

    builder
}

const SYLLABLES: [&str; 16] = [
    "a", "be", "ci", "do", "ej", "fu", "ga", "hy", "id", "ju", "ke", "lo", "my", "na", "os", "pe",
];

/// Pronounceable pseudo-word of at most `max_len` bytes.
fn word(prefix: &str, seed: u64, max_len: usize) -> String {
    let mut out = String::from(prefix);
    let mut bits = seed;
    let syllables = 1 + (seed % 5) as usize;

    for n in 0..syllables {
        let syllable = SYLLABLES[(bits & 0xF) as usize];
        bits = bits.rotate_right(4);
        if out.len() + syllable.len() > max_len {
            break;
        }
        if n == 0 {
            let mut chars = syllable.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(syllable);
        }
    }
    out
}

/// SplitMix64 finalizer.
fn mix(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
