//! Geodata - IP geolocation over a fixed-layout binary database.
//!
//! This crate loads a geobase file into memory once and answers two
//! queries against it:
//!
//! - **Location by IP**: binary search over sorted, disjoint IPv4 ranges
//! - **Locations by city**: binary search over a city-sorted index, then a
//!   scan over the contiguous block of equal city names
//!
//! # Quick Start
//!
//! ```ignore
//! use geodata::{Database, LocationProvider};
//!
//! let db = Database::open("data/geodata.dat")?;
//!
//! let location = db.location_by_ip("123.234.123.234")?;
//! println!("{}, {}", location.city, location.county);
//!
//! for location in db.locations_by_city("cit_Ejid")? {
//!     println!("{} {}", location.latitude, location.longitude);
//! }
//! ```
//!
//! # Sharing
//!
//! A [`Database`] is immutable after load. Wrap it in an `Arc` and hand
//! clones to as many threads as needed; lookups take no locks.
//!
//! # Building files
//!
//! [`binary::GeobaseWriter`] serializes locations and ranges into the
//! same format, computing the city index on the way.

mod database;
mod error;
mod model;
mod search;

pub mod binary;
pub mod config;
pub mod query;
pub mod server;

// Re-export core types
pub use database::Database;
pub use error::{Error, Result};
pub use model::{Header, IpRange, Location};
pub use query::{parse_ipv4, LocationProvider};

// Re-export configuration
pub use config::Config;
