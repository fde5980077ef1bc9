//! Geobase binary file format.
//!
//! All integers and floats are little-endian. Every table holds exactly
//! `records` entries.
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |     HEADER       |  60 bytes (fixed)
//! +------------------+
//! |    IP RANGES     |  records x 12 bytes  (at offset_ranges)
//! +------------------+
//! |   CITY INDEX     |  records x 4 bytes   (at offset_cities)
//! +------------------+
//! |    LOCATIONS     |  records x 96 bytes  (at offset_locations)
//! +------------------+
//! ```
//!
//! The city index stores byte offsets into the location table, ordered by
//! the city name of the referenced location.

mod decoder;
mod format;
mod reader;
pub mod writer;


pub use decoder::{decode, DecodedTables};
pub use format::*;
pub use reader::BinaryReader;
pub use writer::{GeobaseBuilder, GeobaseWriter};
