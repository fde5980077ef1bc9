//! Records decoded from a geobase file.

use serde::{Deserialize, Serialize};

/// Database file header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    /// Format version
    pub version: i32,
    /// Database name (32-byte field on disk)
    pub name: String,
    /// Creation timestamp
    pub timestamp: u64,
    /// Number of records in each table
    pub records: u32,
    /// Offset to the IP range table
    pub offset_ranges: u32,
    /// Offset to the city index table
    pub offset_cities: u32,
    /// Offset to the location table
    pub offset_locations: u32,
}

/// A closed interval of IPv4 addresses mapped to a location.
///
/// Addresses are the big-endian numeric form of the dotted quad,
/// i.e. `u32::from(Ipv4Addr)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub from: u32,
    pub to: u32,
    /// Index into the location table
    pub location_index: u32,
}

impl IpRange {
    pub fn new(from: u32, to: u32, location_index: u32) -> Self {
        Self {
            from,
            to,
            location_index,
        }
    }

    /// Whether `ip` lies within `[from, to]`, both ends inclusive.
    pub fn contains(&self, ip: u32) -> bool {
        self.from <= ip && ip <= self.to
    }
}

/// A location record.
///
/// Serialized field names match the HTTP payload; empty strings and zero
/// coordinates are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub county: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postal: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub latitude: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub longitude: f32,
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}
