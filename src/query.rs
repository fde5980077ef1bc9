//! Query entry points shared by the HTTP server and the CLI.

use std::net::Ipv4Addr;

use crate::database::Database;
use crate::model::Location;
use crate::{Error, Result};

/// Read-only source of location records.
///
/// "No match" is reported as [`Error::NotFound`] so callers can tell it
/// apart from malformed input ([`Error::InvalidIpAddress`]).
pub trait LocationProvider: Send + Sync {
    /// Location of a dotted-quad IPv4 address.
    fn location_by_ip(&self, ip: &str) -> Result<&Location>;

    /// All locations of a city, matched exactly and case-sensitively.
    fn locations_by_city(&self, city: &str) -> Result<Vec<&Location>>;
}

impl LocationProvider for Database {
    fn location_by_ip(&self, ip: &str) -> Result<&Location> {
        let ip = parse_ipv4(ip)?;
        self.lookup_ip(ip).ok_or(Error::NotFound)
    }

    fn locations_by_city(&self, city: &str) -> Result<Vec<&Location>> {
        let locations = self.lookup_city(city);
        if locations.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(locations)
    }
}

/// Parse a dotted-quad IPv4 address into its numeric form.
///
/// `1.2.3.4` becomes `0x01020304`.
pub fn parse_ipv4(text: &str) -> Result<u32> {
    text.parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| Error::InvalidIpAddress(text.to_string()))
}
