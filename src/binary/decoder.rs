//! Decoding of the geobase tables.
//!
//! The file is consumed once, in a fixed order: header, IP ranges, city
//! index, locations. Any failure aborts the whole decode.

use std::io::{Read, Seek};

use super::format::*;
use super::reader::BinaryReader;
use crate::model::{Header, IpRange, Location};
use crate::Result;

/// Upper bound for up-front allocation, so a corrupt record count cannot
/// reserve gigabytes before the first read fails.
const MAX_PREALLOC: usize = 1 << 16;

/// Tables decoded from a geobase file, before integrity checks.
#[derive(Debug, Default)]
pub struct DecodedTables {
    pub header: Header,
    pub ranges: Vec<IpRange>,
    pub city_index: Vec<u32>,
    pub locations: Vec<Location>,
}

/// Decode all tables, starting from offset 0 of the source.
pub fn decode<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<DecodedTables> {
    let header = read_header(reader).map_err(|e| e.in_table("header"))?;
    log::debug!(
        "Decoded header: version={}, name={:?}, records={}",
        header.version,
        header.name,
        header.records
    );

    let ranges = read_ranges(reader, header.offset_ranges, header.records)?;
    let city_index = read_city_index(reader, header.offset_cities, header.records)?;
    let locations = read_locations(reader, header.offset_locations, header.records)?;

    Ok(DecodedTables {
        header,
        ranges,
        city_index,
        locations,
    })
}

fn read_header<R: Read + Seek>(r: &mut BinaryReader<R>) -> Result<Header> {
    r.seek(0, "version")?;
    Ok(Header {
        version: r.read_i32("version")?,
        name: r.read_fixed_str(NAME_SIZE, "name")?,
        timestamp: r.read_u64("timestamp")?,
        records: r.read_u32("records")?,
        offset_ranges: r.read_u32("offset_ranges")?,
        offset_cities: r.read_u32("offset_cities")?,
        offset_locations: r.read_u32("offset_locations")?,
    })
}

fn read_ranges<R: Read + Seek>(
    r: &mut BinaryReader<R>,
    offset: u32,
    count: u32,
) -> Result<Vec<IpRange>> {
    const TABLE: &str = "ip ranges";

    r.seek(offset as u64, "offset_ranges")
        .map_err(|e| e.in_table(TABLE))?;

    let count = count as usize;
    let mut ranges = Vec::with_capacity(count.min(MAX_PREALLOC));
    for row in 0..count {
        let range = read_range(r).map_err(|e| e.in_row(TABLE, row))?;
        ranges.push(range);
    }

    log::debug!("Decoded {} IP ranges", ranges.len());
    Ok(ranges)
}

fn read_range<R: Read + Seek>(r: &mut BinaryReader<R>) -> Result<IpRange> {
    Ok(IpRange {
        from: r.read_u32("ip_from")?,
        to: r.read_u32("ip_to")?,
        location_index: r.read_u32("location_index")?,
    })
}

fn read_city_index<R: Read + Seek>(
    r: &mut BinaryReader<R>,
    offset: u32,
    count: u32,
) -> Result<Vec<u32>> {
    const TABLE: &str = "city index";

    r.seek(offset as u64, "offset_cities")
        .map_err(|e| e.in_table(TABLE))?;

    let count = count as usize;
    let mut index = Vec::with_capacity(count.min(MAX_PREALLOC));
    for row in 0..count {
        // Stored as a byte offset into the location table.
        let byte_offset = r
            .read_u32("location_offset")
            .map_err(|e| e.in_row(TABLE, row))?;
        index.push(byte_offset / LOCATION_RECORD_SIZE as u32);
    }

    log::debug!("Decoded {} city index entries", index.len());
    Ok(index)
}

fn read_locations<R: Read + Seek>(
    r: &mut BinaryReader<R>,
    offset: u32,
    count: u32,
) -> Result<Vec<Location>> {
    const TABLE: &str = "locations";

    r.seek(offset as u64, "offset_locations")
        .map_err(|e| e.in_table(TABLE))?;

    let count = count as usize;
    let mut locations = Vec::with_capacity(count.min(MAX_PREALLOC));
    for row in 0..count {
        let location = read_location(r).map_err(|e| e.in_row(TABLE, row))?;
        locations.push(location);
    }

    log::debug!("Decoded {} locations", locations.len());
    Ok(locations)
}

fn read_location<R: Read + Seek>(r: &mut BinaryReader<R>) -> Result<Location> {
    Ok(Location {
        county: r.read_fixed_str(COUNTY_SIZE, "county")?,
        region: r.read_fixed_str(REGION_SIZE, "region")?,
        postal: r.read_fixed_str(POSTAL_SIZE, "postal")?,
        city: r.read_fixed_str(CITY_SIZE, "city")?,
        organization: r.read_fixed_str(ORGANIZATION_SIZE, "organization")?,
        latitude: r.read_f32("latitude")?,
        longitude: r.read_f32("longitude")?,
    })
}
