//! Binary format constants and fixed-width text helpers.

/// Header size in bytes.
///
/// version (4) + name (32) + timestamp (8) + records (4) + three offsets (12).
pub const HEADER_SIZE: usize = 60;

/// Width of the database name field in the header.
pub const NAME_SIZE: usize = 32;

/// IP range record size: from, to, location index.
pub const RANGE_RECORD_SIZE: usize = 12;

/// City index record size: one byte offset into the location table.
pub const CITY_INDEX_RECORD_SIZE: usize = 4;

/// Location record size.
pub const LOCATION_RECORD_SIZE: usize = 96;

/// Width of the county field of a location record.
pub const COUNTY_SIZE: usize = 8;
/// Width of the region field of a location record.
pub const REGION_SIZE: usize = 12;
/// Width of the postal field of a location record.
pub const POSTAL_SIZE: usize = 12;
/// Width of the city field of a location record.
pub const CITY_SIZE: usize = 24;
/// Width of the organization field of a location record.
pub const ORGANIZATION_SIZE: usize = 32;

/// Strip the zero padding from the end of a fixed-width text field.
///
/// Only trailing NUL bytes are removed; whitespace is significant.
pub fn trim_fixed(raw: &[u8]) -> &[u8] {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    &raw[..end]
}

/// Encode text into a zero-padded field of `width` bytes.
///
/// Returns `None` if the text does not fit.
pub fn pad_fixed(text: &str, width: usize) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() > width {
        return None;
    }
    let mut field = vec![0u8; width];
    field[..bytes.len()].copy_from_slice(bytes);
    Some(field)
}
