//! Geobase file writer.

use super::format::*;
use crate::model::{IpRange, Location};
use crate::{Error, Result};

/// In-memory content of a geobase file, prior to serialization.
#[derive(Debug, Default, Clone)]
pub struct GeobaseBuilder {
    /// Database name (at most 32 bytes)
    pub name: String,
    /// Format version
    pub version: i32,
    /// Creation timestamp; `None` means "now" at write time
    pub timestamp: Option<u64>,
    /// Location records in file order
    pub locations: Vec<Location>,
    /// IP ranges (sorted by `from` at write time)
    pub ranges: Vec<IpRange>,
}

impl GeobaseBuilder {
    /// Create an empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            ..Default::default()
        }
    }

    /// Set the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the format version.
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Append a location and return its index.
    pub fn add_location(&mut self, location: Location) -> u32 {
        self.locations.push(location);
        (self.locations.len() - 1) as u32
    }

    /// Map the closed interval `[from, to]` to a location index.
    pub fn add_range(&mut self, from: u32, to: u32, location_index: u32) {
        self.ranges.push(IpRange::new(from, to, location_index));
    }
}

/// Geobase file writer.
pub struct GeobaseWriter {
    buffer: Vec<u8>,
}

impl GeobaseWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    /// Serialize the builder content into the binary format.
    ///
    /// Every table holds one entry per location, so the number of ranges
    /// must equal the number of locations.
    pub fn write(&mut self, db: &GeobaseBuilder) -> Result<Vec<u8>> {
        self.buffer.clear();

        let records = db.locations.len();
        if db.ranges.len() != records {
            return Err(Error::Format {
                field: "records",
                offset: 0,
                reason: format!(
                    "{} ranges for {} locations; each table must hold one entry per location",
                    db.ranges.len(),
                    records
                ),
            });
        }

        let layout = Layout::new(records)?;

        let mut ranges = db.ranges.clone();
        ranges.sort_by_key(|r| r.from);
        for (row, range) in ranges.iter().enumerate() {
            let row_offset = (HEADER_SIZE + row * RANGE_RECORD_SIZE) as u64;
            if range.location_index as usize >= records {
                return Err(Error::Format {
                    field: "location_index",
                    offset: row_offset + 8,
                    reason: format!(
                        "range row {} points to missing location {}",
                        row, range.location_index
                    ),
                });
            }
            if range.from > range.to {
                return Err(Error::Format {
                    field: "ip_from",
                    offset: row_offset,
                    reason: format!(
                        "range row {} starts at {} after its end {}",
                        row, range.from, range.to
                    ),
                });
            }
        }

        self.buffer.reserve(layout.end as usize);
        // Header is filled in last
        self.buffer.resize(HEADER_SIZE, 0);

        for range in &ranges {
            self.put_u32(range.from);
            self.put_u32(range.to);
            self.put_u32(range.location_index);
        }

        // Fits: every location starts below `layout.end`.
        for index in city_order(&db.locations) {
            self.put_u32(index * LOCATION_RECORD_SIZE as u32);
        }

        for location in &db.locations {
            self.write_location(location)?;
        }
        debug_assert_eq!(self.buffer.len() as u64, layout.end);

        let timestamp = db.timestamp.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        });

        // Write header
        let name = self.fixed(&db.name, NAME_SIZE, "name")?;
        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend_from_slice(&db.version.to_le_bytes());
        header.extend_from_slice(&name);
        header.extend_from_slice(&timestamp.to_le_bytes());
        header.extend_from_slice(&layout.records.to_le_bytes());
        header.extend_from_slice(&layout.offset_ranges.to_le_bytes());
        header.extend_from_slice(&layout.offset_cities.to_le_bytes());
        header.extend_from_slice(&layout.offset_locations.to_le_bytes());
        self.buffer[..HEADER_SIZE].copy_from_slice(&header);

        Ok(std::mem::take(&mut self.buffer))
    }

    fn write_location(&mut self, location: &Location) -> Result<()> {
        let county = self.fixed(&location.county, COUNTY_SIZE, "county")?;
        let region = self.fixed(&location.region, REGION_SIZE, "region")?;
        let postal = self.fixed(&location.postal, POSTAL_SIZE, "postal")?;
        let city = self.fixed(&location.city, CITY_SIZE, "city")?;
        let organization = self.fixed(&location.organization, ORGANIZATION_SIZE, "organization")?;

        self.buffer.extend_from_slice(&county);
        self.buffer.extend_from_slice(&region);
        self.buffer.extend_from_slice(&postal);
        self.buffer.extend_from_slice(&city);
        self.buffer.extend_from_slice(&organization);
        self.buffer.extend_from_slice(&location.latitude.to_le_bytes());
        self.buffer.extend_from_slice(&location.longitude.to_le_bytes());
        Ok(())
    }

    fn fixed(&self, text: &str, width: usize, field: &'static str) -> Result<Vec<u8>> {
        pad_fixed(text, width).ok_or_else(|| Error::Format {
            field,
            offset: self.buffer.len() as u64,
            reason: format!("{:?} exceeds {} bytes", text, width),
        })
    }

    fn put_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }
}

impl Default for GeobaseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Section offsets of a file with a given record count.
#[derive(Debug, PartialEq, Eq)]
struct Layout {
    records: u32,
    offset_ranges: u32,
    offset_cities: u32,
    offset_locations: u32,
    end: u64,
}

impl Layout {
    /// Fails when any offset stored in the file would not fit in a `u32`.
    fn new(records: usize) -> Result<Self> {
        let row_size = (RANGE_RECORD_SIZE + CITY_INDEX_RECORD_SIZE + LOCATION_RECORD_SIZE) as u64;
        let end = (records as u64)
            .checked_mul(row_size)
            .and_then(|body| body.checked_add(HEADER_SIZE as u64))
            .filter(|&end| end <= u32::MAX as u64)
            .ok_or_else(|| Error::Format {
                field: "records",
                offset: 44,
                reason: format!("{} records do not fit in 32-bit file offsets", records),
            })?;

        let n = records as u32;
        let offset_ranges = HEADER_SIZE as u32;
        let offset_cities = offset_ranges + n * RANGE_RECORD_SIZE as u32;
        let offset_locations = offset_cities + n * CITY_INDEX_RECORD_SIZE as u32;
        Ok(Self {
            records: n,
            offset_ranges,
            offset_cities,
            offset_locations,
            end,
        })
    }
}

/// Location indices ordered by city, ties kept in file order.
fn city_order(locations: &[Location]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..locations.len() as u32).collect();
    order.sort_by(|&a, &b| {
        locations[a as usize]
            .city
            .as_bytes()
            .cmp(locations[b as usize].city.as_bytes())
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(city: &str) -> Location {
        Location {
            city: city.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_city_order_is_stable() {
        let locations = vec![location("Ajax"), location("Berlin"), location("Ajax")];
        assert_eq!(city_order(&locations), vec![0, 2, 1]);
    }

    #[test]
    fn test_layout_offsets() {
        let mut db = GeobaseBuilder::new("test").with_timestamp(42);
        let idx = db.add_location(location("Ajax"));
        db.add_range(0, 10, idx);

        let data = GeobaseWriter::new().write(&db).unwrap();
        assert_eq!(
            data.len(),
            HEADER_SIZE + RANGE_RECORD_SIZE + CITY_INDEX_RECORD_SIZE + LOCATION_RECORD_SIZE
        );

        let u32_at = |pos: usize| u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap());
        assert_eq!(u32_at(44), 1); // records
        assert_eq!(u32_at(48), HEADER_SIZE as u32);
        assert_eq!(u32_at(52), (HEADER_SIZE + RANGE_RECORD_SIZE) as u32);
        assert_eq!(
            u32_at(56),
            (HEADER_SIZE + RANGE_RECORD_SIZE + CITY_INDEX_RECORD_SIZE) as u32
        );
    }

    #[test]
    fn test_text_overflow_is_rejected() {
        let mut db = GeobaseBuilder::new("test");
        let idx = db.add_location(location("a city name that is far too long"));
        db.add_range(0, 1, idx);

        let err = GeobaseWriter::new().write(&db).unwrap_err();
        assert_eq!(err.field(), Some("city"));
    }

    #[test]
    fn test_dangling_location_index_is_rejected() {
        let mut db = GeobaseBuilder::new("test");
        db.add_location(location("Ajax"));
        db.add_range(0, 1, 5);

        let err = GeobaseWriter::new().write(&db).unwrap_err();
        assert_eq!(err.field(), Some("location_index"));
    }

    #[test]
    fn test_table_size_mismatch_is_rejected() {
        let mut db = GeobaseBuilder::new("test");
        db.add_location(location("Ajax"));
        db.add_location(location("Berlin"));
        db.add_range(0, 1, 0);

        let err = GeobaseWriter::new().write(&db).unwrap_err();
        assert_eq!(err.field(), Some("records"));
    }

    #[test]
    fn test_range_errors_report_byte_offsets() {
        let mut db = GeobaseBuilder::new("test");
        let idx = db.add_location(location("Ajax"));
        db.add_location(location("Berlin"));
        db.add_range(0, 9, idx);
        db.add_range(10, 20, 7);

        match GeobaseWriter::new().write(&db).unwrap_err() {
            Error::Format { field, offset, .. } => {
                assert_eq!(field, "location_index");
                assert_eq!(offset, (HEADER_SIZE + RANGE_RECORD_SIZE + 8) as u64);
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut db = GeobaseBuilder::new("test");
        let idx = db.add_location(location("Ajax"));
        db.add_range(30, 20, idx);

        match GeobaseWriter::new().write(&db).unwrap_err() {
            Error::Format { field, offset, .. } => {
                assert_eq!(field, "ip_from");
                assert_eq!(offset, HEADER_SIZE as u64);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_layout_must_fit_u32_offsets() {
        // 60 + 38_347_921 * 112 is the largest layout below u32::MAX.
        let layout = Layout::new(38_347_921).unwrap();
        assert_eq!(layout.end, 4_294_967_212);
        assert_eq!(layout.offset_cities, 60 + 38_347_921 * 12);
        assert_eq!(layout.offset_locations, 60 + 38_347_921 * 16);

        let err = Layout::new(38_347_922).unwrap_err();
        assert_eq!(err.field(), Some("records"));
        assert!(Layout::new(usize::MAX).is_err());
    }

    #[test]
    fn test_empty_layout() {
        let layout = Layout::new(0).unwrap();
        assert_eq!(layout.offset_ranges, HEADER_SIZE as u32);
        assert_eq!(layout.offset_locations, HEADER_SIZE as u32);
        assert_eq!(layout.end, HEADER_SIZE as u64);
    }
}
