//! The loaded, immutable geobase.

use flate2::read::GzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use crate::binary::{
    decode, BinaryReader, DecodedTables, CITY_INDEX_RECORD_SIZE, RANGE_RECORD_SIZE,
};
use crate::model::{Header, IpRange, Location};
use crate::{Error, Result};

/// In-memory geobase.
///
/// Locations are stored once, in file order. The IP range table and the
/// city index refer to them by position. Nothing is mutated after load, so
/// a `Database` can be shared across threads behind an `Arc` without
/// locking.
#[derive(Debug)]
pub struct Database {
    header: Header,
    locations: Vec<Location>,
    ranges: Vec<IpRange>,
    city_index: Vec<u32>,
}

impl Database {
    /// Load a geobase file.
    ///
    /// Files ending in `.gz` are decompressed in memory first; everything
    /// else is memory-mapped for the duration of the decode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let db = if path.extension().is_some_and(|ext| ext == "gz") {
            let mut data = Vec::new();
            GzDecoder::new(BufReader::new(file)).read_to_end(&mut data)?;
            Self::from_bytes(&data)?
        } else {
            let mmap = unsafe { Mmap::map(&file)? };
            Self::from_bytes(&mmap)?
        };

        log::info!(
            "Loaded geobase {:?} from {}: {} records",
            db.header.name,
            path.display(),
            db.len()
        );
        Ok(db)
    }

    /// Load a geobase from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Load a geobase from any seekable byte source.
    pub fn from_reader<R: Read + Seek>(source: R) -> Result<Self> {
        let mut reader = BinaryReader::new(source);
        let tables = decode(&mut reader)?;
        Self::from_tables(tables)
    }

    /// Assemble a database from decoded tables.
    ///
    /// Fails if any range or city index entry points outside the location
    /// table. Ordering problems are only logged.
    pub fn from_tables(tables: DecodedTables) -> Result<Self> {
        let db = Self {
            header: tables.header,
            locations: tables.locations,
            ranges: tables.ranges,
            city_index: tables.city_index,
        };
        db.check_references()?;
        db.check_ordering();
        Ok(db)
    }

    /// File header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// All locations, in file order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// IP ranges, in file order.
    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }

    /// Location indices ordered by city.
    pub fn city_index(&self) -> &[u32] {
        &self.city_index
    }

    /// Location at `index`, if it exists.
    pub fn location(&self, index: u32) -> Option<&Location> {
        self.locations.get(index as usize)
    }

    /// Number of location records.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn check_references(&self) -> Result<()> {
        let count = self.locations.len();

        for (row, range) in self.ranges.iter().enumerate() {
            if range.location_index as usize >= count {
                let offset =
                    self.header.offset_ranges as u64 + (row * RANGE_RECORD_SIZE) as u64 + 8;
                return Err(Error::Format {
                    field: "location_index",
                    offset,
                    reason: format!(
                        "location {} out of bounds ({} locations)",
                        range.location_index, count
                    ),
                }
                .in_row("ip ranges", row));
            }
        }

        for (row, &index) in self.city_index.iter().enumerate() {
            if index as usize >= count {
                let offset =
                    self.header.offset_cities as u64 + (row * CITY_INDEX_RECORD_SIZE) as u64;
                return Err(Error::Format {
                    field: "location_offset",
                    offset,
                    reason: format!("location {} out of bounds ({} locations)", index, count),
                }
                .in_row("city index", row));
            }
        }

        Ok(())
    }

    fn check_ordering(&self) {
        if let Some(row) = self.ranges.iter().position(|r| r.from > r.to) {
            log::warn!("IP range row {} is inverted; lookups may miss it", row);
        }

        if let Some(row) = self
            .ranges
            .windows(2)
            .position(|pair| pair[1].from <= pair[0].to)
        {
            log::warn!(
                "IP ranges are not ascending and disjoint at row {}; lookups may return wrong results",
                row + 1
            );
        }

        if let Some(row) = self.city_index.windows(2).position(|pair| {
            self.locations[pair[0] as usize].city > self.locations[pair[1] as usize].city
        }) {
            log::warn!(
                "City index is not sorted by city at row {}; city lookups may miss records",
                row + 1
            );
        }
    }
}
