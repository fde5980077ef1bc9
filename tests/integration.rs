//! Integration tests for loading geobase files from disk and querying them.

use flate2::write::GzEncoder;
use flate2::Compression;
use geodata::binary::{GeobaseBuilder, GeobaseWriter};
use geodata::{Database, Error, Location, LocationProvider};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::thread;

fn location(city: &str, county: &str) -> Location {
    Location {
        county: county.to_string(),
        region: "reg_Test".to_string(),
        postal: "pos_0001".to_string(),
        city: city.to_string(),
        organization: "org_Test".to_string(),
        latitude: 12.5,
        longitude: -45.25,
    }
}

fn small_database() -> Vec<u8> {
    let mut builder = GeobaseBuilder::new("Geo.IP").with_timestamp(1_487_167_858);
    let ajax = builder.add_location(location("cit_Ajax", "cou_CA"));
    let berlin = builder.add_location(location("cit_Berlin", "cou_DE"));
    let ajax2 = builder.add_location(location("cit_Ajax", "cou_US"));
    // 1.0.0.0 - 1.0.0.255
    builder.add_range(0x0100_0000, 0x0100_00FF, ajax);
    // 2.0.0.0 - 2.255.255.255
    builder.add_range(0x0200_0000, 0x02FF_FFFF, berlin);
    // 10.0.0.0 - 10.0.0.9
    builder.add_range(0x0A00_0000, 0x0A00_0009, ajax2);
    GeobaseWriter::new().write(&builder).unwrap()
}

/// Contiguous ranges of `step` addresses starting at zero, with city
/// names repeating every `cities` records.
fn synthetic_database(records: u32, step: u32, cities: u32) -> Vec<u8> {
    let mut builder = GeobaseBuilder::new("synthetic").with_timestamp(1);
    for i in 0..records {
        // Insert locations in reverse city order so the index must sort.
        let city = format!("cit_{:04}", cities - 1 - i % cities);
        let idx = builder.add_location(location(&city, "cou_XX"));
        builder.add_range(i * step, i * step + step - 1, idx);
    }
    GeobaseWriter::new().write(&builder).unwrap()
}

#[test]
fn test_open_plain_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geodata.dat");
    fs::write(&path, small_database()).unwrap();

    let db = Database::open(&path).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.header().name, "Geo.IP");
    assert_eq!(db.header().timestamp, 1_487_167_858);

    let found = db.location_by_ip("2.3.4.5").unwrap();
    assert_eq!(found.city, "cit_Berlin");
    assert_eq!(found.latitude, 12.5);

    let ajax = db.locations_by_city("cit_Ajax").unwrap();
    let counties: Vec<&str> = ajax.iter().map(|l| l.county.as_str()).collect();
    assert_eq!(counties, vec!["cou_CA", "cou_US"]);
}

#[test]
fn test_open_gzip_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geodata.dat.gz");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&small_database()).unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();

    let db = Database::open(&path).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.location_by_ip("10.0.0.9").unwrap().county, "cou_US");
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Database::open(dir.path().join("missing.dat")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_open_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.dat");
    let data = small_database();
    fs::write(&path, &data[..data.len() - 10]).unwrap();

    let err = Database::open(&path).unwrap_err();
    assert!(matches!(err, Error::Load { table: "locations", row: Some(2), .. }));
    assert!(err.to_string().starts_with("reading locations row 2"));
}

#[test]
fn test_lookup_misses() {
    let db = Database::from_bytes(&small_database()).unwrap();

    // Before the first range, in a gap, after the last range.
    for ip in ["0.255.255.255", "1.0.1.0", "10.0.0.10", "255.255.255.255"] {
        assert!(db.location_by_ip(ip).unwrap_err().is_not_found(), "{ip}");
    }
    assert!(db.locations_by_city("cit_Paris").unwrap_err().is_not_found());
    assert!(db.locations_by_city("cit_ajax").unwrap_err().is_not_found());
}

#[test]
fn test_invalid_ip_input() {
    let db = Database::from_bytes(&small_database()).unwrap();

    for ip in ["", "1.2.3", "1.2.3.256", "::1", "one.two.three.four"] {
        let err = db.location_by_ip(ip).unwrap_err();
        assert!(matches!(err, Error::InvalidIpAddress(_)), "{ip}");
    }
}

#[test]
fn test_ip_lookup_matches_linear_scan() {
    let db = Database::from_bytes(&synthetic_database(500, 1_000, 37)).unwrap();

    let probes = (0..600u32).flat_map(|i| [i * 1_000, i * 1_000 + 1, i * 1_000 + 999, i * 997]);
    for ip in probes {
        let expected = db
            .ranges()
            .iter()
            .find(|r| r.from <= ip && ip <= r.to)
            .map(|r| &db.locations()[r.location_index as usize]);
        assert_eq!(db.lookup_ip(ip), expected, "ip {ip}");
    }
}

#[test]
fn test_city_lookup_matches_linear_scan() {
    let db = Database::from_bytes(&synthetic_database(500, 1_000, 37)).unwrap();

    for n in 0..40 {
        let city = format!("cit_{:04}", n);
        let expected: BTreeSet<*const Location> = db
            .locations()
            .iter()
            .filter(|l| l.city == city)
            .map(|l| l as *const Location)
            .collect();
        let found = db.lookup_city(&city);
        let found_set: BTreeSet<*const Location> =
            found.iter().map(|l| *l as *const Location).collect();

        // Same records, each exactly once.
        assert_eq!(found.len(), found_set.len(), "{city}");
        assert_eq!(found_set, expected, "{city}");
        assert_eq!(found.is_empty(), n >= 37, "{city}");
    }
}

#[test]
fn test_concurrent_readers() {
    let db = Arc::new(Database::from_bytes(&synthetic_database(2_000, 100, 50)).unwrap());

    let handles: Vec<_> = (0..8u32)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..2_000u32 {
                    let ip = i * 100 + t;
                    let loc = db.lookup_ip(ip).unwrap();
                    assert_eq!(loc.city, format!("cit_{:04}", 49 - i % 50));
                    assert_eq!(db.lookup_city(&loc.city).len(), 40);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
