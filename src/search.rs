//! Lookups over a loaded [`Database`].
//!
//! Both searches rely on the ordering of the tables in the file: IP ranges
//! ascending by `from` and pairwise disjoint, the city index ascending by
//! city name. Neither search allocates unless it finds a match.

use crate::database::Database;
use crate::model::{IpRange, Location};

impl Database {
    /// Find the range containing `ip`.
    ///
    /// Binary search for the first range whose `from` or `to` is at least
    /// `ip`, then check that `ip` lies inside it.
    pub fn find_range(&self, ip: u32) -> Option<&IpRange> {
        let ranges = self.ranges();
        let idx = ranges.partition_point(|r| r.from < ip && r.to < ip);
        ranges.get(idx).filter(|r| r.contains(ip))
    }

    /// Location for a numeric IPv4 address.
    pub fn lookup_ip(&self, ip: u32) -> Option<&Location> {
        self.find_range(ip)
            .and_then(|range| self.location(range.location_index))
    }

    /// All locations whose city equals `city` exactly, in city index order.
    ///
    /// Returns an empty vector when there is no match.
    pub fn lookup_city(&self, city: &str) -> Vec<&Location> {
        let index = self.city_index();
        let locations = self.locations();
        let city_of = |pos: usize| locations[index[pos] as usize].city.as_str();

        let start = index.partition_point(|&i| locations[i as usize].city.as_str() < city);
        if start >= index.len() || city_of(start) != city {
            return Vec::new();
        }

        index[start..]
            .iter()
            .map(|&i| &locations[i as usize])
            .take_while(|location| location.city == city)
            .collect()
    }
}
