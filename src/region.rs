//! Static region → province lookup used to scope environmental queries.

use crate::cache::RegionKey;

/// A province sampling point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Province {
  pub name: &'static str,
  pub lat: f64,
  pub lon: f64,
}

const fn province(name: &'static str, lat: f64, lon: f64) -> Province {
  Province { name, lat, lon }
}

const CENTRAL: &[Province] = &[
  province("Bangkok", 13.7563, 100.5018),
  province("Nonthaburi", 13.8621, 100.5144),
  province("Pathum Thani", 14.0208, 100.5250),
  province("Phra Nakhon Si Ayutthaya", 14.3692, 100.5877),
  province("Nakhon Pathom", 13.8199, 100.0621),
];

const NORTH: &[Province] = &[
  province("Chiang Mai", 18.7883, 98.9853),
  province("Chiang Rai", 19.9105, 99.8406),
  province("Lampang", 18.2888, 99.4908),
  province("Phitsanulok", 16.8211, 100.2659),
  province("Nan", 18.7756, 100.7730),
];

const NORTHEAST: &[Province] = &[
  province("Khon Kaen", 16.4419, 102.8360),
  province("Nakhon Ratchasima", 14.9799, 102.0977),
  province("Udon Thani", 17.4138, 102.7870),
  province("Ubon Ratchathani", 15.2287, 104.8564),
  province("Nong Khai", 17.8783, 102.7420),
];

const EAST: &[Province] = &[
  province("Chon Buri", 13.3611, 100.9847),
  province("Rayong", 12.6814, 101.2816),
  province("Chanthaburi", 12.6113, 102.1039),
  province("Trat", 12.2428, 102.5175),
];

const WEST: &[Province] = &[
  province("Kanchanaburi", 14.0228, 99.5328),
  province("Tak", 16.8840, 99.1258),
  province("Ratchaburi", 13.5283, 99.8134),
  province("Phetchaburi", 13.1119, 99.9398),
];

const SOUTH: &[Province] = &[
  province("Songkhla", 7.1898, 100.5954),
  province("Phuket", 7.8804, 98.3923),
  province("Surat Thani", 9.1382, 99.3215),
  province("Nakhon Si Thammarat", 8.4304, 99.9631),
  province("Krabi", 8.0863, 98.9063),
];

/// Every known region key, in display order.
pub const REGIONS: &[&str] = &["central", "north", "northeast", "east", "west", "south"];

/// Member provinces of a region; empty for unknown keys.
pub fn resolve(region: &RegionKey) -> &'static [Province] {
  match region.as_str() {
    "central" => CENTRAL,
    "north" => NORTH,
    "northeast" => NORTHEAST,
    "east" => EAST,
    "west" => WEST,
    "south" => SOUTH,
    _ => &[],
  }
}
