//! Deterministic string → color classification
//!
//! Every slice gets a color id derived purely from its label, so the same
//! label always lands on the same palette entry no matter which track or
//! which trace produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base palette shared by all slices
const PALETTE: [(u8, u8, u8); 19] = [
    (138, 113, 152),
    (175, 112, 133),
    (127, 135, 225),
    (93, 81, 137),
    (116, 143, 119),
    (178, 214, 122),
    (87, 109, 147),
    (119, 155, 95),
    (114, 180, 160),
    (132, 85, 103),
    (157, 210, 150),
    (148, 94, 86),
    (164, 108, 138),
    (139, 191, 150),
    (110, 99, 145),
    (80, 129, 109),
    (125, 140, 149),
    (93, 124, 132),
    (140, 85, 140),
];

/// Number of distinct color ids
pub const NUM_COLOR_IDS: u32 = PALETTE.len() as u32;

/// Index into the shared slice palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(u32);

impl ColorId {
    /// Classify a label into a palette entry
    pub fn for_name(name: &str) -> Self {
        ColorId((string_hash(name) % u64::from(NUM_COLOR_IDS)) as u32)
    }

    /// Raw palette index
    pub fn index(self) -> u32 {
        self.0
    }

    /// RGB triple for this id
    pub fn rgb(self) -> (u8, u8, u8) {
        PALETTE[self.0 as usize % PALETTE.len()]
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.rgb();
        write!(f, "rgb({},{},{})", r, g, b)
    }
}

/// Hash over UTF-16 code units, kept below 2^32
fn string_hash(name: &str) -> u64 {
    name.encode_utf16().fold(0u64, |hash, unit| {
        (hash + 37 * hash + 11 * u64::from(unit)) % 0xFFFF_FFFF
    })
}
