use serde::Serialize;

use crate::codec::reader::ByteReader;
use crate::error::Result;

/// Four 16-bit fields, totally ordered lexicographically. Used as a guard on
/// every version-gated optional field in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16, build: u16) -> Self {
        Self { major, minor, patch, build }
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self> {
        Ok(Self {
            major: reader.read_u16_le()?,
            minor: reader.read_u16_le()?,
            patch: reader.read_u16_le()?,
            build: reader.read_u16_le()?,
        })
    }

    /// `major.minor.patch` as the game writes it into labels; `build` is the
    /// internal build counter and is not part of the dotted string.
    pub fn to_triple_string(self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}

/// Version gates that unlock optional fields in entity and object frames.
/// See SPEC_FULL.md §4.D.
pub mod gates {
    use super::Version;

    pub const V_1_1_0_0: Version = Version::new(1, 1, 0, 0);
    pub const STABLE_V_1_1: Version = Version::new(1, 1, 19, 0);
    pub const V_1_1_4_0: Version = Version::new(1, 1, 4, 0);
    pub const V_1_1_43_0: Version = Version::new(1, 1, 43, 0);
    pub const V_1_1_51_4: Version = Version::new(1, 1, 51, 4);
    pub const V_1_1_62_5: Version = Version::new(1, 1, 62, 5);
}

/// A position expressed as a fixed-point fraction of 256 units per tile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const UNITS_PER_TILE: f64 = 256.0;

    pub fn from_units(x: i64, y: i64) -> Self {
        Self {
            x: x as f64 / Self::UNITS_PER_TILE,
            y: y as f64 / Self::UNITS_PER_TILE,
        }
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Position", 2)?;
        s.serialize_field("x", &self.x)?;
        s.serialize_field("y", &self.y)?;
        s.end()
    }
}

/// Tracks the previous entity's absolute position so deltas can be decoded;
/// see SPEC_FULL.md §3 "Position lookahead".
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionTracker {
    last_x: i64,
    last_y: i64,
}

const ABSOLUTE_SENTINEL: i16 = 0x7FFF;

impl PositionTracker {
    pub fn read(&mut self, reader: &mut ByteReader) -> Result<Position> {
        let dx = reader.read_i16_le()?;
        let (x, y) = if dx == ABSOLUTE_SENTINEL {
            let x = reader.read_i32_le()? as i64;
            let y = reader.read_i32_le()? as i64;
            (x, y)
        } else {
            let dy = reader.read_i16_le()?;
            (self.last_x + dx as i64, self.last_y + dy as i64)
        };
        self.last_x = x;
        self.last_y = y;
        Ok(Position::from_units(x, y))
    }
}

/// 8-way direction, stored as the raw game value (0=north .. 7=northwest,
/// in 45-degree steps since 2.0; some callers still see the legacy 0..7
/// "quarter-step" encoding, which the entity decoders normalize to this).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Direction(pub u8);

impl Serialize for Direction {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

/// RGBA color, each channel a float in the game's own export (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn read(reader: &mut ByteReader) -> Result<Self> {
        Ok(Self {
            r: reader.read_f32_le()?,
            g: reader.read_f32_le()?,
            b: reader.read_f32_le()?,
            a: reader.read_f32_le()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_tracker_decodes_delta_then_absolute() {
        let mut tracker = PositionTracker::default();
        // first entity: absolute (1.0, 1.5)
        let data = [0xFF, 0x7F, 0x00, 0x01, 0x00, 0x00, 0x80, 0x01, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        let p1 = tracker.read(&mut r).unwrap();
        assert_eq!(p1, Position { x: 1.0, y: 1.5 });

        // second entity: delta of (2.0, 0.0) == (0x0200, 0x0000)
        let data = [0x00, 0x02, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        let p2 = tracker.read(&mut r).unwrap();
        assert_eq!(p2, Position { x: 3.0, y: 1.5 });
    }

    #[test]
    fn position_lookahead_boundary() {
        let mut tracker = PositionTracker::default();
        // 0x7FFE is NOT the absolute sentinel - must be treated as delta.
        let data = [0xFE, 0x7F, 0x01, 0x00];
        let mut r = ByteReader::new(&data);
        let p = tracker.read(&mut r).unwrap();
        assert_eq!(p.x, 0x7FFE as f64 / 256.0);
        assert_eq!(p.y, 1.0 / 256.0);
    }
}
