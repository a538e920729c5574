use crate::error::{ParseError, Result};

/// Seekable little-endian byte reader over the library file's wire format.
///
/// Every read method reports the offset at which it started when it fails,
/// so a caller never has to reconstruct "where did this go wrong" by hand.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(ParseError::UnexpectedEof { offset: pos });
        }
        self.pos = pos;
        Ok(())
    }

    /// Consume `n` bytes without interpreting them. `label` is attached only
    /// to the error message; it carries no semantic weight.
    pub fn ignore(&mut self, n: usize, label: &'static str) -> Result<()> {
        let offset = self.pos;
        self.read_bytes(n).map_err(|_| ParseError::UnexpectedEof { offset })?;
        let _ = label;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let offset = self.pos;
        if self.remaining() < n {
            return Err(ParseError::UnexpectedEof { offset });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let offset = self.pos;
        if self.remaining() < 1 {
            return Err(ParseError::UnexpectedEof { offset });
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Strict boolean: only 0x00 and 0x01 are valid.
    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        match byte {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ParseError::InvalidBool { offset, byte: other }),
        }
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(self.read_u16_le()? as i16)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_f32_le(&mut self) -> Result<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// One-byte count; reads as a fixed-width field. Used for per-class
    /// prototype counts, inventory filter counts, etc.
    pub fn read_count8(&mut self) -> Result<u8> {
        self.read_u8()
    }

    pub fn read_count16(&mut self) -> Result<u16> {
        self.read_u16_le()
    }

    pub fn read_count32(&mut self) -> Result<u32> {
        self.read_u32_le()
    }

    /// Variable-length count used for string lengths and content sizes:
    /// a single byte, unless it is 0xFF, in which case a 4-byte count follows.
    pub fn read_varsize(&mut self) -> Result<usize> {
        let first = self.read_u8()?;
        if first == 0xFF {
            Ok(self.read_u32_le()? as usize)
        } else {
            Ok(first as usize)
        }
    }

    /// Length-prefixed UTF-8 string (see `read_varsize`).
    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.pos;
        let len = self.read_varsize()?;
        if len > 1024 * 1024 {
            return Err(ParseError::StringTooLong {
                offset,
                len,
                max: 1024 * 1024,
            });
        }
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ParseError::InvalidUtf8 { offset })
    }

    /// A string wrapped in a leading "is_empty" boolean, as used inside
    /// property tree string payloads.
    pub fn read_string_maybe_empty(&mut self) -> Result<String> {
        let is_empty = self.read_bool()?;
        if is_empty {
            Ok(String::new())
        } else {
            self.read_string()
        }
    }

    /// Reads a byte and maps it through `table[byte as usize]`, failing if
    /// the byte is out of range for the table. Used for small closed
    /// enumerations encoded as a raw index (comparators, operators, ...).
    pub fn read_mapped_u8<T: Copy>(&mut self, table: &[T]) -> Result<T> {
        let offset = self.pos;
        let v = self.read_u8()? as usize;
        table.get(v).copied().ok_or(ParseError::NotOneOf {
            offset,
            value: v as u64,
        })
    }

    /// Asserts the next bytes equal `literal` exactly.
    pub fn expect_bytes(&mut self, literal: &[u8]) -> Result<()> {
        let offset = self.pos;
        let actual = self.read_bytes(literal.len())?;
        if actual != literal {
            return Err(ParseError::LiteralMismatch {
                offset,
                expected: literal.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }

    pub fn expect_u8(&mut self, literal: u8) -> Result<()> {
        self.expect_bytes(&[literal])
    }

    /// Asserts the next byte is one of `options`, returning it.
    pub fn expect_oneof_u8(&mut self, options: &[u8]) -> Result<u8> {
        let offset = self.pos;
        let v = self.read_u8()?;
        if options.contains(&v) {
            Ok(v)
        } else {
            Err(ParseError::NotOneOf {
                offset,
                value: v as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16_le().unwrap(), 0x0302);
        assert_eq!(r.read_u32_le().unwrap(), 0x07060504);
        assert!(r.is_empty());
    }

    #[test]
    fn varsize_escalates_at_0xff() {
        let data = [0x42];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_varsize().unwrap(), 0x42);

        let data = [0xFF, 0x01, 0x02, 0x03, 0x04];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_varsize().unwrap(), 0x04030201);

        let data = [0xFE];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_varsize().unwrap(), 0xFE);
    }

    #[test]
    fn reads_string() {
        let data = [0x05, b'h', b'e', b'l', b'l', b'o'];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_string().unwrap(), "hello");
    }

    #[test]
    fn rejects_non_canonical_bool() {
        let data = [0x02];
        let mut r = ByteReader::new(&data);
        let err = r.read_bool().unwrap_err();
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn expect_bytes_reports_mismatch() {
        let data = [0x20];
        let mut r = ByteReader::new(&data);
        assert!(r.expect_bytes(&[0x21]).is_err());
    }

    #[test]
    fn mapped_u8_rejects_out_of_range() {
        let table = [10u8, 20, 30];
        let data = [0x05];
        let mut r = ByteReader::new(&data);
        assert!(r.read_mapped_u8(&table).is_err());

        let data = [0x01];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_mapped_u8(&table).unwrap(), 20);
    }
}
