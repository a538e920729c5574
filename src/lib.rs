//! Decoder for a factory-automation game's personal blueprint library file.
//!
//! The core binary decoder lives under [`codec`]; [`blueprint_string`] is an
//! independent codec for the game's textual import/export strings.

pub mod blueprint_string;
pub mod codec;
pub mod error;
pub mod value;

pub use codec::{decode_library, ByteReader, DecodeContext, LibraryDecode, PrototypeIndex};
pub use error::{ParseError, Result};
pub use value::{Dict, Value};

/// Decodes a whole library file already read into memory. `filename` is
/// folded into the synthetic blueprint-book's description only
/// (SPEC_FULL.md §4.F); it has no bearing on parsing.
pub fn decode_library_bytes(data: &[u8], filename: &str, skip_bad: bool, extended: bool) -> Result<LibraryDecode> {
    let mut reader = ByteReader::new(data);
    decode_library(&mut reader, filename, skip_bad, extended)
}
