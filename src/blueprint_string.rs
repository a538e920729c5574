//! Blueprint-string codec (SPEC_FULL.md §4.K): the game's import/export
//! text format, independent of the binary library decoder. A blueprint
//! string is a single version digit followed by base64-encoded,
//! zlib-deflated JSON.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// The version digit prefixing every blueprint string. The game has only
/// ever shipped `0`; a different leading digit is a format this decoder has
/// never seen and can't be confident about, so it's rejected outright.
const BLUEPRINT_STRING_VERSION: u8 = b'0';

#[derive(Debug, thiserror::Error)]
pub enum BlueprintStringError {
    #[error("blueprint string is empty")]
    Empty,

    #[error("unsupported blueprint string version {0:?}")]
    UnsupportedVersion(char),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("zlib decompression failed: {0}")]
    Zlib(std::io::Error),

    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Decodes a blueprint string into its JSON text.
pub fn bp_string_to_json(blueprint_string: &str) -> Result<String, BlueprintStringError> {
    let trimmed = blueprint_string.trim();
    let mut chars = trimmed.chars();
    let version = chars.next().ok_or(BlueprintStringError::Empty)?;
    if version as u32 != BLUEPRINT_STRING_VERSION as u32 {
        return Err(BlueprintStringError::UnsupportedVersion(version));
    }

    let compressed = BASE64_STANDARD.decode(chars.as_str())?;
    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut json_bytes = Vec::new();
    decoder.read_to_end(&mut json_bytes).map_err(BlueprintStringError::Zlib)?;
    Ok(String::from_utf8(json_bytes)?)
}

/// Encodes JSON text into a blueprint string.
pub fn json_to_bp_string(json: &str) -> Result<String, BlueprintStringError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json.as_bytes()).map_err(BlueprintStringError::Zlib)?;
    let compressed = encoder.finish().map_err(BlueprintStringError::Zlib)?;
    let encoded = BASE64_STANDARD.encode(compressed);
    Ok(format!("{}{}", BLUEPRINT_STRING_VERSION as char, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_json() {
        let json = r#"{"blueprint":{"item":"blueprint","label":"x","version":1}}"#;
        let encoded = json_to_bp_string(json).unwrap();
        let decoded = bp_string_to_json(&encoded).unwrap();
        assert_eq!(decoded, json);
    }

    #[test]
    fn rejects_empty_string() {
        assert!(matches!(bp_string_to_json(""), Err(BlueprintStringError::Empty)));
    }

    #[test]
    fn rejects_unknown_version_digit() {
        assert!(matches!(
            bp_string_to_json("9abc"),
            Err(BlueprintStringError::UnsupportedVersion('9'))
        ));
    }
}
