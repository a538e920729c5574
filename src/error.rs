/// Every parse failure in the decoder carries the byte offset at which the
/// stream sat when the problem was detected, so callers can report both the
/// decimal and hex position without re-deriving it.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of data at offset {offset} ({offset:#x})")]
    UnexpectedEof { offset: usize },

    #[error("invalid boolean byte {byte:#04x} at offset {offset} ({offset:#x})")]
    InvalidBool { offset: usize, byte: u8 },

    #[error("expected {expected:?} at offset {offset} ({offset:#x}), found {actual:?}")]
    LiteralMismatch {
        offset: usize,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    #[error("value {value} at offset {offset} ({offset:#x}) is not one of the permitted codes")]
    NotOneOf { offset: usize, value: u64 },

    #[error("unknown prototype class {class:?} at offset {offset} ({offset:#x})")]
    UnknownPrototypeClass { offset: usize, class: String },

    #[error("prototype id {id} already used for kind {kind}")]
    DuplicatePrototypeId { kind: &'static str, id: u16 },

    #[error("prototype id 0 is reserved (absent) at offset {offset} ({offset:#x})")]
    ReservedPrototypeId { offset: usize },

    #[error("unknown entity variant {class:?} at offset {offset} ({offset:#x})")]
    UnknownVariant { offset: usize, class: String },

    #[error("unresolved entity reference {raw_id} at offset {offset} ({offset:#x})")]
    UnresolvedEntityId { offset: usize, raw_id: u32 },

    #[error(
        "declared content size {declared} does not match parsed size {parsed} (content started at offset {offset})"
    )]
    SizeMismatch {
        offset: usize,
        declared: usize,
        parsed: usize,
    },

    #[error("invalid utf-8 string at offset {offset} ({offset:#x})")]
    InvalidUtf8 { offset: usize },

    #[error("string of length {len} exceeds the maximum of {max} bytes at offset {offset}")]
    StringTooLong {
        offset: usize,
        len: usize,
        max: usize,
    },

    #[error("{message} at offset {offset} ({offset:#x})")]
    Custom { offset: usize, message: String },
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEof { offset }
            | Self::InvalidBool { offset, .. }
            | Self::LiteralMismatch { offset, .. }
            | Self::NotOneOf { offset, .. }
            | Self::UnknownPrototypeClass { offset, .. }
            | Self::ReservedPrototypeId { offset }
            | Self::UnknownVariant { offset, .. }
            | Self::UnresolvedEntityId { offset, .. }
            | Self::SizeMismatch { offset, .. }
            | Self::InvalidUtf8 { offset }
            | Self::StringTooLong { offset, .. }
            | Self::Custom { offset, .. } => *offset,
            Self::DuplicatePrototypeId { .. } => 0,
        }
    }

    pub fn custom(offset: usize, message: impl Into<String>) -> Self {
        Self::Custom {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
