pub mod context;
pub mod entities;
pub mod entity;
pub mod fields;
pub mod library;
pub mod link_resolver;
pub mod objects;
pub mod prototype_index;
pub mod reader;
pub mod types;

pub use context::DecodeContext;
pub use entity::{decode_entity, DecodedEntity};
pub use library::{decode_library, LibraryDecode};
pub use prototype_index::{Kind, PrototypeEntry, PrototypeIndex};
pub use reader::ByteReader;
pub use types::{Color, Direction, Position, PositionTracker, Version};
