//! Top-level library orchestration (SPEC_FULL.md §4.F): version, migrations,
//! the global prototype index, and the slot list. On output the library is
//! presented as a synthetic blueprint-book (SPEC_FULL.md §3 "Library slot").

use crate::codec::context::DecodeContext;
use crate::codec::objects;
use crate::codec::prototype_index::{Kind, PrototypeIndex};
use crate::codec::reader::ByteReader;
use crate::codec::types::Version;
use crate::error::{ParseError, Result};
use crate::value::{Dict, Value};

/// A (mod-name, migration-file) pair. Read and carried through only for
/// `--extended` output; never consulted otherwise (SPEC_FULL.md §GLOSSARY
/// "Migration").
pub fn read_migrations(reader: &mut ByteReader) -> Result<Vec<(String, String)>> {
    let count = reader.read_count8()?;
    let mut migrations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mod_name = reader.read_string()?;
        let migration_file = reader.read_string()?;
        migrations.push((mod_name, migration_file));
    }
    Ok(migrations)
}

fn migrations_to_value(migrations: &[(String, String)]) -> Value {
    Value::List(
        migrations
            .iter()
            .map(|(mod_name, migration_file)| {
                let mut d = Dict::new();
                d.insert("mod_name".into(), Value::from(mod_name.clone()));
                d.insert("migration_file".into(), Value::from(migration_file.clone()));
                Value::Dict(d)
            })
            .collect(),
    )
}

/// Expected item prototype class for each slot `kind_tag` (SPEC_FULL.md §6
/// "Slot").
fn expected_item_class(kind_tag: u8) -> Option<&'static str> {
    match kind_tag {
        0 => Some("blueprint"),
        1 => Some("blueprint-book"),
        2 => Some("deconstruction-item"),
        3 => Some("upgrade-item"),
        _ => None,
    }
}

/// Reads a slot list: a `u32` count, then per slot a `used` flag and - if
/// used - a kind tag, generation, item id, and the object body dispatched by
/// kind. Shared by the library decoder and `read_blueprint_book`
/// (SPEC_FULL.md §4.E "Blueprint-book"). A blueprint slot that was skipped
/// under `skip_bad` (SPEC_FULL.md §9 "Skip-bad recovery") is simply omitted
/// from the returned list; the skip itself is recorded on `ctx`.
pub fn read_slots(reader: &mut ByteReader, ctx: &mut DecodeContext) -> Result<Vec<Value>> {
    let slot_count = reader.read_count32()?;
    let mut slots = Vec::new();
    for index in 0..slot_count {
        let used = reader.read_bool()?;
        if !used {
            continue;
        }

        let kind_tag = reader.read_u8()?;
        let expected_class = expected_item_class(kind_tag)
            .ok_or_else(|| ParseError::custom(reader.position(), format!("unknown slot kind tag {kind_tag}")))?;
        let _generation = reader.read_u32_le()?;
        let item_id = reader.read_u16_le()?;
        match ctx.prototypes.lookup(Kind::Item, item_id) {
            Some(entry) if entry.class == expected_class => {}
            _ => {
                return Err(ParseError::custom(
                    reader.position(),
                    format!("slot item id {item_id} does not classify as {expected_class}"),
                ))
            }
        }

        let mut slot = Dict::new();
        match kind_tag {
            0 => match objects::read_blueprint(reader, ctx)? {
                Some(blueprint) => slot.insert("blueprint".into(), Value::Dict(blueprint)),
                None => continue,
            },
            1 => slot.insert(
                "blueprint_book".into(),
                Value::Dict(objects::read_blueprint_book(reader, ctx)?),
            ),
            2 => slot.insert(
                "deconstruction_planner".into(),
                Value::Dict(objects::read_deconstruction_planner(reader, ctx)?),
            ),
            3 => slot.insert(
                "upgrade_planner".into(),
                Value::Dict(objects::read_upgrade_planner(reader, ctx)?),
            ),
            _ => unreachable!("validated by expected_item_class above"),
        };
        slot.insert("index".into(), Value::from(index));
        slots.push(Value::Dict(slot));
    }
    Ok(slots)
}

/// Result of decoding a whole library file: the synthetic blueprint-book
/// document plus how many blueprint slots were skipped (SPEC_FULL.md §6
/// "CLI exit codes").
pub struct LibraryDecode {
    pub document: Dict,
    pub skipped: u32,
}

/// Decodes a whole library file (SPEC_FULL.md §4.F). `filename` is folded
/// into the synthetic book's description purely for human orientation; it
/// has no bearing on parsing.
pub fn decode_library(reader: &mut ByteReader, filename: &str, skip_bad: bool, extended: bool) -> Result<LibraryDecode> {
    let version = Version::read(reader)?;
    reader.expect_u8(0x00)?;
    let migrations = read_migrations(reader)?;
    let prototypes = PrototypeIndex::read(reader)?;
    reader.ignore(1, "library state")?;
    reader.expect_u8(0x00)?;
    let generation = reader.read_u32_le()?;
    let timestamp = reader.read_u32_le()?;
    reader.expect_u8(0x01)?;

    let mut ctx = DecodeContext::new(version, skip_bad, extended, &prototypes);
    let slots = read_slots(reader, &mut ctx)?;

    let mut document = Dict::new();
    document.insert("version".into(), Value::from(version.to_triple_string()));
    document.insert(
        "description".into(),
        Value::from(format!(
            "library generation {generation}, saved {timestamp}, from {filename}"
        )),
    );
    document.insert("active_index".into(), Value::from(0u32));
    if !slots.is_empty() {
        document.insert("blueprints".into(), Value::List(slots));
    }
    if extended {
        if !migrations.is_empty() {
            document.insert("migrations".into(), migrations_to_value(&migrations));
        }
        document.insert("prototypes".into(), prototypes.to_value());
    }

    Ok(LibraryDecode {
        document,
        skipped: ctx.skips.get(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_library_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&1u16.to_le_bytes()); // major
        out.extend_from_slice(&0u16.to_le_bytes()); // minor
        out.extend_from_slice(&0u16.to_le_bytes()); // patch
        out.extend_from_slice(&0u16.to_le_bytes()); // build
        out.push(0x00);
        out.push(0); // migrations count8 = 0
        out.extend_from_slice(&0u16.to_le_bytes()); // prototype class count16 = 0
        out.push(0x00); // library state (ignored)
        out.push(0x00);
        out.extend_from_slice(&0u32.to_le_bytes()); // generation
        out.extend_from_slice(&0u32.to_le_bytes()); // timestamp
        out.push(0x01);
        out.extend_from_slice(&0u32.to_le_bytes()); // slot count
        out
    }

    #[test]
    fn empty_library_decodes_to_empty_book() {
        let data = empty_library_bytes();
        let mut reader = ByteReader::new(&data);
        let result = decode_library(&mut reader, "blueprint-storage.dat", false, false).unwrap();
        assert_eq!(result.skipped, 0);
        assert_eq!(result.document.get("version").unwrap().as_str(), Some("1.0.0"));
        assert!(result.document.get("blueprints").is_none());
        assert!(reader.is_empty());
    }
}
