use std::collections::HashMap;

use crate::codec::reader::ByteReader;
use crate::error::{ParseError, Result};

/// The coarse bucket a prototype class falls into. Each kind has its own ID
/// space (an ITEM id 3 and an ENTITY id 3 are unrelated prototypes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Item,
    Fluid,
    VirtualSignal,
    Tile,
    Entity,
    Recipe,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::Item => "item",
            Kind::Fluid => "fluid",
            Kind::VirtualSignal => "virtual-signal",
            Kind::Tile => "tile",
            Kind::Entity => "entity",
            Kind::Recipe => "recipe",
        }
    }
}

/// Classifies a prototype-class string (as written in the file's embedded
/// table) into a [`Kind`]. `flying-text` is a deliberate special case: it
/// carries placeholder names for entities whose owning mod was removed, and
/// the game files it under ENTITY so link resolution still finds a name.
fn classify_class(class: &str) -> Option<Kind> {
    match class {
        "item" | "item-with-entity-data" | "ammo" | "gun" | "capsule" | "armor" | "module"
        | "tool" | "mining-tool" | "repair-tool" | "rail-planner" | "spidertron-remote"
        | "item-with-label" | "item-with-inventory" | "blueprint-book" | "blueprint"
        | "upgrade-item" | "deconstruction-item" | "selection-tool" | "copy-paste-tool" => {
            Some(Kind::Item)
        }
        "fluid" => Some(Kind::Fluid),
        "virtual-signal" => Some(Kind::VirtualSignal),
        "tile" => Some(Kind::Tile),
        "recipe" => Some(Kind::Recipe),
        "flying-text" => Some(Kind::Entity),
        other if ENTITY_CLASSES.contains(&other) => Some(Kind::Entity),
        _ => None,
    }
}

/// Vanilla entity prototype classes. Not exhaustive of every class the game
/// ships, but covers every variant this decoder dispatches on (SPEC_FULL.md
/// §4.D) plus the common non-dispatched ones (resource, tree, ...).
const ENTITY_CLASSES: &[&str] = &[
    "container",
    "logistic-container",
    "infinity-container",
    "storage-tank",
    "transport-belt",
    "underground-belt",
    "splitter",
    "loader",
    "loader-1x1",
    "linked-belt",
    "linked-container",
    "inserter",
    "electric-pole",
    "power-switch",
    "pipe",
    "pipe-to-ground",
    "infinity-pipe",
    "pump",
    "offshore-pump",
    "straight-rail",
    "curved-rail",
    "train-stop",
    "rail-signal",
    "rail-chain-signal",
    "locomotive",
    "cargo-wagon",
    "fluid-wagon",
    "artillery-wagon",
    "roboport",
    "lamp",
    "arithmetic-combinator",
    "decider-combinator",
    "constant-combinator",
    "programmable-speaker",
    "boiler",
    "generator",
    "solar-panel",
    "accumulator",
    "reactor",
    "heat-pipe",
    "heat-interface",
    "burner-generator",
    "mining-drill",
    "furnace",
    "assembling-machine",
    "lab",
    "beacon",
    "land-mine",
    "wall",
    "gate",
    "ammo-turret",
    "electric-turret",
    "fluid-turret",
    "artillery-turret",
    "radar",
    "rocket-silo",
    "electric-energy-interface",
    "resource",
    "tree",
    "simple-entity",
    "simple-entity-with-owner",
    "simple-entity-with-force",
    "fish",
    "cliff",
    "corpse",
    "character-corpse",
    "rail-remnants",
    "item-entity",
    "deconstructible-tile-proxy",
];

#[derive(Debug, Clone)]
pub struct PrototypeEntry {
    pub class: String,
    pub name: String,
}

/// ID→name maps built from the file's embedded prototype table. One
/// instance is the file-wide (global) index; a blueprint saved with
/// since-removed mods additionally carries its own local index, consulted
/// first when resolving that blueprint's names.
#[derive(Debug, Clone, Default)]
pub struct PrototypeIndex {
    tables: HashMap<Kind, HashMap<u16, PrototypeEntry>>,
}

impl PrototypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` under `kind` with the given `class`/`name`. ID 0 is
    /// reserved to mean "absent" and is rejected; a duplicate ID within a
    /// kind is rejected (SPEC_FULL.md §3 "Prototype index" invariant).
    pub fn add(&mut self, offset: usize, kind: Kind, id: u16, class: &str, name: String) -> Result<()> {
        if id == 0 {
            return Err(ParseError::ReservedPrototypeId { offset });
        }
        let table = self.tables.entry(kind).or_default();
        if table.contains_key(&id) {
            return Err(ParseError::DuplicatePrototypeId { kind: kind.label(), id });
        }
        table.insert(
            id,
            PrototypeEntry {
                class: class.to_string(),
                name,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, kind: Kind, id: u16) -> Option<&PrototypeEntry> {
        if id == 0 {
            return None;
        }
        self.tables.get(&kind)?.get(&id)
    }

    pub fn entity_class(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::Entity, id).map(|e| e.class.as_str())
    }

    pub fn entity_name(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::Entity, id).map(|e| e.name.as_str())
    }

    pub fn item_name(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::Item, id).map(|e| e.name.as_str())
    }

    pub fn fluid_name(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::Fluid, id).map(|e| e.name.as_str())
    }

    pub fn virtual_signal_name(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::VirtualSignal, id).map(|e| e.name.as_str())
    }

    pub fn tile_name(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::Tile, id).map(|e| e.name.as_str())
    }

    pub fn recipe_name(&self, id: u16) -> Option<&str> {
        self.lookup(Kind::Recipe, id).map(|e| e.name.as_str())
    }

    /// Builds the extended-mode (`-x`) representation of the whole table,
    /// grouped by kind label, for inclusion in the export document.
    pub fn to_value(&self) -> crate::value::Value {
        use crate::value::{Dict, Value};
        let mut by_kind = Dict::new();
        let kinds = [
            Kind::Item,
            Kind::Fluid,
            Kind::VirtualSignal,
            Kind::Tile,
            Kind::Entity,
            Kind::Recipe,
        ];
        for kind in kinds {
            let Some(table) = self.tables.get(&kind) else { continue };
            let mut ids: Vec<_> = table.keys().copied().collect();
            ids.sort_unstable();
            let entries: Vec<Value> = ids
                .into_iter()
                .map(|id| {
                    let entry = &table[&id];
                    let mut d = Dict::new();
                    d.insert("id".into(), Value::from(id as u32));
                    d.insert("class".into(), Value::from(entry.class.clone()));
                    d.insert("name".into(), Value::from(entry.name.clone()));
                    Value::Dict(d)
                })
                .collect();
            if !entries.is_empty() {
                by_kind.insert(kind.label().to_string(), Value::List(entries));
            }
        }
        Value::Dict(by_kind)
    }

    /// Reads the file's embedded prototype table (SPEC_FULL.md §4.B):
    /// a 2-byte count of classes, then per class a name string and an inner
    /// id→name list. The inner list's count/id width is 1 byte for the
    /// "tile" class and 2 bytes for every other class - this asymmetry must
    /// be replicated exactly. Every non-tile class also carries a hard
    /// literal `0x00` byte right before its entry count (SPEC_FULL.md §6);
    /// the "tile" class has no such literal.
    pub fn read(reader: &mut ByteReader) -> Result<Self> {
        let mut index = Self::new();
        let class_count = reader.read_count16()?;
        for _ in 0..class_count {
            let class = reader.read_string()?;
            let kind = classify_class(&class).ok_or_else(|| ParseError::UnknownPrototypeClass {
                offset: reader.position(),
                class: class.clone(),
            })?;

            if class == "tile" {
                let entry_count = reader.read_count8()?;
                for _ in 0..entry_count {
                    let offset = reader.position();
                    let id = reader.read_u8()? as u16;
                    let name = reader.read_string()?;
                    index.add(offset, kind, id, &class, name)?;
                }
            } else {
                reader.expect_u8(0x00)?;
                let entry_count = reader.read_count16()?;
                for _ in 0..entry_count {
                    let offset = reader.position();
                    let id = reader.read_count16()?;
                    let name = reader.read_string()?;
                    index.add(offset, kind, id, &class, name)?;
                }
            }
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_file(classes: &[(&str, &[(u32, &str)])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(classes.len() as u16).to_le_bytes());
        for (class, entries) in classes {
            out.push(class.len() as u8);
            out.extend_from_slice(class.as_bytes());
            if *class == "tile" {
                out.push(entries.len() as u8);
                for (id, name) in *entries {
                    out.push(*id as u8);
                    out.push(name.len() as u8);
                    out.extend_from_slice(name.as_bytes());
                }
            } else {
                out.push(0x00); // literal separator before non-tile entry counts
                out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
                for (id, name) in *entries {
                    out.extend_from_slice(&(*id as u16).to_le_bytes());
                    out.push(name.len() as u8);
                    out.extend_from_slice(name.as_bytes());
                }
            }
        }
        out
    }

    #[test]
    fn tile_uses_one_byte_width_others_use_two() {
        let data = build_file(&[
            ("tile", &[(1, "grass-1"), (2, "water")]),
            ("item", &[(1, "iron-plate")]),
        ]);
        let mut r = ByteReader::new(&data);
        let index = PrototypeIndex::read(&mut r).unwrap();
        assert_eq!(index.tile_name(1), Some("grass-1"));
        assert_eq!(index.tile_name(2), Some("water"));
        assert_eq!(index.item_name(1), Some("iron-plate"));
        assert!(r.is_empty());
    }

    #[test]
    fn id_zero_is_rejected() {
        let data = build_file(&[("item", &[(0, "nothing")])]);
        let mut r = ByteReader::new(&data);
        assert!(PrototypeIndex::read(&mut r).is_err());
    }

    #[test]
    fn duplicate_id_within_kind_is_rejected() {
        let data = build_file(&[("item", &[(5, "a"), (5, "b")])]);
        let mut r = ByteReader::new(&data);
        assert!(PrototypeIndex::read(&mut r).is_err());
    }

    #[test]
    fn unknown_class_is_rejected() {
        let data = build_file(&[("made-up-class", &[(1, "x")])]);
        let mut r = ByteReader::new(&data);
        assert!(PrototypeIndex::read(&mut r).is_err());
    }

    #[test]
    fn flying_text_classifies_as_entity() {
        let data = build_file(&[("flying-text", &[(1, "removed-mod-entity")])]);
        let mut r = ByteReader::new(&data);
        let index = PrototypeIndex::read(&mut r).unwrap();
        assert_eq!(index.entity_name(1), Some("removed-mod-entity"));
    }
}
