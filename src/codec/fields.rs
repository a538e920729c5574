//! Shared field readers used across most of the ~60 entity variant
//! decoders: signals, conditions, the property tree, icons, filters, item
//! maps, and circuit connections (SPEC_FULL.md §4.C).

use crate::codec::context::DecodeContext;
use crate::codec::prototype_index::Kind;
use crate::codec::reader::ByteReader;
use crate::error::Result;
use crate::value::{Dict, Value};

/// `{type, name}` identifying an item/fluid/virtual signal. ID 0 means
/// absent, which most callers suppress rather than emit as `null`.
pub fn read_signal(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Option<Value>> {
    let kind_byte = reader.read_u8()?;
    let id = reader.read_u16_le()?;
    if id == 0 {
        return Ok(None);
    }
    let (type_name, name) = match kind_byte {
        0 => ("item", ctx.prototypes.item_name(id)),
        1 => ("fluid", ctx.prototypes.fluid_name(id)),
        _ => ("virtual", ctx.prototypes.virtual_signal_name(id)),
    };
    let mut dict = Dict::new();
    dict.insert("type".into(), Value::from(type_name));
    dict.insert("name".into(), Value::from(name.unwrap_or("unknown").to_string()));
    Ok(Some(Value::Dict(dict)))
}

/// Comparator operand order as encoded by the 1-byte index; `<` occupies
/// index 0 so the default condition (comparator `<`) is index 0, matching
/// SPEC_FULL.md §3's stated default.
const COMPARATORS: [&str; 6] = ["<", ">", "=", ">=", "<=", "!="];

pub fn read_comparator(reader: &mut ByteReader) -> Result<&'static str> {
    reader.read_mapped_u8(&COMPARATORS)
}

/// A circuit condition. Suppressed entirely (returns `None`) when both
/// signals are absent, the comparator is `<`, and the constant is 0 - the
/// documented default (SPEC_FULL.md §3).
pub fn read_condition(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Option<Value>> {
    let comparator = read_comparator(reader)?;
    let first_signal = read_signal(reader, ctx)?;
    let second_signal = read_signal(reader, ctx)?;
    let constant = reader.read_i32_le()?;
    let use_constant = reader.read_bool()?;

    if first_signal.is_none() && second_signal.is_none() && comparator == "<" && constant == 0 {
        return Ok(None);
    }

    let mut dict = Dict::new();
    if let Some(sig) = first_signal {
        dict.insert("first_signal".into(), sig);
    }
    if use_constant {
        dict.insert("constant".into(), Value::from(constant));
    } else if let Some(sig) = second_signal {
        dict.insert("second_signal".into(), sig);
    }
    dict.insert("comparator".into(), Value::from(comparator));
    Ok(Some(Value::Dict(dict)))
}

/// A condition followed by the logistic-network-connect flag used by some
/// wait conditions and circuit-controlled recipes.
pub fn read_condition_with_logistic_connection(
    reader: &mut ByteReader,
    ctx: &DecodeContext,
) -> Result<Value> {
    let condition = read_condition(reader, ctx)?;
    let connect = reader.read_bool()?;
    let mut dict = match condition {
        Some(Value::Dict(d)) => d,
        _ => Dict::new(),
    };
    if connect {
        dict.insert("connect_to_logistic_network".into(), Value::Bool(true));
    }
    Ok(Value::Dict(dict))
}

/// Reads one colour's worth of circuit-connection peers: a 1-byte count,
/// then `{raw_entity_id, circuit_id, 0xFF trailer}` per peer. The
/// `entity_id` key is filled with the *raw* id; the link resolver
/// (SPEC_FULL.md §4.G) rewrites it to an entity number after the full
/// entity list is known.
fn read_connection_peers(reader: &mut ByteReader) -> Result<Vec<Value>> {
    let count = reader.read_u8()?;
    let mut peers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let raw_entity_id = reader.read_u32_le()?;
        let circuit_id = reader.read_u8()?;
        reader.expect_u8(0xFF)?;
        let mut dict = Dict::new();
        dict.insert("entity_id".into(), Value::from(raw_entity_id));
        dict.insert("circuit_id".into(), Value::from(circuit_id));
        peers.push(Value::Dict(dict));
    }
    Ok(peers)
}

/// One connection point: independent red/green peer lists, followed by 9
/// fixed zero bytes whose meaning is undocumented.
fn read_connection_point(reader: &mut ByteReader) -> Result<Option<Value>> {
    let red = read_connection_peers(reader)?;
    let green = read_connection_peers(reader)?;
    reader.ignore(9, "connection point reserved")?;

    if red.is_empty() && green.is_empty() {
        return Ok(None);
    }
    let mut dict = Dict::new();
    if !red.is_empty() {
        dict.insert("red".into(), Value::List(red));
    }
    if !green.is_empty() {
        dict.insert("green".into(), Value::List(green));
    }
    Ok(Some(Value::Dict(dict)))
}

/// Circuit connections for an entity with a single connection point
/// (everything except the two-circuit combinators), wrapped under key "1"
/// as the export format does.
pub fn read_connections_single(reader: &mut ByteReader) -> Result<Option<Value>> {
    let point = read_connection_point(reader)?;
    match point {
        None => Ok(None),
        Some(p) => {
            let mut dict = Dict::new();
            dict.insert("1".into(), p);
            Ok(Some(Value::Dict(dict)))
        }
    }
}

/// Circuit connections for a two-circuit combinator: independent "1"
/// (input) and "2" (output) connection points.
pub fn read_connections_dual(reader: &mut ByteReader) -> Result<Option<Value>> {
    let first = read_connection_point(reader)?;
    let second = read_connection_point(reader)?;
    if first.is_none() && second.is_none() {
        return Ok(None);
    }
    let mut dict = Dict::new();
    if let Some(p) = first {
        dict.insert("1".into(), p);
    }
    if let Some(p) = second {
        dict.insert("2".into(), p);
    }
    Ok(Some(Value::Dict(dict)))
}

/// 1-based filter list (container filters, belt filters, ...). A 0 item id
/// means the slot is unset and is suppressed from the output list.
pub fn read_filters(reader: &mut ByteReader, ctx: &DecodeContext, kind: Kind) -> Result<Vec<Value>> {
    let count = reader.read_u8()?;
    let mut filters = Vec::new();
    for i in 0..count {
        let id = reader.read_u16_le()?;
        if id == 0 {
            continue;
        }
        let name = ctx
            .prototypes
            .lookup(kind, id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let mut dict = Dict::new();
        dict.insert("index".into(), Value::from((i + 1) as u32));
        dict.insert("name".into(), Value::from(name));
        filters.push(Value::Dict(dict));
    }
    Ok(filters)
}

/// 0-based filter list, as used by deconstruction/upgrade planners
/// (SPEC_FULL.md §8 "a deliberate asymmetry").
pub fn read_zero_based_filters(
    reader: &mut ByteReader,
    ctx: &DecodeContext,
    kind: Kind,
) -> Result<Vec<Value>> {
    let count = reader.read_u8()?;
    let mut filters = Vec::new();
    for i in 0..count {
        let id = reader.read_u16_le()?;
        if id == 0 {
            continue;
        }
        let name = ctx
            .prototypes
            .lookup(kind, id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let mut dict = Dict::new();
        dict.insert("index".into(), Value::from(i as u32));
        dict.insert("name".into(), Value::from(name));
        filters.push(Value::Dict(dict));
    }
    Ok(filters)
}

/// Module/fuel/ammo item map: a count of `{item_id, count}` pairs, grouped
/// by item name (repeats of the same item accumulate).
pub fn read_items_map(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Dict> {
    let count = reader.read_u32_le()?;
    let mut items = Dict::new();
    for _ in 0..count {
        let item_id = reader.read_u16_le()?;
        let amount = reader.read_u32_le()?;
        let name = ctx
            .prototypes
            .item_name(item_id)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let existing = items.get(&name).and_then(Value::as_f64).unwrap_or(0.0);
        items.insert(name, Value::from(existing + amount as f64));
    }
    Ok(items)
}

/// Icons: a leading list of placeholder names for icons whose referenced
/// prototype no longer exists, then the 4-slot icon list proper.
pub fn read_icons(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Vec<Value>> {
    let placeholder_count = reader.read_u8()?;
    let mut placeholders = std::collections::HashMap::new();
    for _ in 0..placeholder_count {
        let index = reader.read_u8()?;
        let name = reader.read_string()?;
        placeholders.insert(index, name);
    }

    let mut icons = Vec::new();
    for slot in 1..=4u8 {
        let kind_byte = reader.read_u8()?;
        let id = reader.read_u16_le()?;
        if id == 0 {
            continue;
        }
        let type_name = match kind_byte {
            0 => "item",
            1 => "fluid",
            _ => "virtual",
        };
        let name = placeholders.get(&slot).cloned().unwrap_or_else(|| {
            let kind = match kind_byte {
                0 => Kind::Item,
                1 => Kind::Fluid,
                _ => Kind::VirtualSignal,
            };
            ctx.prototypes
                .lookup(kind, id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let mut signal = Dict::new();
        signal.insert("type".into(), Value::from(type_name));
        signal.insert("name".into(), Value::from(name));

        let mut icon = Dict::new();
        icon.insert("index".into(), Value::from(slot as u32));
        icon.insert("signal".into(), Value::Dict(signal));
        icons.push(Value::Dict(icon));
    }
    Ok(icons)
}

/// Reads a property tree value: a type tag, an ignored boolean flag, then
/// the type's payload (SPEC_FULL.md §4.C, §9 "Property tree as a sum
/// type"). Used for entity tags and for nothing else in the wire format.
pub fn read_property_tree(reader: &mut ByteReader) -> Result<Value> {
    let tag = reader.read_u8()?;
    let _any_type_flag = reader.read_bool()?;
    match tag {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(reader.read_bool()?)),
        2 => Ok(Value::Number(reader.read_f64_le()?)),
        3 => Ok(Value::String(reader.read_string_maybe_empty()?)),
        4 => {
            let count = reader.read_u32_le()?;
            let mut list = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let _key = reader.read_string_maybe_empty()?;
                list.push(read_property_tree(reader)?);
            }
            Ok(Value::List(list))
        }
        5 => {
            let count = reader.read_u32_le()?;
            let mut dict = Dict::new();
            for _ in 0..count {
                let key = reader.read_string_maybe_empty()?;
                dict.insert(key, read_property_tree(reader)?);
            }
            Ok(Value::Dict(dict))
        }
        other => Err(crate::error::ParseError::NotOneOf {
            offset: reader.position(),
            value: other as u64,
        }),
    }
}

/// Reads the entity-frame trailer shared by every variant: an items map and
/// an optional tags dictionary (SPEC_FULL.md §4.D "Common trailer").
pub fn read_entity_trailer(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let items = read_items_map(reader, ctx)?;
    if !items.is_empty() {
        attrs.insert("items".into(), Value::Dict(items));
    }
    let has_tags = reader.read_bool()?;
    if has_tags {
        attrs.insert("tags".into(), read_property_tree(reader)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::prototype_index::PrototypeIndex;

    fn ctx(protos: &PrototypeIndex) -> DecodeContext {
        DecodeContext::new(crate::codec::types::Version::new(1, 1, 100, 0), false, false, protos)
    }

    #[test]
    fn default_condition_is_suppressed() {
        let protos = PrototypeIndex::new();
        let c = ctx(&protos);
        // comparator=0 ("<"), no signals, constant 0, use_constant=true
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01];
        let mut r = ByteReader::new(&data);
        assert!(read_condition(&mut r, &c).unwrap().is_none());
    }

    #[test]
    fn non_default_condition_is_kept() {
        let protos = PrototypeIndex::new();
        let c = ctx(&protos);
        // comparator=1 (">"), no signals, constant=5, use_constant=true
        let data = [0x01, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x01];
        let mut r = ByteReader::new(&data);
        let cond = read_condition(&mut r, &c).unwrap().unwrap();
        let dict = cond.as_dict().unwrap();
        assert_eq!(dict.get("comparator").unwrap().as_str(), Some(">"));
        assert_eq!(dict.get("constant").unwrap().as_f64(), Some(5.0));
    }

    #[test]
    fn signal_id_zero_is_absent() {
        let protos = PrototypeIndex::new();
        let c = ctx(&protos);
        let data = [0x00, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        assert!(read_signal(&mut r, &c).unwrap().is_none());
    }

    #[test]
    fn connection_peers_round_trip() {
        let data = [
            0x01, // 1 red peer
            0x2A, 0x00, 0x00, 0x00, // raw id 42
            0x01, // circuit_id 1
            0xFF, // trailer
            0x00, // 0 green peers
            0, 0, 0, 0, 0, 0, 0, 0, 0, // 9 reserved bytes
        ];
        let mut r = ByteReader::new(&data);
        let point = read_connection_point(&mut r).unwrap().unwrap();
        let dict = point.as_dict().unwrap();
        let red = dict.get("red").unwrap().as_list().unwrap();
        assert_eq!(red.len(), 1);
        let peer = red[0].as_dict().unwrap();
        assert_eq!(peer.get("entity_id").unwrap().as_u32(), Some(42));
        assert!(r.is_empty());
    }

    #[test]
    fn property_tree_dictionary_round_trip() {
        // tag=5 (dict), flag, count=1, key="a" (non-empty), value: tag=2 (number), flag, f64=3.5
        let mut data = vec![5u8, 0, 1, 0, 0, 0, 0, 1, b'a'];
        data.push(2);
        data.push(0);
        data.extend_from_slice(&3.5f64.to_le_bytes());
        let mut r = ByteReader::new(&data);
        let value = read_property_tree(&mut r).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.get("a").unwrap().as_f64(), Some(3.5));
    }
}
