//! Belts, loaders, containers and inserters (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entity::read_direction;
use crate::codec::fields;
use crate::codec::prototype_index::Kind;
use crate::codec::reader::ByteReader;
use crate::codec::types::gates;
use crate::error::{ParseError, Result};
use crate::value::{Dict, Value};

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "container" => container(reader, ctx, attrs),
        "infinity-container" => infinity_container(reader, ctx, attrs),
        "logistic-container" => logistic_container(reader, ctx, attrs),
        "storage-tank" => storage_tank(reader, attrs),
        "transport-belt" => transport_belt(reader, ctx, attrs),
        "underground-belt" => underground_belt(reader, attrs),
        "splitter" => splitter(reader, ctx, attrs),
        "loader" | "loader-1x1" => loader(reader, ctx, attrs),
        "linked-belt" => linked_belt(reader, attrs),
        "linked-container" => linked_container(reader, ctx, attrs),
        "inserter" => inserter(reader, ctx, attrs),
        _ => unreachable!("dispatched only for transport-family classes"),
    }
}

const NO_BAR_LIMIT: u16 = 0xFFFF;

fn read_bar(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let bar = reader.read_u16_le()?;
    if bar != NO_BAR_LIMIT {
        attrs.insert("bar".into(), Value::from(bar));
    }
    Ok(())
}

fn container(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    read_bar(reader, attrs)?;
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

const INFINITY_FILTER_MODES: [&str; 3] = ["at-least", "at-most", "exactly"];

fn infinity_container(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    read_bar(reader, attrs)?;

    let count = reader.read_count8()?;
    let mut filters = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = reader.read_u8()?;
        let item_id = reader.read_u16_le()?;
        let amount = reader.read_u32_le()?;
        let mode = reader.read_mapped_u8(&INFINITY_FILTER_MODES)?;
        let name = ctx
            .prototypes
            .item_name(item_id)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let mut filter = Dict::new();
        filter.insert("index".into(), Value::from(index as u32));
        filter.insert("name".into(), Value::from(name));
        filter.insert("count".into(), Value::from(amount));
        filter.insert("mode".into(), Value::from(mode));
        filters.push(Value::Dict(filter));
    }
    if !filters.is_empty() {
        let mut settings = Dict::new();
        settings.insert("filters".into(), Value::List(filters));
        let remove_unfiltered = reader.read_bool()?;
        if remove_unfiltered {
            settings.insert("remove_unfiltered_items".into(), Value::Bool(true));
        }
        attrs.insert("infinity_settings".into(), Value::Dict(settings));
    } else {
        let remove_unfiltered = reader.read_bool()?;
        if remove_unfiltered {
            let mut settings = Dict::new();
            settings.insert("remove_unfiltered_items".into(), Value::Bool(true));
            attrs.insert("infinity_settings".into(), Value::Dict(settings));
        }
    }

    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn logistic_container(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    read_bar(reader, attrs)?;

    let logistic_mode = reader.read_u8()?;
    reader.expect_u8(0x03)?;
    let filters = fields::read_filters(reader, ctx, Kind::Item)?;
    if !filters.is_empty() {
        attrs.insert("request_filters".into(), Value::List(filters));
    }

    let surfaces_request_from_buffers = if ctx.at_least(gates::STABLE_V_1_1) {
        true
    } else {
        matches!(logistic_mode, 2 | 3 | 5)
    };
    if surfaces_request_from_buffers {
        let requests = reader.read_bool()?;
        if requests {
            attrs.insert("request_from_buffers".into(), Value::Bool(true));
        }
    }

    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn storage_tank(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    Ok(())
}

fn transport_belt(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_condition".into(), condition);
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}

const BELT_IO_TYPES: [&str; 2] = ["input", "output"];

fn underground_belt(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    let io_type = reader.read_mapped_u8(&BELT_IO_TYPES)?;
    attrs.insert("type".into(), Value::from(io_type));
    Ok(())
}

/// (code, input_priority, output_priority) per SPEC_FULL.md §4.D, calibrated
/// against the documented 0x3F scenario (both "left").
const SPLITTER_CODES: [(u8, Option<&str>, Option<&str>); 9] = [
    (0x00, None, None),
    (0x10, Some("left"), None),
    (0x13, Some("right"), None),
    (0x20, None, Some("left")),
    (0x2C, None, Some("right")),
    (0x30, Some("left"), Some("right")),
    (0x33, Some("right"), Some("left")),
    (0x3C, Some("right"), Some("right")),
    (0x3F, Some("left"), Some("left")),
];

fn splitter(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }

    let offset = reader.position();
    let code = reader.read_u8()?;
    let (_, input_priority, output_priority) = SPLITTER_CODES
        .iter()
        .find(|(c, _, _)| *c == code)
        .copied()
        .ok_or(ParseError::NotOneOf {
            offset,
            value: code as u64,
        })?;
    if let Some(side) = input_priority {
        attrs.insert("input_priority".into(), Value::from(side));
    }
    if let Some(side) = output_priority {
        attrs.insert("output_priority".into(), Value::from(side));
    }

    let filter_item_id = reader.read_u16_le()?;
    if filter_item_id != 0 {
        let name = ctx
            .prototypes
            .item_name(filter_item_id)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        attrs.insert("filter".into(), Value::from(name));
    }
    Ok(())
}

fn loader(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    let io_type = reader.read_mapped_u8(&BELT_IO_TYPES)?;
    attrs.insert("type".into(), Value::from(io_type));
    let filters = fields::read_filters(reader, ctx, Kind::Item)?;
    if !filters.is_empty() {
        attrs.insert("filters".into(), Value::List(filters));
    }
    Ok(())
}

fn linked_belt(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    let io_type = reader.read_mapped_u8(&BELT_IO_TYPES)?;
    attrs.insert("type".into(), Value::from(io_type));
    let link_id = reader.read_u32_le()?;
    if link_id != 0 {
        attrs.insert("link_id".into(), Value::from(link_id));
    }
    Ok(())
}

fn linked_container(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    read_bar(reader, attrs)?;
    let link_id = reader.read_u32_le()?;
    if link_id != 0 {
        attrs.insert("link_id".into(), Value::from(link_id));
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn read_vector(reader: &mut ByteReader) -> Result<Value> {
    let x = reader.read_f64_le()?;
    let y = reader.read_f64_le()?;
    let mut dict = Dict::new();
    dict.insert("x".into(), Value::from(x));
    dict.insert("y".into(), Value::from(y));
    Ok(Value::Dict(dict))
}

fn inserter(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }

    attrs.insert("pickup_position".into(), read_vector(reader)?);
    attrs.insert("drop_position".into(), read_vector(reader)?);

    let offset = reader.position();
    let flags = reader.read_u8()?;
    if flags & 0x04 == 0 {
        return Err(ParseError::custom(offset, "inserter flag byte missing required bit 0x04"));
    }
    if flags & !0x07 != 0 {
        return Err(ParseError::custom(offset, "inserter flag byte has unexpected bits set"));
    }
    let override_stack_size = flags & 0x01 != 0;
    let whitelist = flags & 0x02 != 0;

    if override_stack_size {
        let stack_size = reader.read_u8()?;
        attrs.insert("override_stack_size".into(), Value::from(stack_size));
    }
    if !whitelist {
        attrs.insert("filter_mode".into(), Value::from("blacklist"));
    }

    let filters = fields::read_filters(reader, ctx, Kind::Item)?;
    if !filters.is_empty() {
        attrs.insert("filters".into(), Value::List(filters));
    }

    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_condition".into(), condition);
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}
