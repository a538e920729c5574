//! Library-slot object decoders: blueprint, blueprint-book, deconstruction
//! and upgrade planners (SPEC_FULL.md §4.E).

use crate::codec::context::DecodeContext;
use crate::codec::entity::decode_entity;
use crate::codec::fields;
use crate::codec::prototype_index::{Kind, PrototypeIndex};
use crate::codec::reader::ByteReader;
use crate::codec::types::{PositionTracker, Version};
use crate::error::{ParseError, Result};
use crate::value::{Dict, Value};

/// Reads a variable-length content-size field: 1 byte, or 0xFF followed by
/// a 4-byte extension (SPEC_FULL.md §6 "Blueprint body").
fn read_content_size(reader: &mut ByteReader) -> Result<usize> {
    reader.read_varsize()
}

fn read_entities(reader: &mut ByteReader, ctx: &mut DecodeContext) -> Result<(Vec<Value>, Vec<(u32, usize)>)> {
    let count = reader.read_u32_le()?;
    let mut tracker = PositionTracker::default();
    let mut entities = Vec::with_capacity(count as usize);
    let mut id_registry = Vec::with_capacity(count as usize);
    for i in 0..count {
        let decoded = decode_entity(reader, ctx, &mut tracker, i + 1)?;
        if let Some(raw_id) = decoded.raw_entity_id {
            id_registry.push((raw_id, i as usize));
        }
        entities.push(Value::Dict(decoded.attrs));
    }
    Ok((entities, id_registry))
}

fn read_tiles(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Vec<Value>> {
    let count = reader.read_u32_le()?;
    let mut tiles = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let tile_id = reader.read_u8()?;
        let x = reader.read_i32_le()?;
        let y = reader.read_i32_le()?;
        let name = ctx
            .prototypes
            .tile_name(tile_id as u16)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let mut dict = Dict::new();
        dict.insert("name".into(), Value::from(name));
        let mut position = Dict::new();
        position.insert("x".into(), Value::from(x));
        position.insert("y".into(), Value::from(y));
        dict.insert("position".into(), Value::Dict(position));
        tiles.push(Value::Dict(dict));
    }
    Ok(tiles)
}

const WAIT_CONDITION_TYPES: [&str; 10] = [
    "time",
    "full",
    "empty",
    "item_count",
    "circuit",
    "inactivity",
    "robots_inactive",
    "fluid_count",
    "passenger_present",
    "passenger_not_present",
];

const COMPARE_TYPES: [&str; 2] = ["and", "or"];

fn read_schedules(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Vec<Value>> {
    let schedule_count = reader.read_u32_le()?;
    let mut schedules = Vec::with_capacity(schedule_count as usize);
    for _ in 0..schedule_count {
        let locomotive_count = reader.read_u32_le()?;
        let mut locomotives = Vec::with_capacity(locomotive_count as usize);
        for _ in 0..locomotive_count {
            locomotives.push(Value::from(reader.read_u32_le()?));
        }

        let station_count = reader.read_u32_le()?;
        let mut stations = Vec::with_capacity(station_count as usize);
        for _ in 0..station_count {
            let station_name = reader.read_string()?;
            let temporary = reader.read_bool()?;

            let condition_count = reader.read_u32_le()?;
            let mut wait_conditions = Vec::with_capacity(condition_count as usize);
            for _ in 0..condition_count {
                let wc_type = reader.read_mapped_u8(&WAIT_CONDITION_TYPES)?;
                let compare_type = reader.read_mapped_u8(&COMPARE_TYPES)?;
                let mut wc = Dict::new();
                wc.insert("type".into(), Value::from(wc_type));
                wc.insert("compare_type".into(), Value::from(compare_type));
                if wc_type == "time" || wc_type == "inactivity" {
                    let ticks = reader.read_u32_le()?;
                    wc.insert("ticks".into(), Value::from(ticks));
                }
                if wc_type == "item_count" || wc_type == "fluid_count" || wc_type == "circuit" {
                    if let Some(condition) = fields::read_condition(reader, ctx)? {
                        wc.insert("condition".into(), condition);
                    }
                }
                wait_conditions.push(Value::Dict(wc));
            }

            let mut station = Dict::new();
            station.insert("station".into(), Value::from(station_name));
            if temporary {
                station.insert("temporary".into(), Value::Bool(true));
                if !ctx.at_least(crate::codec::types::gates::V_1_1_43_0) {
                    reader.ignore(4, "pre-1.1.43 temporary station rail direction placeholder")?;
                } else {
                    let _rail_direction = reader.read_u8()?;
                }
            }
            if !wait_conditions.is_empty() {
                station.insert("wait_conditions".into(), Value::List(wait_conditions));
            }
            stations.push(Value::Dict(station));
        }

        let mut schedule = Dict::new();
        schedule.insert("locomotives".into(), Value::List(locomotives));
        schedule.insert("schedule".into(), Value::List(stations));
        schedules.push(Value::Dict(schedule));
    }
    Ok(schedules)
}

/// Reads a blueprint body's fixed tail (everything after the version):
/// `0x00, migrations, description, snap_to_grid, entities, schedules, tiles, icons`.
fn read_blueprint_content(reader: &mut ByteReader, ctx: &mut DecodeContext) -> Result<Dict> {
    reader.expect_u8(0x00)?;
    super::library::read_migrations(reader)?;
    let description = reader.read_string_maybe_empty()?;
    let snap_to_grid = reader.read_bool()?;

    let mut dict = Dict::new();
    if !description.is_empty() {
        dict.insert("description".into(), Value::from(description));
    }
    if snap_to_grid {
        let grid_x = reader.read_u32_le()?;
        let grid_y = reader.read_u32_le()?;
        let mut grid = Dict::new();
        grid.insert("x".into(), Value::from(grid_x));
        grid.insert("y".into(), Value::from(grid_y));
        dict.insert("snap-to-grid".into(), Value::Dict(grid));
        if ctx.at_least(crate::codec::types::gates::STABLE_V_1_1) {
            let position_relative = reader.read_bool()?;
            if position_relative {
                dict.insert("position-relative-to-grid".into(), Value::Bool(true));
            }
        }
    }

    let (entities, id_registry) = read_entities(reader, ctx)?;
    let schedules = read_schedules(reader, ctx)?;
    let tiles = read_tiles(reader, ctx)?;
    let icons = fields::read_icons(reader, ctx)?;

    if !entities.is_empty() {
        dict.insert("entities".into(), Value::List(entities));
    }
    if !schedules.is_empty() {
        dict.insert("schedules".into(), Value::List(schedules));
    }
    if !tiles.is_empty() {
        dict.insert("tiles".into(), Value::List(tiles));
    }
    if !icons.is_empty() {
        dict.insert("icons".into(), Value::List(icons));
    }

    crate::codec::link_resolver::resolve(&mut dict, &id_registry)?;
    Ok(dict)
}

/// Reads the version and content tail of a blueprint body once the stream
/// is positioned at `content_start`, checking the declared size on the way
/// out. Split out of [`read_blueprint`] so the skip-bad path can catch just
/// this part and still know exactly how far to reseek.
fn read_versioned_content(
    reader: &mut ByteReader,
    ctx: &mut DecodeContext,
    local_index: Option<&PrototypeIndex>,
    content_start: usize,
    content_start_marker: usize,
    content_size: usize,
) -> Result<Dict> {
    let version = Version::read(reader)?;
    let mut body = match local_index {
        Some(local_index) => ctx.with_prototypes(local_index, |scoped| {
            scoped.with_version(version, |scoped| read_blueprint_content(reader, scoped))
        })?,
        None => ctx.with_version(version, |scoped| read_blueprint_content(reader, scoped))?,
    };

    let parsed_content = reader.position() - content_start;
    if parsed_content != content_size {
        return Err(ParseError::SizeMismatch {
            offset: content_start_marker,
            declared: content_size,
            parsed: parsed_content,
        });
    }

    body.insert("version".into(), Value::from(version.to_triple_string()));
    Ok(body)
}

/// Reads a blueprint slot body (SPEC_FULL.md §4.E "Blueprint"). Returns
/// `Ok(None)` when `ctx.skip_bad` is set and the body failed to decode -
/// the caller is expected to count the skip (SPEC_FULL.md §9 "Skip-bad
/// recovery"). `ctx`'s global prototype index is used unless the blueprint
/// carries its own local index (`has_removed_mods`).
pub fn read_blueprint(reader: &mut ByteReader, ctx: &mut DecodeContext) -> Result<Option<Dict>> {
    let label = reader.read_string_maybe_empty()?;
    reader.expect_u8(0x00)?;
    let has_removed_mods = reader.read_bool()?;
    let content_start_marker = reader.position();
    let content_size = read_content_size(reader)?;
    let content_start = reader.position();

    // Determine the exact point to reseek to on a skip-bad recovery before
    // attempting any fallible parsing, and parse the local index (if any)
    // up front since content decoding needs it.
    let (skip_to, local_index) = if has_removed_mods {
        reader.seek(content_start + content_size)?;
        let local_index_start_marker = reader.position();
        let local_index_size = read_content_size(reader)?;
        let local_index_start = reader.position();

        match PrototypeIndex::read(reader) {
            Ok(idx) => {
                let parsed_local = reader.position() - local_index_start;
                if parsed_local != local_index_size {
                    return Err(ParseError::SizeMismatch {
                        offset: local_index_start_marker,
                        declared: local_index_size,
                        parsed: parsed_local,
                    });
                }
                (local_index_start + local_index_size, Some(idx))
            }
            Err(e) => {
                if ctx.skip_bad {
                    tracing::warn!(error = %e, "skipping blueprint: local prototype index failed to parse");
                    reader.seek(local_index_start + local_index_size)?;
                    ctx.record_skip();
                    return Ok(None);
                }
                return Err(e);
            }
        }
    } else {
        (content_start + content_size, None)
    };

    reader.seek(content_start)?;
    let attempt = read_versioned_content(
        reader,
        ctx,
        local_index.as_ref(),
        content_start,
        content_start_marker,
        content_size,
    );

    match attempt {
        Ok(mut dict) => {
            if !label.is_empty() {
                dict.insert("label".into(), Value::from(label));
            }
            reader.seek(skip_to)?;
            Ok(Some(dict))
        }
        Err(e) => {
            if ctx.skip_bad {
                tracing::warn!(error = %e, "skipping blueprint: content failed to parse");
                reader.seek(skip_to)?;
                ctx.record_skip();
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

pub fn read_blueprint_book(reader: &mut ByteReader, ctx: &mut DecodeContext) -> Result<Dict> {
    let label = reader.read_string_maybe_empty()?;
    let description = reader.read_string_maybe_empty()?;
    let icons = fields::read_icons(reader, ctx)?;

    let slots = super::library::read_slots(reader, ctx)?;
    let active_index = reader.read_u8()?;
    reader.expect_u8(0x00)?;

    let mut dict = Dict::new();
    if !label.is_empty() {
        dict.insert("label".into(), Value::from(label));
    }
    if !description.is_empty() {
        dict.insert("description".into(), Value::from(description));
    }
    if !icons.is_empty() {
        dict.insert("icons".into(), Value::List(icons));
    }
    if !slots.is_empty() {
        dict.insert("blueprints".into(), Value::List(slots));
    }
    dict.insert("active_index".into(), Value::from(active_index as u32));
    Ok(dict)
}

pub fn read_deconstruction_planner(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Dict> {
    let label = reader.read_string_maybe_empty()?;
    let description = reader.read_string_maybe_empty()?;
    let icons = fields::read_icons(reader, ctx)?;

    let entity_filter_mode = reader.read_bool()?;
    let entity_filters = fields::read_zero_based_filters(reader, ctx, Kind::Entity)?;
    let trees_and_rocks_only = reader.read_bool()?;
    let tile_filter_mode = reader.read_bool()?;
    let tile_selection_mode = reader.read_u8()?;
    let tile_filters = fields::read_zero_based_filters(reader, ctx, Kind::Tile)?;

    let mut settings = Dict::new();
    if !label.is_empty() {
        settings.insert("label".into(), Value::from(label));
    }
    if !description.is_empty() {
        settings.insert("description".into(), Value::from(description));
    }
    if !icons.is_empty() {
        settings.insert("icons".into(), Value::List(icons));
    }
    if entity_filter_mode {
        settings.insert("entity_filter_mode".into(), Value::from(1u32));
    }
    if !entity_filters.is_empty() {
        settings.insert("entity_filters".into(), Value::List(entity_filters));
    }
    if trees_and_rocks_only {
        settings.insert("trees_and_rocks_only".into(), Value::Bool(true));
    }
    if tile_filter_mode {
        settings.insert("tile_filter_mode".into(), Value::from(1u32));
    }
    settings.insert("tile_selection_mode".into(), Value::from(tile_selection_mode as u32));
    if !tile_filters.is_empty() {
        settings.insert("tile_filters".into(), Value::List(tile_filters));
    }
    Ok(settings)
}

const MAPPER_ENDPOINT_KINDS: [&str; 2] = ["item", "entity"];

fn read_mapper_endpoint(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Option<Value>> {
    let kind_byte = reader.read_u8()?;
    let id = reader.read_u16_le()?;
    if id == 0 {
        return Ok(None);
    }
    let kind_name = reader.read_mapped_u8(&MAPPER_ENDPOINT_KINDS)?;
    let name = match kind_name {
        "entity" => ctx.prototypes.entity_name(id),
        _ => ctx.prototypes.item_name(id),
    }
    .unwrap_or("unknown")
    .to_string();
    let _ = kind_byte;
    let mut dict = Dict::new();
    dict.insert("type".into(), Value::from(kind_name));
    dict.insert("name".into(), Value::from(name));
    Ok(Some(Value::Dict(dict)))
}

pub fn read_upgrade_planner(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Dict> {
    let label = reader.read_string_maybe_empty()?;
    let description = reader.read_string_maybe_empty()?;
    let icons = fields::read_icons(reader, ctx)?;

    let unknown_count = reader.read_u32_le()?;
    let mut unknown_mappers = Vec::with_capacity(unknown_count as usize);
    for _ in 0..unknown_count {
        let direction_flag = reader.read_bool()?;
        let mut m = Dict::new();
        if direction_flag {
            m.insert("direction_flag".into(), Value::Bool(true));
        }
        unknown_mappers.push(Value::Dict(m));
    }

    let mapper_count = reader.read_u32_le()?;
    let mut mappers = Vec::with_capacity(mapper_count as usize);
    for i in 0..mapper_count {
        let from = read_mapper_endpoint(reader, ctx)?;
        let to = read_mapper_endpoint(reader, ctx)?;
        if from.is_none() && to.is_none() {
            continue;
        }
        let mut mapper = Dict::new();
        if let Some(from) = from {
            mapper.insert("from".into(), from);
        }
        if let Some(to) = to {
            mapper.insert("to".into(), to);
        }
        mapper.insert("index".into(), Value::from(i));
        mappers.push(Value::Dict(mapper));
    }

    let mut settings = Dict::new();
    if !label.is_empty() {
        settings.insert("label".into(), Value::from(label));
    }
    if !description.is_empty() {
        settings.insert("description".into(), Value::from(description));
    }
    if !icons.is_empty() {
        settings.insert("icons".into(), Value::List(icons));
    }
    if !mappers.is_empty() {
        settings.insert("mappers".into(), Value::List(mappers));
    }
    let _ = unknown_mappers;
    Ok(settings)
}
