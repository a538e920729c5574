//! The entity envelope shared by every variant: header, version-gated
//! pre-body flags, variant dispatch, and the common trailer
//! (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entities;
use crate::codec::fields;
use crate::codec::reader::ByteReader;
use crate::codec::types::{gates, Position, PositionTracker};
use crate::error::{ParseError, Result};
use crate::value::{Dict, Value};

pub struct DecodedEntity {
    pub raw_entity_id: Option<u32>,
    pub attrs: Dict,
}

struct EntityHeader {
    prototype_id: u16,
    position: Position,
    raw_entity_id: Option<u32>,
}

fn read_entity_header(
    reader: &mut ByteReader,
    tracker: &mut PositionTracker,
) -> Result<EntityHeader> {
    let prototype_id = reader.read_u16_le()?;
    let position = tracker.read(reader)?;
    reader.expect_u8(0x20)?;

    let offset = reader.position();
    let id_flags = reader.read_u8()?;
    if id_flags & 0x10 == 0 {
        return Err(ParseError::custom(offset, "entity id flag 0x10 not set"));
    }
    reader.expect_u8(0x01)?;
    let raw_entity_id = Some(reader.read_u32_le()?);

    Ok(EntityHeader {
        prototype_id,
        position,
        raw_entity_id,
    })
}

fn is_turret_like(class: &str) -> bool {
    matches!(
        class,
        "ammo-turret" | "electric-turret" | "fluid-turret" | "artillery-turret" | "land-mine" | "radar"
    )
}

pub fn is_rail_vehicle(class: &str) -> bool {
    matches!(class, "locomotive" | "cargo-wagon" | "fluid-wagon" | "artillery-wagon")
}

fn is_container_like(class: &str) -> bool {
    matches!(
        class,
        "container" | "logistic-container" | "infinity-container" | "linked-container"
    )
}

/// Reads the pre-body flag byte(s) gated by `V_1_1_51_4`/`V_1_1_62_5`
/// (SPEC_FULL.md §4.D "Version gates").
fn read_pre_body_flags(reader: &mut ByteReader, ctx: &DecodeContext, class: &str) -> Result<()> {
    if ctx.at_least(gates::V_1_1_51_4) {
        let allowed: &[u8] = if is_turret_like(class) || is_rail_vehicle(class) {
            &[0x00, 0x01]
        } else {
            &[0x00]
        };
        reader.expect_oneof_u8(allowed)?;
    }
    if ctx.at_least(gates::V_1_1_62_5) && is_container_like(class) {
        reader.expect_u8(0x00)?;
    }
    Ok(())
}

pub fn decode_entity(
    reader: &mut ByteReader,
    ctx: &DecodeContext,
    tracker: &mut PositionTracker,
    entity_number: u32,
) -> Result<DecodedEntity> {
    let header = read_entity_header(reader, tracker)?;

    let class = ctx
        .prototypes
        .entity_class(header.prototype_id)
        .ok_or_else(|| ParseError::UnknownVariant {
            offset: reader.position(),
            class: format!("prototype id {}", header.prototype_id),
        })?
        .to_string();
    let name = ctx
        .prototypes
        .entity_name(header.prototype_id)
        .unwrap_or("unknown")
        .to_string();

    read_pre_body_flags(reader, ctx, &class)?;

    let mut attrs = Dict::new();
    attrs.insert("entity_number".into(), Value::from(entity_number));
    attrs.insert("name".into(), Value::from(name));
    attrs.insert("position".into(), position_to_value(header.position));

    entities::decode_body(&class, reader, ctx, &mut attrs)?;

    fields::read_entity_trailer(reader, ctx, &mut attrs)?;

    Ok(DecodedEntity {
        raw_entity_id: header.raw_entity_id,
        attrs,
    })
}

fn position_to_value(position: Position) -> Value {
    let mut dict = Dict::new();
    dict.insert("x".into(), Value::from(position.x));
    dict.insert("y".into(), Value::from(position.y));
    Value::Dict(dict)
}

/// Common direction reader: a single byte, stored verbatim as the export's
/// `direction` field (0 is suppressed - "north" is the default orientation).
pub fn read_direction(reader: &mut ByteReader) -> Result<u8> {
    reader.read_u8()
}
