//! Defensive and military entities (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entity::read_direction;
use crate::codec::fields;
use crate::codec::reader::ByteReader;
use crate::error::Result;
use crate::value::{Dict, Value};

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "ammo-turret" | "electric-turret" | "fluid-turret" => turret(reader, ctx, attrs),
        "artillery-turret" => artillery_turret(reader, ctx, attrs),
        "radar" => directional(reader, attrs),
        "rocket-silo" => rocket_silo(reader, ctx, attrs),
        "land-mine" => Ok(()),
        "wall" => wall(reader, ctx, attrs),
        "gate" => directional(reader, attrs),
        _ => unreachable!("dispatched only for military-family classes"),
    }
}

fn directional(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    Ok(())
}

/// `direction` and `orientation` are stored redundantly; the documented
/// fix-up drops `orientation` once `direction` has been derived from it
/// (SPEC_FULL.md §4.D "Turrets").
fn read_turret_direction(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let stored_direction = reader.read_u8()?;
    let orientation = reader.read_f32_le()?;
    let resolved = if stored_direction == 8 {
        (8.0 * orientation).floor() as u8
    } else {
        stored_direction
    };
    if resolved != 0 {
        attrs.insert("direction".into(), Value::from(resolved));
    }
    Ok(())
}

fn turret(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    read_turret_direction(reader, attrs)?;
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_enable_disable".into(), condition);
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}

/// Contains undocumented literal runs (sentinel `0x7FFF`/`0x7FFFFFFF`) that
/// function as version-integrity checks; enforced rather than interpreted
/// (SPEC_FULL.md §9 "Open questions").
fn artillery_turret(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    read_turret_direction(reader, attrs)?;
    reader.expect_bytes(&[0xFF, 0x7F])?;
    reader.expect_bytes(&[0xFF, 0xFF, 0xFF, 0x7F])?;
    let auto_target = reader.read_bool()?;
    if auto_target {
        attrs.insert("auto_target".into(), Value::Bool(true));
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn rocket_silo(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    directional(reader, attrs)?;
    let recipe_id = reader.read_u16_le()?;
    if recipe_id != 0 {
        let name = ctx
            .prototypes
            .recipe_name(recipe_id)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        attrs.insert("recipe".into(), Value::from(name));
    }
    let auto_launch = reader.read_bool()?;
    if auto_launch {
        attrs.insert("auto_launch".into(), Value::Bool(true));
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

fn wall(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_open_gate".into(), condition);
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}
