//! Production buildings: drills, furnaces, assemblers (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entity::read_direction;
use crate::codec::fields;
use crate::codec::reader::ByteReader;
use crate::error::Result;
use crate::value::{Dict, Value};

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "mining-drill" => mining_drill(reader, ctx, attrs),
        "furnace" => furnace(reader, ctx, attrs),
        "assembling-machine" => assembling_machine(reader, ctx, attrs),
        "lab" => lab(reader, ctx, attrs),
        "beacon" => Ok(()),
        _ => unreachable!("dispatched only for production-family classes"),
    }
}

fn with_circuit_condition(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
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

fn mining_drill(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    with_circuit_condition(reader, ctx, attrs)
}

fn furnace(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    with_circuit_condition(reader, ctx, attrs)
}

fn assembling_machine(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    let recipe_id = reader.read_u16_le()?;
    if recipe_id != 0 {
        let name = ctx
            .prototypes
            .recipe_name(recipe_id)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        attrs.insert("recipe".into(), Value::from(name));
    }
    with_circuit_condition(reader, ctx, attrs)
}

fn lab(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    with_circuit_condition(reader, ctx, attrs)
}
