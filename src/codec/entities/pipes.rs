//! Fluid-handling entities: pipes, pumps (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entity::read_direction;
use crate::codec::fields;
use crate::codec::reader::ByteReader;
use crate::error::Result;
use crate::value::{Dict, Value};

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "pipe" => Ok(()),
        "pipe-to-ground" => directional(reader, attrs),
        "infinity-pipe" => infinity_pipe(reader, ctx, attrs),
        "pump" | "offshore-pump" => pump(reader, ctx, attrs),
        _ => unreachable!("dispatched only for pipe-family classes"),
    }
}

fn directional(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    Ok(())
}

const INFINITY_PIPE_MODES: [&str; 5] = ["at-least", "at-most", "exactly", "add", "remove"];

fn infinity_pipe(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    directional(reader, attrs)?;

    let fluid_id = reader.read_u16_le()?;
    let percentage = reader.read_f64_le()?;
    let mode = reader.read_mapped_u8(&INFINITY_PIPE_MODES)?;
    let temperature = reader.read_f64_le()?;

    if fluid_id != 0 {
        let name = ctx
            .prototypes
            .fluid_name(fluid_id)
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let mut settings = Dict::new();
        settings.insert("name".into(), Value::from(name));
        settings.insert("percentage".into(), Value::from(percentage));
        settings.insert("mode".into(), Value::from(mode));
        settings.insert("temperature".into(), Value::from(temperature));
        attrs.insert("infinity_settings".into(), Value::Dict(settings));
    }
    Ok(())
}

fn pump(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    directional(reader, attrs)?;
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
