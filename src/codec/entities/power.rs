//! Power-distribution entities: poles, switches, generation and storage
//! (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entity::read_direction;
use crate::codec::fields;
use crate::codec::reader::ByteReader;
use crate::codec::types::gates;
use crate::error::Result;
use crate::value::{Dict, Value};

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "electric-pole" => electric_pole(reader, ctx, attrs),
        "power-switch" => power_switch(reader, ctx, attrs),
        "solar-panel" | "heat-pipe" | "burner-generator" => Ok(()),
        "accumulator" => accumulator(reader, ctx, attrs),
        "heat-interface" => heat_interface(reader, attrs),
        "electric-energy-interface" => electric_energy_interface(reader, ctx, attrs),
        "boiler" => directional(reader, attrs),
        "generator" => directional(reader, attrs),
        "reactor" => reactor(reader, ctx, attrs),
        _ => unreachable!("dispatched only for power-family classes"),
    }
}

fn directional(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    Ok(())
}

const MAX_POLE_NEIGHBOURS: usize = 5;

fn electric_pole(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if ctx.at_least(gates::V_1_1_0_0) {
        let mut neighbours = Vec::new();
        for _ in 0..MAX_POLE_NEIGHBOURS {
            let id = reader.read_u32_le()?;
            if id == 0 {
                break;
            }
            neighbours.push(Value::from(id));
        }
        if !neighbours.is_empty() {
            attrs.insert("neighbours".into(), Value::List(neighbours));
        }
    } else {
        reader.ignore(4, "pre-1.1 electric pole neighbours placeholder")?;
    }

    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn power_switch(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let switch_state = if ctx.at_least(gates::V_1_1_4_0) {
        reader.read_bool()?
    } else {
        reader.expect_u8(0x00)?;
        false
    };
    if switch_state {
        attrs.insert("switch_state".into(), Value::Bool(true));
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn accumulator(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(signal) = fields::read_signal(reader, ctx)? {
        attrs.insert("output_signal".into(), signal);
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

const HEAT_INTERFACE_MODES: [&str; 3] = ["at-least", "at-most", "exactly"];

fn heat_interface(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let temperature = reader.read_f64_le()?;
    attrs.insert("temperature".into(), Value::from(temperature));
    let mode = reader.read_mapped_u8(&HEAT_INTERFACE_MODES)?;
    if mode != HEAT_INTERFACE_MODES[0] {
        attrs.insert("mode".into(), Value::from(mode));
    }
    Ok(())
}

fn electric_energy_interface(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let buffer_size = reader.read_f64_le()?;
    if buffer_size != 0.0 {
        attrs.insert("buffer_size".into(), Value::from(buffer_size));
    }
    let power_production = reader.read_f64_le()?;
    if power_production != 0.0 {
        attrs.insert("power_production".into(), Value::from(power_production));
    }
    let power_usage = reader.read_f64_le()?;
    if power_usage != 0.0 {
        attrs.insert("power_usage".into(), Value::from(power_usage));
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}

fn reactor(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    Ok(())
}
