//! Rail infrastructure and rolling stock (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::entity::read_direction;
use crate::codec::fields;
use crate::codec::prototype_index::Kind;
use crate::codec::reader::ByteReader;
use crate::codec::types::{gates, Color};
use crate::error::Result;
use crate::value::{Dict, Value};

fn color_to_value(color: Color) -> Value {
    let mut dict = Dict::new();
    dict.insert("r".into(), Value::from(color.r));
    dict.insert("g".into(), Value::from(color.g));
    dict.insert("b".into(), Value::from(color.b));
    dict.insert("a".into(), Value::from(color.a));
    Value::Dict(dict)
}

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "straight-rail" | "curved-rail" => directional(reader, attrs),
        "train-stop" => train_stop(reader, ctx, attrs),
        "rail-signal" => rail_signal(reader, ctx, attrs),
        "rail-chain-signal" => rail_chain_signal(reader, ctx, attrs),
        "locomotive" => locomotive(reader, attrs),
        "cargo-wagon" => cargo_wagon(reader, ctx, attrs),
        "fluid-wagon" => rail_vehicle_common(reader, attrs),
        "artillery-wagon" => artillery_wagon(reader, attrs),
        _ => unreachable!("dispatched only for rail-family classes"),
    }
}

fn directional(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let direction = read_direction(reader)?;
    if direction != 0 {
        attrs.insert("direction".into(), Value::from(direction));
    }
    Ok(())
}

fn train_stop(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    directional(reader, attrs)?;

    let station = reader.read_string_maybe_empty()?;
    if !station.is_empty() {
        attrs.insert("station".into(), Value::from(station));
    }

    let color = Color::read(reader)?;
    if color != Color::default() {
        attrs.insert("color".into(), color_to_value(color));
    }

    let mut control_behavior = Dict::new();
    if let Some(condition) = fields::read_condition(reader, ctx)? {
        control_behavior.insert("circuit_condition".into(), condition);
    }
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }

    if ctx.at_least(gates::STABLE_V_1_1) {
        let read_trains_count = reader.read_bool()?;
        if read_trains_count {
            control_behavior.insert("read_from_train".into(), Value::Bool(true));
        }
        let set_trains_limit = reader.read_bool()?;
        if set_trains_limit {
            control_behavior.insert("set_trains_limit".into(), Value::Bool(true));
            let manual_trains_limit = reader.read_u32_le()?;
            control_behavior.insert("trains_limit".into(), Value::from(manual_trains_limit));
        }
    }
    if !control_behavior.is_empty() {
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}

fn rail_signal(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    directional(reader, attrs)?;
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_close_signal".into(), condition);
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}

/// `(signal_name, default_name)` pairs read in order for chain signals;
/// a colour signal equal to its hard-coded default is suppressed
/// (SPEC_FULL.md §4.D "Rail signal / chain signal colour signals").
const CHAIN_SIGNAL_COLOURS: [(&str, &str); 4] = [
    ("red_output_signal", "signal-red"),
    ("yellow_output_signal", "signal-yellow"),
    ("green_output_signal", "signal-green"),
    ("blue_output_signal", "signal-blue"),
];

fn rail_chain_signal(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    directional(reader, attrs)?;
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }

    let mut control_behavior = Dict::new();
    for (key, default_name) in CHAIN_SIGNAL_COLOURS {
        if let Some(signal) = fields::read_signal(reader, ctx)? {
            let is_default = signal
                .as_dict()
                .and_then(|d| d.get("name"))
                .and_then(Value::as_str)
                == Some(default_name);
            if !is_default {
                control_behavior.insert(key.into(), signal);
            }
        }
    }
    if !control_behavior.is_empty() {
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }

    if ctx.at_least(gates::STABLE_V_1_1) {
        reader.ignore(1, "rail-chain-signal stable-1.1 flag")?;
    }
    Ok(())
}

fn rail_vehicle_common(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    let orientation = reader.read_f32_le()?;
    attrs.insert("orientation".into(), Value::from(orientation));
    let color = Color::read(reader)?;
    if color != Color::default() {
        attrs.insert("color".into(), color_to_value(color));
    }
    Ok(())
}

fn locomotive(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    rail_vehicle_common(reader, attrs)
}

fn cargo_wagon(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    rail_vehicle_common(reader, attrs)?;
    let bar = reader.read_u16_le()?;
    if bar != 0xFFFF {
        attrs.insert("bar".into(), Value::from(bar));
    }
    let filters = fields::read_filters(reader, ctx, Kind::Item)?;
    if !filters.is_empty() {
        attrs.insert("filters".into(), Value::List(filters));
    }
    Ok(())
}

fn artillery_wagon(reader: &mut ByteReader, attrs: &mut Dict) -> Result<()> {
    rail_vehicle_common(reader, attrs)?;
    let auto_target = reader.read_bool()?;
    if auto_target {
        attrs.insert("auto_target".into(), Value::Bool(true));
    }
    Ok(())
}
