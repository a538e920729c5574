//! Circuit-network logic entities (SPEC_FULL.md §4.D).

use crate::codec::context::DecodeContext;
use crate::codec::fields;
use crate::codec::prototype_index::Kind;
use crate::codec::reader::ByteReader;
use crate::error::Result;
use crate::value::{Dict, Value};

pub fn decode(class: &str, reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    match class {
        "arithmetic-combinator" => arithmetic_combinator(reader, ctx, attrs),
        "decider-combinator" => decider_combinator(reader, ctx, attrs),
        "constant-combinator" => constant_combinator(reader, ctx, attrs),
        "lamp" => lamp(reader, ctx, attrs),
        "roboport" => roboport(reader, ctx, attrs),
        "programmable-speaker" => programmable_speaker(reader, ctx, attrs),
        _ => unreachable!("dispatched only for circuit-family classes"),
    }
}

const ARITHMETIC_OPERATORS: [&str; 11] = [
    "*", "/", "+", "-", "%", "^", "<<", ">>", "AND", "OR", "XOR",
];

fn arithmetic_combinator(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_dual(reader)? {
        attrs.insert("connections".into(), connections);
    }

    let first_signal = fields::read_signal(reader, ctx)?;
    let second_signal = fields::read_signal(reader, ctx)?;
    let constant = reader.read_i32_le()?;
    let use_constant = reader.read_bool()?;
    let operator = reader.read_mapped_u8(&ARITHMETIC_OPERATORS)?;
    let output_signal = fields::read_signal(reader, ctx)?;

    let mut params = Dict::new();
    if let Some(sig) = first_signal {
        params.insert("first_signal".into(), sig);
    }
    if use_constant {
        params.insert("second_constant".into(), Value::from(constant));
    } else if let Some(sig) = second_signal {
        params.insert("second_signal".into(), sig);
    }
    params.insert("operation".into(), Value::from(operator));
    if let Some(sig) = output_signal {
        params.insert("output_signal".into(), sig);
    }

    let mut control_behavior = Dict::new();
    control_behavior.insert("arithmetic_conditions".into(), Value::Dict(params));
    attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    Ok(())
}

fn decider_combinator(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_dual(reader)? {
        attrs.insert("connections".into(), connections);
    }

    let comparator = fields::read_comparator(reader)?;
    let first_signal = fields::read_signal(reader, ctx)?;
    let second_signal = fields::read_signal(reader, ctx)?;
    let constant = reader.read_i32_le()?;
    let use_constant = reader.read_bool()?;
    let output_signal = fields::read_signal(reader, ctx)?;
    let copy_count_from_input = reader.read_bool()?;

    let mut params = Dict::new();
    if let Some(sig) = first_signal {
        params.insert("first_signal".into(), sig);
    }
    if use_constant {
        params.insert("constant".into(), Value::from(constant));
    } else if let Some(sig) = second_signal {
        params.insert("second_signal".into(), sig);
    }
    params.insert("comparator".into(), Value::from(comparator));
    if let Some(sig) = output_signal {
        params.insert("output_signal".into(), sig);
    }
    if !copy_count_from_input {
        params.insert("copy_count_from_input".into(), Value::Bool(false));
    }

    let mut control_behavior = Dict::new();
    control_behavior.insert("decider_conditions".into(), Value::Dict(params));
    attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    Ok(())
}

fn constant_combinator(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    let slot_count = reader.read_u32_le()?;
    let mut filters = Vec::new();
    for i in 0..slot_count {
        let signal = fields::read_signal(reader, ctx)?;
        let count = reader.read_i32_le()?;
        if let Some(sig) = signal {
            let mut entry = Dict::new();
            entry.insert("index".into(), Value::from(i + 1));
            entry.insert("signal".into(), sig);
            entry.insert("count".into(), Value::from(count));
            filters.push(Value::Dict(entry));
        }
    }
    if !filters.is_empty() {
        attrs.insert("filters".into(), Value::List(filters));
    }

    let is_on = reader.read_bool()?;
    if !is_on {
        let mut control_behavior = Dict::new();
        control_behavior.insert("is_on".into(), Value::Bool(false));
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}

fn lamp(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_condition".into(), condition);
        let use_colors = reader.read_bool()?;
        if use_colors {
            control_behavior.insert("use_colors".into(), Value::Bool(true));
        }
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    } else {
        let use_colors = reader.read_bool()?;
        if use_colors {
            let mut control_behavior = Dict::new();
            control_behavior.insert("use_colors".into(), Value::Bool(true));
            attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
        }
    }
    Ok(())
}

/// Default signals a roboport's "missing" slot takes, used to suppress
/// unchanged entries (SPEC_FULL.md §4.D "Roboport empty signal").
const ROBOPORT_DEFAULTS: [(&str, &str); 4] = [
    ("available_logistic_output_signal", "signal-X"),
    ("available_construction_output_signal", "signal-Y"),
    ("roboport_count_output_signal", "signal-Z"),
    ("total_logistic_output_signal", "signal-T"),
];

fn roboport(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }

    let mut control_behavior = Dict::new();
    for (key, default_name) in ROBOPORT_DEFAULTS {
        let kind_byte = reader.read_u8()?;
        let id = reader.read_u16_le()?;
        let signal = if id == 0 {
            let mut missing = Dict::new();
            missing.insert("type".into(), Value::from("item"));
            Value::Dict(missing)
        } else {
            let type_name = match kind_byte {
                0 => "item",
                1 => "fluid",
                _ => "virtual",
            };
            let kind = match kind_byte {
                0 => Kind::Item,
                1 => Kind::Fluid,
                _ => Kind::VirtualSignal,
            };
            let name = ctx
                .prototypes
                .lookup(kind, id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let mut dict = Dict::new();
            dict.insert("type".into(), Value::from(type_name));
            dict.insert("name".into(), Value::from(name));
            Value::Dict(dict)
        };
        let is_default = signal
            .as_dict()
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
            == Some(default_name);
        if !is_default {
            control_behavior.insert(key.into(), signal);
        }
    }
    if !control_behavior.is_empty() {
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }
    Ok(())
}

fn programmable_speaker(reader: &mut ByteReader, ctx: &DecodeContext, attrs: &mut Dict) -> Result<()> {
    if let Some(connections) = fields::read_connections_single(reader)? {
        attrs.insert("connections".into(), connections);
    }
    let volume = reader.read_f32_le()?;
    if volume != 1.0 {
        attrs.insert("volume".into(), Value::from(volume));
    }
    let playback_globally = reader.read_bool()?;
    let allow_polyphony = reader.read_bool()?;
    let show_alert = reader.read_bool()?;
    let show_icon = reader.read_bool()?;
    let alert_message = reader.read_string_maybe_empty()?;

    let mut parameters = Dict::new();
    if playback_globally {
        parameters.insert("playback_globally".into(), Value::Bool(true));
    }
    if allow_polyphony {
        parameters.insert("allow_polyphony".into(), Value::Bool(true));
    }
    let mut alert_parameters = Dict::new();
    if show_alert {
        alert_parameters.insert("show_alert".into(), Value::Bool(true));
    }
    if show_icon {
        alert_parameters.insert("show_alert_icon".into(), Value::Bool(true));
    }
    if !alert_message.is_empty() {
        alert_parameters.insert("alert_message".into(), Value::from(alert_message));
    }

    if let Some(condition) = fields::read_condition(reader, ctx)? {
        let mut control_behavior = Dict::new();
        control_behavior.insert("circuit_condition".into(), condition);
        attrs.insert("control_behavior".into(), Value::Dict(control_behavior));
    }

    let mut parameters_dict = Dict::new();
    if !parameters.is_empty() {
        parameters_dict.insert("parameters".into(), Value::Dict(parameters));
    }
    if !alert_parameters.is_empty() {
        parameters_dict.insert("alert_parameters".into(), Value::Dict(alert_parameters));
    }
    if !parameters_dict.is_empty() {
        attrs.insert("parameters".into(), Value::Dict(parameters_dict));
    }
    Ok(())
}
