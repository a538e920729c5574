//! Variant dispatch table (SPEC_FULL.md §4.D) and the per-family decoder
//! modules it delegates to. Each family module groups the entity classes
//! the source code also groups together (belts, power, rails, ...).

mod circuits;
mod military;
mod pipes;
mod power;
mod production;
mod rail;
mod transport;

use crate::codec::context::DecodeContext;
use crate::codec::reader::ByteReader;
use crate::error::{ParseError, Result};
use crate::value::Dict;

/// Dispatches to the decoder for `class`'s variant body. Unknown classes
/// are a hard parse error (SPEC_FULL.md §1 Non-goals: no silent tolerance
/// of unrecognized variants).
pub fn decode_body(
    class: &str,
    reader: &mut ByteReader,
    ctx: &DecodeContext,
    attrs: &mut Dict,
) -> Result<()> {
    match class {
        "container" | "infinity-container" | "logistic-container" | "storage-tank"
        | "transport-belt" | "underground-belt" | "splitter" | "loader" | "loader-1x1"
        | "linked-belt" | "linked-container" | "inserter" => {
            transport::decode(class, reader, ctx, attrs)
        }

        "electric-pole" | "power-switch" | "solar-panel" | "accumulator" | "heat-pipe"
        | "heat-interface" | "burner-generator" | "electric-energy-interface" | "boiler"
        | "generator" | "reactor" => power::decode(class, reader, ctx, attrs),

        "pipe" | "pipe-to-ground" | "infinity-pipe" | "pump" | "offshore-pump" => {
            pipes::decode(class, reader, ctx, attrs)
        }

        "straight-rail" | "curved-rail" | "train-stop" | "rail-signal" | "rail-chain-signal"
        | "locomotive" | "cargo-wagon" | "fluid-wagon" | "artillery-wagon" => {
            rail::decode(class, reader, ctx, attrs)
        }

        "arithmetic-combinator" | "decider-combinator" | "constant-combinator" | "lamp"
        | "roboport" | "programmable-speaker" => circuits::decode(class, reader, ctx, attrs),

        "mining-drill" | "furnace" | "assembling-machine" | "lab" | "beacon" => {
            production::decode(class, reader, ctx, attrs)
        }

        "ammo-turret" | "electric-turret" | "fluid-turret" | "artillery-turret" | "radar"
        | "rocket-silo" | "land-mine" | "wall" | "gate" => {
            military::decode(class, reader, ctx, attrs)
        }

        other => Err(ParseError::UnknownVariant {
            offset: reader.position(),
            class: other.to_string(),
        }),
    }
}
