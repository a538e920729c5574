//! Single post-parse pass resolving raw 32-bit entity-ids to 1-based
//! entity numbers (SPEC_FULL.md §4.G).

use std::collections::HashMap;

use crate::error::{ParseError, Result};
use crate::value::{Dict, Value};

struct Peer {
    entity_number: u32,
    name: String,
}

fn is_combinator(name: &str) -> bool {
    name == "arithmetic-combinator" || name == "decider-combinator"
}

/// Rewrites every `entity_id` key, `locomotives`/`neighbours` list, and
/// `belt_link` scalar in `dict`'s tree from raw ids to entity numbers.
/// `id_registry` maps each raw id to its 0-based index in `dict`'s
/// `entities` list (SPEC_FULL.md §9 "Entity-ID resolution cycle").
pub fn resolve(dict: &mut Dict, id_registry: &[(u32, usize)]) -> Result<()> {
    let entities = dict
        .get("entities")
        .and_then(Value::as_list)
        .map(|l| l.to_vec())
        .unwrap_or_default();

    let mut peers: HashMap<u32, Peer> = HashMap::new();
    for (raw_id, index) in id_registry {
        let entity_number = *index as u32 + 1;
        let name = entities
            .get(*index)
            .and_then(Value::as_dict)
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        peers.insert(*raw_id, Peer { entity_number, name });
    }

    let mut wrapped = Value::Dict(std::mem::take(dict));
    walk(&mut wrapped, &peers)?;
    if let Value::Dict(resolved) = wrapped {
        *dict = resolved;
    }
    Ok(())
}

fn resolve_raw_id(raw: f64, peers: &HashMap<u32, Peer>) -> Result<&Peer> {
    let raw_id = raw as u32;
    peers.get(&raw_id).ok_or(ParseError::UnresolvedEntityId { offset: 0, raw_id })
}

fn walk(value: &mut Value, peers: &HashMap<u32, Peer>) -> Result<()> {
    match value {
        Value::Dict(d) => {
            if let Some(Value::Number(raw)) = d.get("entity_id").cloned() {
                let peer = resolve_raw_id(raw, peers)?;
                let entity_number = peer.entity_number;
                let peer_is_combinator = is_combinator(&peer.name);
                d.insert("entity_id".into(), Value::from(entity_number));
                if !peer_is_combinator {
                    let drop = matches!(d.get("circuit_id"), Some(Value::Number(n)) if *n == 1.0);
                    if drop {
                        d.shift_remove("circuit_id");
                    }
                }
            }

            for (key, v) in d.iter_mut() {
                match key.as_str() {
                    "locomotives" | "neighbours" => {
                        if let Value::List(list) = v {
                            for item in list.iter_mut() {
                                if let Value::Number(n) = item {
                                    let peer = resolve_raw_id(*n, peers)?;
                                    *item = Value::from(peer.entity_number);
                                }
                            }
                        }
                    }
                    "belt_link" => {
                        if let Value::Number(n) = v {
                            let peer = resolve_raw_id(*n, peers)?;
                            *v = Value::from(peer.entity_number);
                        }
                    }
                    "entity_id" => {}
                    _ => walk(v, peers)?,
                }
            }
        }
        Value::List(list) => {
            for item in list.iter_mut() {
                walk(item, peers)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_entity_id_and_drops_circuit_id_for_non_combinator_peer() {
        let mut lamp = Dict::new();
        lamp.insert("name".into(), Value::from("lamp"));
        let mut inserter = Dict::new();
        inserter.insert("name".into(), Value::from("inserter"));

        let mut peer_ref = Dict::new();
        peer_ref.insert("entity_id".into(), Value::from(7u32)); // raw id
        peer_ref.insert("circuit_id".into(), Value::from(1u32));
        inserter.insert("peer".into(), Value::Dict(peer_ref));

        let mut dict = Dict::new();
        dict.insert(
            "entities".into(),
            Value::List(vec![Value::Dict(lamp), Value::Dict(inserter)]),
        );

        // raw id 7 -> index 0 (lamp, entity_number 1)
        resolve(&mut dict, &[(7, 0)]).unwrap();

        let entities = dict.get("entities").unwrap().as_list().unwrap();
        let resolved_peer = entities[1]
            .as_dict()
            .unwrap()
            .get("peer")
            .unwrap()
            .as_dict()
            .unwrap();
        assert_eq!(resolved_peer.get("entity_id").unwrap().as_u32(), Some(1));
        assert!(resolved_peer.get("circuit_id").is_none());
    }

    #[test]
    fn keeps_circuit_id_for_combinator_peer() {
        let mut combinator = Dict::new();
        combinator.insert("name".into(), Value::from("arithmetic-combinator"));

        let mut peer_ref = Dict::new();
        peer_ref.insert("entity_id".into(), Value::from(9u32));
        peer_ref.insert("circuit_id".into(), Value::from(1u32));
        let mut holder = Dict::new();
        holder.insert("peer".into(), Value::Dict(peer_ref));

        let mut dict = Dict::new();
        dict.insert(
            "entities".into(),
            Value::List(vec![Value::Dict(combinator), Value::Dict(holder)]),
        );

        resolve(&mut dict, &[(9, 0)]).unwrap();

        let entities = dict.get("entities").unwrap().as_list().unwrap();
        let resolved_peer = entities[1]
            .as_dict()
            .unwrap()
            .get("peer")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(resolved_peer.get("circuit_id").is_some());
    }

    #[test]
    fn unresolved_raw_id_is_an_error() {
        let mut dict = Dict::new();
        dict.insert("entities".into(), Value::List(vec![]));
        let mut holder = Dict::new();
        holder.insert("entity_id".into(), Value::from(123u32));
        dict.insert("stray".into(), Value::Dict(holder));

        assert!(resolve(&mut dict, &[]).is_err());
    }
}
