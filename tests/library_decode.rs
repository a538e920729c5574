//! End-to-end decodes against the public `decode_library_bytes` API,
//! covering the scenarios SPEC_FULL.md §8 walks through by hand.

use blueprint_decoder::decode_library_bytes;

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_version(out: &mut Vec<u8>, major: u16, minor: u16, patch: u16, build: u16) {
    push_u16(out, major);
    push_u16(out, minor);
    push_u16(out, patch);
    push_u16(out, build);
}

fn push_string(out: &mut Vec<u8>, s: &str) {
    assert!(s.len() < 0xFF);
    out.push(s.len() as u8);
    out.extend_from_slice(s.as_bytes());
}

/// `read_string_maybe_empty`: a leading "is_empty" bool, then the string iff
/// it is not empty.
fn push_maybe_empty(out: &mut Vec<u8>, s: Option<&str>) {
    match s {
        None => out.push(0x01),
        Some(s) => {
            out.push(0x00);
            push_string(out, s);
        }
    }
}

/// Prototype table with one class per `(class, id, name)` triple, each
/// carrying a single entry, non-tile width (a literal 0x00, then a 2-byte
/// count, 2-byte id).
fn push_prototypes_multi(out: &mut Vec<u8>, classes: &[(&str, u16, &str)]) {
    push_u16(out, classes.len() as u16); // class count
    for (class, id, name) in classes {
        push_string(out, class);
        out.push(0x00); // literal separator before non-tile entry counts
        push_u16(out, 1); // entry count
        push_u16(out, *id);
        push_string(out, name);
    }
}

fn push_prototypes_one_item_class(out: &mut Vec<u8>, class: &str, id: u16, name: &str) {
    push_prototypes_multi(out, &[(class, id, name)]);
}

fn push_empty_icons(out: &mut Vec<u8>) {
    out.push(0); // placeholder count
    for _ in 0..4 {
        out.push(0); // kind byte (ignored when id == 0)
        push_u16(out, 0); // id 0 == empty slot
    }
}

/// Builds a self-contained blueprint body: version + fixed tail, with the
/// given raw entity bytes (already-encoded, one after another) in the
/// entities section and no schedules, tiles or icons.
fn build_blueprint_content_ex(description: Option<&str>, entity_count: u32, entity_bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    push_version(&mut body, 1, 0, 0, 0);
    body.push(0x00);
    body.push(0); // migrations count8 = 0
    push_maybe_empty(&mut body, description);
    body.push(0x00); // snap_to_grid = false
    push_u32(&mut body, entity_count);
    body.extend_from_slice(entity_bytes);
    push_u32(&mut body, 0); // schedules
    push_u32(&mut body, 0); // tiles
    push_empty_icons(&mut body);
    body
}

fn build_blueprint_content(description: Option<&str>) -> Vec<u8> {
    build_blueprint_content_ex(description, 0, &[])
}

/// Builds one "blueprint" slot (kind_tag 0) wrapping pre-built `content`
/// bytes: used, kind_tag, generation, item_id, label, the 0x00 marker,
/// has_removed_mods, content_size, content.
fn push_blueprint_slot_with_content(out: &mut Vec<u8>, item_id: u16, label: Option<&str>, content: &[u8]) {
    out.push(0x01); // used
    out.push(0); // kind_tag: blueprint
    push_u32(out, 0); // generation
    push_u16(out, item_id);
    push_maybe_empty(out, label);
    out.push(0x00); // marker
    out.push(0x00); // has_removed_mods = false

    assert!(content.len() < 0xFF);
    out.push(content.len() as u8);
    out.extend_from_slice(content);
}

fn push_blueprint_slot(out: &mut Vec<u8>, item_id: u16, label: Option<&str>, description: Option<&str>) {
    let content = build_blueprint_content(description);
    push_blueprint_slot_with_content(out, item_id, label, &content);
}

/// Builds one decoded "lamp" entity's raw bytes: header (prototype id,
/// absolute position, the 0x20/flags/0x01 markers, raw id), an all-default
/// body (connections, circuit condition and use_colors all at their
/// suppressed defaults, so the whole body is zero bytes), and an
/// all-default trailer (no items, no tags).
fn build_lamp_entity(prototype_id: u16, raw_id: u32) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, prototype_id);
    push_u16(&mut out, 0x7FFF); // absolute-position lookahead sentinel
    push_u32(&mut out, 0); // x
    push_u32(&mut out, 0); // y
    out.push(0x20);
    out.push(0x10); // id_flags: bit 0x10 set
    out.push(0x01);
    push_u32(&mut out, raw_id);
    out.extend(std::iter::repeat(0u8).take(24)); // connections + condition + use_colors, all default
    push_u32(&mut out, 0); // items map count
    out.push(0x00); // has_tags = false
    out
}

/// Assembles a whole library file: version, migrations, prototypes, library
/// state/generation/timestamp, then the caller-supplied slot bytes.
fn build_library(prototypes: &[u8], slot_count: u32, slots: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    push_version(&mut out, 1, 0, 0, 0);
    out.push(0x00);
    out.push(0); // migrations count8 = 0
    out.extend_from_slice(prototypes);
    out.push(0x00); // library state (ignored)
    out.push(0x00);
    push_u32(&mut out, 7); // generation
    push_u32(&mut out, 1234); // timestamp
    out.push(0x01);
    push_u32(&mut out, slot_count);
    out.extend_from_slice(slots);
    out
}

#[test]
fn empty_library_has_no_blueprints_key() {
    let mut prototypes = Vec::new();
    push_u16(&mut prototypes, 0); // no prototype classes at all
    let data = build_library(&prototypes, 0, &[]);

    let decoded = decode_library_bytes(&data, "blueprint-storage.dat", false, false).unwrap();
    assert_eq!(decoded.skipped, 0);
    assert!(decoded.document.get("blueprints").is_none());
    assert_eq!(decoded.document.get("version").unwrap().as_str(), Some("1.0.0"));
}

#[test]
fn entity_carries_entity_number_matching_its_one_based_slot() {
    let mut prototypes = Vec::new();
    push_prototypes_multi(
        &mut prototypes,
        &[("blueprint", 1, "blueprint"), ("lamp", 5, "small-lamp")],
    );

    let entity = build_lamp_entity(5, 42);
    let content = build_blueprint_content_ex(None, 1, &entity);

    let mut slots = Vec::new();
    push_blueprint_slot_with_content(&mut slots, 1, None, &content);

    let data = build_library(&prototypes, 1, &slots);
    let decoded = decode_library_bytes(&data, "blueprint-storage.dat", false, false).unwrap();

    let blueprints = decoded.document.get("blueprints").unwrap().as_list().unwrap();
    let blueprint = blueprints[0].as_dict().unwrap().get("blueprint").unwrap().as_dict().unwrap();
    let entities = blueprint.get("entities").unwrap().as_list().unwrap();
    assert_eq!(entities.len(), 1);

    let decoded_entity = entities[0].as_dict().unwrap();
    assert_eq!(decoded_entity.get("entity_number").unwrap().as_u32(), Some(1));
    assert_eq!(decoded_entity.get("name").unwrap().as_str(), Some("small-lamp"));
}

#[test]
fn one_free_slot_and_one_blueprint_slot() {
    let mut prototypes = Vec::new();
    push_prototypes_one_item_class(&mut prototypes, "blueprint", 1, "blueprint");

    let mut slots = Vec::new();
    slots.push(0x00); // slot 0: unused ("free slot")
    push_blueprint_slot(&mut slots, 1, Some("my-blueprint"), Some("a test blueprint"));

    let data = build_library(&prototypes, 2, &slots);
    let decoded = decode_library_bytes(&data, "blueprint-storage.dat", false, false).unwrap();
    assert_eq!(decoded.skipped, 0);

    let blueprints = decoded.document.get("blueprints").unwrap().as_list().unwrap();
    assert_eq!(blueprints.len(), 1);

    let slot = blueprints[0].as_dict().unwrap();
    assert_eq!(slot.get("index").unwrap().as_u32(), Some(1));

    let blueprint = slot.get("blueprint").unwrap().as_dict().unwrap();
    assert_eq!(blueprint.get("label").unwrap().as_str(), Some("my-blueprint"));
    assert_eq!(blueprint.get("description").unwrap().as_str(), Some("a test blueprint"));
    assert_eq!(blueprint.get("version").unwrap().as_str(), Some("1.0.0"));
    assert!(blueprint.get("entities").is_none());
}

#[test]
fn unknown_slot_item_id_is_a_hard_error_without_skip_bad() {
    let mut prototypes = Vec::new();
    push_prototypes_one_item_class(&mut prototypes, "blueprint", 1, "blueprint");

    let mut slots = Vec::new();
    push_blueprint_slot(&mut slots, 99, None, None); // 99 was never registered

    let data = build_library(&prototypes, 1, &slots);
    assert!(decode_library_bytes(&data, "blueprint-storage.dat", false, false).is_err());
}

#[test]
fn skip_bad_recovers_from_a_corrupt_blueprint_body_and_counts_it() {
    let mut prototypes = Vec::new();
    push_prototypes_one_item_class(&mut prototypes, "blueprint", 1, "blueprint");

    let mut slots = Vec::new();
    slots.push(0x01); // used
    slots.push(0); // kind_tag: blueprint
    push_u32(&mut slots, 0); // generation
    push_u16(&mut slots, 1); // item_id
    push_maybe_empty(&mut slots, None); // label
    slots.push(0x00); // marker
    slots.push(0x00); // has_removed_mods = false
    let bogus_content = vec![0xAB; 5]; // not a valid version+body tail
    slots.push(bogus_content.len() as u8);
    slots.extend_from_slice(&bogus_content);

    let data = build_library(&prototypes, 1, &slots);

    assert!(decode_library_bytes(&data, "blueprint-storage.dat", false, false).is_err());

    let decoded = decode_library_bytes(&data, "blueprint-storage.dat", true, false).unwrap();
    assert_eq!(decoded.skipped, 1);
    assert!(decoded.document.get("blueprints").is_none());
}

#[test]
fn extended_mode_includes_the_prototype_table() {
    let mut prototypes = Vec::new();
    push_prototypes_one_item_class(&mut prototypes, "blueprint", 1, "blueprint");
    let data = build_library(&prototypes, 0, &[]);

    let decoded = decode_library_bytes(&data, "blueprint-storage.dat", false, true).unwrap();
    let by_kind = decoded.document.get("prototypes").unwrap().as_dict().unwrap();
    let items = by_kind.get("item").unwrap().as_list().unwrap();
    assert_eq!(items.len(), 1);
    let entry = items[0].as_dict().unwrap();
    assert_eq!(entry.get("name").unwrap().as_str(), Some("blueprint"));
}

#[test]
fn non_extended_mode_omits_the_prototype_table() {
    let mut prototypes = Vec::new();
    push_prototypes_one_item_class(&mut prototypes, "blueprint", 1, "blueprint");
    let data = build_library(&prototypes, 0, &[]);

    let decoded = decode_library_bytes(&data, "blueprint-storage.dat", false, false).unwrap();
    assert!(decoded.document.get("prototypes").is_none());
}
