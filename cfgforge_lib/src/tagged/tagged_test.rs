//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the tagged binary encoding.

use indexmap::IndexMap;

use std::io::Cursor;
use std::sync::Arc;

use crate::items::{ConfigItem, ConfigValue, KeyValueStructure, Library, MetaRef};
use crate::patch::{EntryPatch, LibraryPatch, PatchEnvelope};
use crate::schema::*;

use super::*;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.add_struct(StructSchema::new("FruitInfo", 1, vec![
        FieldSchema::new("Id", 1, FieldType::String, true),
        FieldSchema::new("Name", 2, FieldType::String, false),
        FieldSchema::new("Value", 3, FieldType::I32, false),
        FieldSchema::new("Friend", 4, FieldType::Ref("Fruits".to_owned()), false),
        FieldSchema::new("Tags", 5, FieldType::List(Box::new(FieldType::String)), false),
    ]));
    registry.add_entry(EntrySchema::new("Fruits", EntryKind::Library, EntryScope::Shared, "FruitInfo"));

    registry.add_struct(StructSchema::new("GlobalsInfo", 1, vec![
        FieldSchema::new("MaxLevel", 1, FieldType::I32, false),
        FieldSchema::new("Cooldown", 2, FieldType::Duration, false),
    ]));
    registry.add_entry(EntrySchema::new("Globals", EntryKind::KeyValue, EntryScope::Shared, "GlobalsInfo"));
    registry
}

fn fruit(id: &str, name: &str, value: i32) -> Arc<ConfigItem> {
    let mut values = IndexMap::new();
    values.insert("Id".to_owned(), ConfigValue::String(id.to_owned()));
    values.insert("Name".to_owned(), ConfigValue::String(name.to_owned()));
    values.insert("Value".to_owned(), ConfigValue::I32(value));
    Arc::new(ConfigItem::new("FruitInfo", values))
}

fn fruits_library() -> Library {
    let mut library = Library::new("Fruits", "FruitInfo");
    library.insert("a", fruit("a", "Apple", 1));
    library.insert("b", fruit("b", "Banana", 2));
    library
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// Libraries survive an encode/decode cycle, order included.
#[test]
fn library_round_trip() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);
    let library = fruits_library();

    let data = codec.encode_library(&library).unwrap();
    let decoded = codec.decode_library(registry.entry("Fruits").unwrap(), &mut Cursor::new(data)).unwrap();

    assert_eq!(decoded.items().keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(decoded.get("a").unwrap().value("Name"), Some(&ConfigValue::String("Apple".to_owned())));
    assert_eq!(**decoded.get("b").unwrap(), *library.get("b").unwrap().clone());
}

/// References encode as their raw key and come back unresolved.
#[test]
fn refs_round_trip_unresolved() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);

    let mut library = Library::new("Fruits", "FruitInfo");
    let mut values = IndexMap::new();
    values.insert("Id".to_owned(), ConfigValue::String("a".to_owned()));
    values.insert("Friend".to_owned(), ConfigValue::Ref(MetaRef::new("Fruits", "b1")));
    library.insert("a", Arc::new(ConfigItem::new("FruitInfo", values)));

    let data = codec.encode_library(&library).unwrap();
    let decoded = codec.decode_library(registry.entry("Fruits").unwrap(), &mut Cursor::new(data)).unwrap();

    match decoded.get("a").unwrap().value("Friend") {
        Some(ConfigValue::Ref(meta_ref)) => {
            assert_eq!(meta_ref.raw_key(), "b1");
            assert!(meta_ref.resolved().is_none());
        },
        other => panic!("expected a ref, got {other:?}"),
    }
}

/// Null elements of sparse collections survive.
#[test]
fn sparse_list_round_trip() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);

    let mut library = Library::new("Fruits", "FruitInfo");
    let mut values = IndexMap::new();
    values.insert("Id".to_owned(), ConfigValue::String("a".to_owned()));
    values.insert("Tags".to_owned(), ConfigValue::List(vec![
        ConfigValue::String("x".to_owned()),
        ConfigValue::Null,
        ConfigValue::String("z".to_owned()),
    ]));
    library.insert("a", Arc::new(ConfigItem::new("FruitInfo", values)));

    let data = codec.encode_library(&library).unwrap();
    let decoded = codec.decode_library(registry.entry("Fruits").unwrap(), &mut Cursor::new(data)).unwrap();
    assert_eq!(decoded.get("a").unwrap().value("Tags"), library.get("a").unwrap().value("Tags"));
}

/// A reader with a smaller schema skips members it does not know.
#[test]
fn unknown_members_are_skipped() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);
    let data = codec.encode_library(&fruits_library()).unwrap();

    // The same entry, but the reader's FruitInfo lost the Name and Value fields.
    let mut smaller = SchemaRegistry::new();
    smaller.add_struct(StructSchema::new("FruitInfo", 1, vec![
        FieldSchema::new("Id", 1, FieldType::String, true),
    ]));
    smaller.add_entry(EntrySchema::new("Fruits", EntryKind::Library, EntryScope::Shared, "FruitInfo"));

    let smaller_codec = TaggedCodec::new(&smaller);
    let decoded = smaller_codec.decode_library(smaller.entry("Fruits").unwrap(), &mut Cursor::new(data)).unwrap();

    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.get("a").unwrap().value("Id"), Some(&ConfigValue::String("a".to_owned())));
    assert!(decoded.get("a").unwrap().value("Name").is_none());
}

/// A wire type change on a live tag is a hard error.
#[test]
fn wire_type_change_is_an_error() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);
    let data = codec.encode_library(&fruits_library()).unwrap();

    let mut changed = SchemaRegistry::new();
    changed.add_struct(StructSchema::new("FruitInfo", 1, vec![
        FieldSchema::new("Id", 1, FieldType::String, true),
        FieldSchema::new("Name", 2, FieldType::I32, false),
    ]));
    changed.add_entry(EntrySchema::new("Fruits", EntryKind::Library, EntryScope::Shared, "FruitInfo"));

    let changed_codec = TaggedCodec::new(&changed);
    assert!(changed_codec.decode_library(changed.entry("Fruits").unwrap(), &mut Cursor::new(data)).is_err());
}

/// Key-value structures round-trip, durations included.
#[test]
fn key_value_round_trip() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);

    let mut values = IndexMap::new();
    values.insert("MaxLevel".to_owned(), ConfigValue::I32(30));
    values.insert("Cooldown".to_owned(), ConfigValue::Duration(90_000_000));
    let structure = KeyValueStructure::new("Globals", "GlobalsInfo", values);

    let data = codec.encode_key_value(&structure).unwrap();
    let decoded = codec.decode_key_value(registry.entry("Globals").unwrap(), &mut Cursor::new(data)).unwrap();
    assert_eq!(decoded, structure);
}

/// Alias tables round-trip, and the legacy table inverts on read.
#[test]
fn alias_tables() {
    let mut aliases = IndexMap::new();
    aliases.insert("a1".to_owned(), "a".to_owned());
    aliases.insert("a2".to_owned(), "a".to_owned());

    let data = TaggedCodec::encode_alias_table(&aliases).unwrap();
    let decoded = TaggedCodec::decode_alias_table(&mut Cursor::new(&data), false).unwrap();
    assert_eq!(decoded, aliases);

    // The legacy format stored real key to alias; inverting recovers alias to real key.
    let mut legacy = IndexMap::new();
    legacy.insert("a".to_owned(), "a1".to_owned());
    let legacy_data = TaggedCodec::encode_alias_table(&legacy).unwrap();
    let inverted = TaggedCodec::decode_alias_table(&mut Cursor::new(&legacy_data), true).unwrap();
    assert_eq!(inverted.get("a1"), Some(&"a".to_owned()));
}

/// Library patches round-trip through the envelope, and a kind mismatch is rejected.
#[test]
fn patch_and_envelope_round_trip() {
    let registry = registry();
    let codec = TaggedCodec::new(&registry);

    let mut replaced = IndexMap::new();
    replaced.insert("a".to_owned(), fruit("a", "Apricot", 1));
    let mut appended = IndexMap::new();
    appended.insert("c".to_owned(), fruit("c", "Cherry", 3));
    let patch = LibraryPatch::from_parts("Fruits", "FruitInfo", replaced, appended).unwrap();

    let patch_bytes = codec.encode_entry_patch(&EntryPatch::Library(patch.clone())).unwrap();
    let mut envelope = PatchEnvelope::new();
    envelope.insert("Fruits", patch_bytes);

    let envelope_bytes = TaggedCodec::encode_envelope(&envelope).unwrap();
    let decoded_envelope = TaggedCodec::decode_envelope(&mut Cursor::new(envelope_bytes)).unwrap();
    assert_eq!(decoded_envelope.entries().keys().collect::<Vec<_>>(), vec!["Fruits"]);

    let decoded_patch = codec.decode_entry_patch(
        registry.entry("Fruits").unwrap(),
        &mut Cursor::new(decoded_envelope.entry_bytes("Fruits").unwrap()),
    ).unwrap();
    match decoded_patch {
        EntryPatch::Library(decoded) => {
            assert_eq!(decoded.replaced().keys().collect::<Vec<_>>(), vec!["a"]);
            assert_eq!(decoded.appended().keys().collect::<Vec<_>>(), vec!["c"]);
            assert_eq!(decoded.appended()["c"].value("Name"), Some(&ConfigValue::String("Cherry".to_owned())));
        },
        other => panic!("expected a library patch, got {other:?}"),
    }

    // The same bytes against a key-value entry must not half-apply.
    assert!(codec.decode_entry_patch(
        registry.entry("Globals").unwrap(),
        &mut Cursor::new(decoded_envelope.entry_bytes("Fruits").unwrap()),
    ).is_err());
}
