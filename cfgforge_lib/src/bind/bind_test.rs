//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the output binder.

use crate::build::log::BuildLog;
use crate::items::ConfigValue;
use crate::schema::*;
use crate::sheets::Spreadsheet;
use crate::sheets::location::SourceInfo;
use crate::sheets::postprocess::{extract_aliases, extract_variants};
use crate::sheets::splitter::{split_key_value_items, split_library_items};
use crate::sheets::syntax::RootObject;

use super::*;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.add_enum(EnumSchema::new("Rarity", &["Common", "Rare"]));
    registry.add_struct(StructSchema::new("RewardInfo", 1, vec![
        FieldSchema::new("Type", 1, FieldType::String, false),
        FieldSchema::new("Amount", 2, FieldType::I32, false),
    ]));
    registry.add_struct(StructSchema::new("FruitInfo", 1, vec![
        FieldSchema::new("Id", 1, FieldType::String, true),
        FieldSchema::new("Name", 2, FieldType::String, false),
        FieldSchema::new("Value", 3, FieldType::I32, false),
        FieldSchema::new("Rarity", 4, FieldType::Enum("Rarity".to_owned()), false),
        FieldSchema::new("Rewards", 5, FieldType::List(Box::new(FieldType::Struct("RewardInfo".to_owned()))), false),
        FieldSchema::new("Tags", 6, FieldType::List(Box::new(FieldType::String)), false),
    ]));
    registry.add_entry(EntrySchema::new("Fruits", EntryKind::Library, EntryScope::Shared, "FruitInfo"));

    registry.add_struct(StructSchema::new("GlobalsInfo", 1, vec![
        FieldSchema::new("MaxLevel", 1, FieldType::I32, false),
        FieldSchema::new("Milestones", 2, FieldType::List(Box::new(FieldType::I32)), false),
    ]));
    registry.add_entry(EntrySchema::new("Globals", EntryKind::KeyValue, EntryScope::Shared, "GlobalsInfo"));
    registry
}

fn library_roots(rows: &[Vec<&str>], log: &mut BuildLog) -> Vec<RootObject> {
    let sheet = Spreadsheet::from_rows(SourceInfo::Memory { name: "test".to_owned() }, rows);
    let mut roots = split_library_items(&sheet, log);
    for root in &mut roots {
        extract_aliases(root, log);
    }
    extract_variants(roots)
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// A full library binds with typed values, in sheet order.
#[test]
fn bind_library_items() {
    let registry = registry();
    let mut log = BuildLog::new();
    let roots = library_roots(&[
        vec!["Id #key", "Name", "Value", "Rarity", "Tags"],
        vec!["a", "Apple", "1", "Common", "[red, green]"],
        vec!["b", "Banana", "2", "Rare", ""],
    ], &mut log);

    let binder = Binder::new(&registry, UnknownMemberPolicy::Error);
    let entry = registry.entry("Fruits").unwrap();
    let library = binder.bind_library(entry, &roots, &mut log);

    assert!(!log.has_errors(), "unexpected errors: {log:?}");
    assert_eq!(library.len(), 2);
    assert_eq!(library.items().keys().collect::<Vec<_>>(), vec!["a", "b"]);

    let apple = library.get("a").unwrap();
    assert_eq!(apple.value("Name"), Some(&ConfigValue::String("Apple".to_owned())));
    assert_eq!(apple.value("Value"), Some(&ConfigValue::I32(1)));
    assert_eq!(apple.value("Rarity"), Some(&ConfigValue::Enum("Common".to_owned())));
    assert_eq!(apple.value("Tags"), Some(&ConfigValue::List(vec![
        ConfigValue::String("red".to_owned()),
        ConfigValue::String("green".to_owned()),
    ])));
}

/// Linear collections of structs bind element-wise.
#[test]
fn bind_struct_collections() {
    let registry = registry();
    let mut log = BuildLog::new();
    let roots = library_roots(&[
        vec!["Id #key", "Rewards[].Type", "Rewards[].Amount"],
        vec!["a", "gold", "10"],
        vec!["", "gems", "2"],
    ], &mut log);

    let binder = Binder::new(&registry, UnknownMemberPolicy::Error);
    let library = binder.bind_library(registry.entry("Fruits").unwrap(), &roots, &mut log);
    assert!(!log.has_errors(), "unexpected errors: {log:?}");

    match library.get("a").unwrap().value("Rewards") {
        Some(ConfigValue::List(elements)) => {
            assert_eq!(elements.len(), 2);
            match &elements[1] {
                ConfigValue::Struct(value) => {
                    assert_eq!(value.members().get("Type"), Some(&ConfigValue::String("gems".to_owned())));
                    assert_eq!(value.members().get("Amount"), Some(&ConfigValue::I32(2)));
                },
                other => panic!("expected a struct element, got {other:?}"),
            }
        },
        other => panic!("expected a list, got {other:?}"),
    }
}

/// Aliases register against their item; collisions are errors.
#[test]
fn bind_aliases() {
    let registry = registry();
    let mut log = BuildLog::new();
    let roots = library_roots(&[
        vec!["Id #key", "Name", "/Aliases"],
        vec!["a", "Apple", "a1, a2"],
        vec!["b", "Banana", "a"],
    ], &mut log);

    let binder = Binder::new(&registry, UnknownMemberPolicy::Error);
    let library = binder.bind_library(registry.entry("Fruits").unwrap(), &roots, &mut log);

    assert_eq!(library.resolve_ref("a1").map(|item| item.value("Name")), Some(Some(&ConfigValue::String("Apple".to_owned()))));
    assert_eq!(library.resolve_key("a2"), Some("a"));

    // "a" as alias of "b" collides with the real key "a".
    assert!(log.has_errors());
}

/// Unknown members follow the configured policy.
#[test]
fn bind_unknown_member_policy() {
    let registry = registry();
    let rows = [
        vec!["Id #key", "Mystery"],
        vec!["a", "what"],
    ];

    for (policy, errors, warnings) in [
        (UnknownMemberPolicy::Ignore, false, false),
        (UnknownMemberPolicy::Warn, false, true),
        (UnknownMemberPolicy::Error, true, true),
    ] {
        let mut log = BuildLog::new();
        let roots = library_roots(&rows, &mut log);
        let binder = Binder::new(&registry, policy);
        binder.bind_library(registry.entry("Fruits").unwrap(), &roots, &mut log);

        assert_eq!(log.has_errors(), errors, "policy {policy:?}");
        let has_any = log.messages().iter().any(|message| message.text().contains("Mystery"));
        assert_eq!(has_any, warnings, "policy {policy:?}");
    }
}

/// Scalar parse failures report the offending cell and keep going.
#[test]
fn bind_reports_bad_scalars_with_location() {
    let registry = registry();
    let mut log = BuildLog::new();
    let roots = library_roots(&[
        vec!["Id #key", "Value"],
        vec!["a", "not-a-number"],
    ], &mut log);

    let binder = Binder::new(&registry, UnknownMemberPolicy::Error);
    let library = binder.bind_library(registry.entry("Fruits").unwrap(), &roots, &mut log);

    assert!(log.has_errors());
    let message = log.messages().iter().find(|message| message.text().contains("not-a-number")).unwrap();
    assert!(message.location().is_some());

    // The item still exists, just without the broken member.
    assert!(library.get("a").unwrap().value("Value").is_none());
}

/// A key-value sheet binds into a structure.
#[test]
fn bind_key_value_structure() {
    let registry = registry();
    let mut log = BuildLog::new();
    let sheet = Spreadsheet::from_rows(SourceInfo::Memory { name: "test".to_owned() }, &[
        vec!["Member", "Value", "Value"],
        vec!["MaxLevel", "30", ""],
        vec!["Milestones[]", "5", "10"],
    ]);
    let roots = split_key_value_items(&sheet, &mut log);

    let binder = Binder::new(&registry, UnknownMemberPolicy::Error);
    let structure = binder.bind_key_value(registry.entry("Globals").unwrap(), &roots[0], &mut log);

    assert!(!log.has_errors(), "unexpected errors: {log:?}");
    assert_eq!(structure.value("MaxLevel"), Some(&ConfigValue::I32(30)));
    assert_eq!(structure.value("Milestones"), Some(&ConfigValue::List(vec![ConfigValue::I32(5), ConfigValue::I32(10)])));
}
