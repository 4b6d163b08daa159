//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the schema registry.

use super::*;

fn fruits_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.add_struct(StructSchema::new("FruitInfo", 1, vec![
        FieldSchema::new("Id", 1, FieldType::String, true),
        FieldSchema::new("Name", 2, FieldType::String, false),
        FieldSchema::new("Value", 3, FieldType::I32, false),
    ]));
    registry.add_entry(EntrySchema::new("Fruits", EntryKind::Library, EntryScope::Shared, "FruitInfo"));
    registry
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// Lookup by name and by tag.
#[test]
fn field_lookups() {
    let registry = fruits_registry();
    let schema = registry.struct_schema("FruitInfo").unwrap();

    assert_eq!(schema.field_by_name("Name").unwrap().meta_tag(), &2);
    assert_eq!(schema.field_by_tag(3).unwrap().name(), "Value");
    assert!(schema.field_by_name("Missing").is_none());
    assert_eq!(schema.key_fields().len(), 1);
}

/// Entry file names follow the persisted layout.
#[test]
fn entry_file_names() {
    let registry = fruits_registry();
    let entry = registry.entry("Fruits").unwrap();

    assert_eq!(entry.entry_file_name(), "Fruits.mpc");
    assert_eq!(entry.alias_table_file_name(), "Fruits.AliasTable2.mpc");
    assert_eq!(entry.legacy_alias_table_file_name(), "Fruits.AliasTable.mpc");
}

/// RON round-trip preserves the registry.
#[test]
fn ron_round_trip() {
    let registry = fruits_registry();
    let text = ron::ser::to_string_pretty(&registry, ron::ser::PrettyConfig::default()).unwrap();
    let reloaded = SchemaRegistry::load_from_str(&text).unwrap();
    assert_eq!(registry, reloaded);
}

/// Validation catches the internal inconsistencies.
#[test]
fn validation() {
    let registry = fruits_registry();
    assert!(registry.validate().is_ok());

    // A library whose item type has no keys.
    let mut broken = SchemaRegistry::new();
    broken.add_struct(StructSchema::new("Keyless", 1, vec![
        FieldSchema::new("Name", 1, FieldType::String, false),
    ]));
    broken.add_entry(EntrySchema::new("Broken", EntryKind::Library, EntryScope::Shared, "Keyless"));
    assert!(broken.validate().is_err());

    // A reused meta tag.
    let mut broken = SchemaRegistry::new();
    broken.add_struct(StructSchema::new("Reused", 1, vec![
        FieldSchema::new("A", 1, FieldType::String, true),
        FieldSchema::new("B", 1, FieldType::String, false),
    ]));
    assert!(broken.validate().is_err());

    // A ref to a key-value entry.
    let mut broken = fruits_registry();
    broken.add_struct(StructSchema::new("Globals", 1, vec![
        FieldSchema::new("Best", 1, FieldType::Ref("Settings".to_owned()), false),
    ]));
    broken.add_struct(StructSchema::new("SettingsInfo", 1, vec![
        FieldSchema::new("MaxLevel", 1, FieldType::I32, false),
    ]));
    broken.add_entry(EntrySchema::new("Settings", EntryKind::KeyValue, EntryScope::Shared, "SettingsInfo"));
    assert!(broken.validate().is_err());
}
