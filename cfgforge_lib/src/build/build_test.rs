//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! End-to-end tests for the build orchestration: sheets in, archive out, reloaded and served.

use std::sync::Arc;

use crate::archive::{Archive, Decodeable};
use crate::build::import::{load_deduplication_storage, load_game_config};
use crate::dedup::{DeduplicationStorage, PostLoadRegistry};
use crate::error::CfgLibError;
use crate::items::{ConfigValue, ExperimentVariantPair};
use crate::schema::*;
use crate::sheets::Spreadsheet;
use crate::sheets::location::SourceInfo;

use super::*;

fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.add_struct(StructSchema::new("FruitInfo", 1, vec![
        FieldSchema::new("Id", 1, FieldType::String, true),
        FieldSchema::new("Name", 2, FieldType::String, false),
        FieldSchema::new("Value", 3, FieldType::I32, false),
    ]));
    registry.add_entry(EntrySchema::new("Fruits", EntryKind::Library, EntryScope::Shared, "FruitInfo"));

    registry.add_struct(StructSchema::new("GlobalsInfo", 1, vec![
        FieldSchema::new("MaxLevel", 1, FieldType::I32, false),
        FieldSchema::new("Milestones", 2, FieldType::List(Box::new(FieldType::I32)), false),
    ]));
    registry.add_entry(EntrySchema::new("Globals", EntryKind::KeyValue, EntryScope::Shared, "GlobalsInfo"));
    Arc::new(registry)
}

fn sheet(rows: &[Vec<&str>]) -> Spreadsheet {
    Spreadsheet::from_rows(SourceInfo::Memory { name: "test".to_owned() }, rows)
}

fn build(registry: &Arc<SchemaRegistry>, sources: Vec<SheetSource>) -> crate::error::Result<BuildOutput> {
    let builder = GameConfigBuilder::new(registry.clone());
    builder.build(BuildParameters {
        created_at: Some(1_700_000_000_000_000),
        sources,
        ..Default::default()
    })
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// Minimal library round-trip: build, check the entry layout, reload, read a value.
#[test]
fn minimal_library_round_trip() {
    let registry = registry();
    let output = build(&registry, vec![SheetSource::new("Fruits", sheet(&[
        vec!["Id #key", "Name", "Value"],
        vec!["a", "Apple", "1"],
        vec!["b", "Banana", "2"],
    ]))]).unwrap();

    let shared = Archive::decode(&mut output.archive().reader(SHARED_ARCHIVE_NAME).unwrap(), &None).unwrap();
    assert_eq!(shared.entry_names()[0], "Fruits.mpc");

    let config = load_game_config(output.archive(), &registry, EntryScope::Shared).unwrap();
    let library = config.library("Fruits").unwrap();
    assert_eq!(library.items().keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(library.get("a").unwrap().value("Name"), Some(&ConfigValue::String("Apple".to_owned())));
}

/// A variant override column produces a patch envelope, and the reloaded specialization serves
/// the override while the baseline keeps its value. Unset variant cells inherit the baseline.
#[test]
fn variant_override_column() {
    let registry = registry();
    let output = build(&registry, vec![SheetSource::new("Fruits", sheet(&[
        vec!["Id #key", "Name", "/:expA/v1", "Value"],
        vec!["a", "Apple", "Apricot", "1"],
        vec!["b", "Banana", "", "2"],
    ]))]).unwrap();

    assert!(output.archive().contains("SharedPatch.expA.v1.mpp"));

    let storage = load_deduplication_storage(output.archive(), &registry, EntryScope::Shared, &PostLoadRegistry::new()).unwrap();
    let pair = ExperimentVariantPair::new("expA", "v1");

    let baseline = DeduplicationStorage::specialize(&storage, &[], &PostLoadRegistry::new()).unwrap();
    let variant = DeduplicationStorage::specialize(&storage, std::slice::from_ref(&pair), &PostLoadRegistry::new()).unwrap();

    assert_eq!(baseline.item("Fruits", "a").unwrap().value("Name"), Some(&ConfigValue::String("Apple".to_owned())));
    assert_eq!(variant.item("Fruits", "a").unwrap().value("Name"), Some(&ConfigValue::String("Apricot".to_owned())));

    // The overridden item inherits the untouched members, and b inherits everything.
    assert_eq!(variant.item("Fruits", "a").unwrap().value("Value"), Some(&ConfigValue::I32(1)));
    assert!(Arc::ptr_eq(&variant.item("Fruits", "b").unwrap(), &baseline.item("Fruits", "b").unwrap()));
}

/// A baseline item after a variant-appended item fails the build, pointing at the appended row.
#[test]
fn variant_append_order_violation() {
    let registry = registry();
    let result = build(&registry, vec![SheetSource::new("Fruits", sheet(&[
        vec!["Id #key", "Name", "/Variant"],
        vec!["a", "Apple", ""],
        vec!["b", "Banana", "expA/v1"],
        vec!["c", "Cherry", ""],
    ]))]);

    match result {
        Err(CfgLibError::BuildFailed(report)) => {
            let message = report.messages().iter().find(|message| message.text().contains("\"b\"")).unwrap();
            assert!(message.text().contains("must come last"));
            assert!(message.location().is_some());
        },
        other => panic!("expected a build failure, got {:?}", other.is_ok()),
    }
}

/// Aliases survive the archive round-trip through the alias table entry, and legacy tables load
/// inverted.
#[test]
fn alias_round_trip() {
    let registry = registry();
    let output = build(&registry, vec![SheetSource::new("Fruits", sheet(&[
        vec!["Id #key", "Name", "/Aliases"],
        vec!["a", "Apple", "a1,a2"],
        vec!["b", "Banana", ""],
    ]))]).unwrap();

    let shared = Archive::decode(&mut output.archive().reader(SHARED_ARCHIVE_NAME).unwrap(), &None).unwrap();
    assert!(shared.contains("Fruits.AliasTable2.mpc"));

    let config = load_game_config(output.archive(), &registry, EntryScope::Shared).unwrap();
    let library = config.library("Fruits").unwrap();
    assert!(Arc::ptr_eq(library.resolve_ref("a1").unwrap(), library.get("a").unwrap()));

    // A legacy archive carries the inverse mapping under the old name; rebuild the nested
    // archive by hand to simulate one.
    let mut legacy_aliases = indexmap::IndexMap::new();
    legacy_aliases.insert("a".to_owned(), "a1".to_owned());
    let legacy_table = crate::tagged::TaggedCodec::encode_alias_table(&legacy_aliases).unwrap();

    let mut legacy_nested = Archive::new(*shared.created_at());
    for name in shared.entry_names() {
        if name != "Fruits.AliasTable2.mpc" {
            legacy_nested.insert(name, shared.bytes(name).unwrap().to_vec());
        }
    }
    legacy_nested.insert("Fruits.AliasTable.mpc", legacy_table);

    use crate::archive::Encodeable;
    let mut nested_bytes = vec![];
    legacy_nested.encode(&mut nested_bytes, &None).unwrap();
    let mut legacy_archive = output.archive().clone();
    legacy_archive.insert(SHARED_ARCHIVE_NAME, nested_bytes);

    let config = load_game_config(&legacy_archive, &registry, EntryScope::Shared).unwrap();
    let library = config.library("Fruits").unwrap();
    assert_eq!(library.resolve_key("a1"), Some("a"));
}

/// A key-value entry with a variant overlay: an empty overlay collection inherits the baseline.
#[test]
fn key_value_empty_collection_inheritance() {
    let registry = registry();
    let output = build(&registry, vec![SheetSource::new("Globals", sheet(&[
        vec!["Member", "Value", "Value", "Value", "/Variant"],
        vec!["MaxLevel", "30", "", "", ""],
        vec!["Milestones[]", "1", "2", "3", ""],
        vec!["MaxLevel", "40", "", "", "expA/v1"],
        vec!["Milestones[]", "", "", "", "expA/v1"],
    ]))]).unwrap();

    let storage = load_deduplication_storage(output.archive(), &registry, EntryScope::Shared, &PostLoadRegistry::new()).unwrap();
    let pair = ExperimentVariantPair::new("expA", "v1");
    let variant = DeduplicationStorage::specialize(&storage, std::slice::from_ref(&pair), &PostLoadRegistry::new()).unwrap();

    let globals = variant.key_value("Globals").unwrap();
    assert_eq!(globals.value("MaxLevel"), Some(&ConfigValue::I32(40)));
    assert_eq!(globals.value("Milestones"), Some(&ConfigValue::List(vec![
        ConfigValue::I32(1), ConfigValue::I32(2), ConfigValue::I32(3),
    ])));
}

/// Binding failures gate the build with located messages, and the report survives in the error.
#[test]
fn build_gates_on_errors() {
    let registry = registry();
    let result = build(&registry, vec![SheetSource::new("Fruits", sheet(&[
        vec!["Id #key", "Value"],
        vec!["a", "not-a-number"],
    ]))]);

    match result {
        Err(CfgLibError::BuildFailed(report)) => {
            assert!(report.has_errors());
            assert!(report.messages().iter().any(|message| message.location().is_some()));
        },
        other => panic!("expected a build failure, got {:?}", other.is_ok()),
    }
}

/// Incremental builds copy entries with no source sheet forward from the parent by name.
#[test]
fn incremental_copy_forward() {
    let registry = registry();
    let parent = build(&registry, vec![
        SheetSource::new("Fruits", sheet(&[
            vec!["Id #key", "Name", "Value"],
            vec!["a", "Apple", "1"],
        ])),
        SheetSource::new("Globals", sheet(&[
            vec!["Member", "Value"],
            vec!["MaxLevel", "30"],
        ])),
    ]).unwrap();

    // Rebuild only Globals; Fruits must come along unchanged.
    let builder = GameConfigBuilder::new(registry.clone());
    let output = builder.build(BuildParameters {
        created_at: Some(1_700_000_100_000_000),
        sources: vec![SheetSource::new("Globals", sheet(&[
            vec!["Member", "Value"],
            vec!["MaxLevel", "31"],
        ]))],
        parent: Some(parent.archive().clone()),
        parent_version: Some(*parent.archive().version()),
        ..Default::default()
    }).unwrap();

    let config = load_game_config(output.archive(), &registry, EntryScope::Shared).unwrap();
    assert_eq!(config.library("Fruits").unwrap().len(), 1);
    assert_eq!(config.key_value("Globals").unwrap().value("MaxLevel"), Some(&ConfigValue::I32(31)));
}

/// The metadata entry is last, and carries the report.
#[test]
fn metadata_is_last_and_carries_report() {
    let registry = registry();
    let output = build(&registry, vec![SheetSource::new("Fruits", sheet(&[
        vec!["Id #key", "Name", "Value"],
        vec!["a", "Apple", "1"],
    ]))]).unwrap();

    let names = output.archive().entry_names();
    assert_eq!(*names.last().unwrap(), METADATA_ENTRY_NAME);

    let metadata: BuildMetadata = serde_json::from_slice(output.archive().bytes(METADATA_ENTRY_NAME).unwrap()).unwrap();
    assert_eq!(metadata.created_at, 1_700_000_000_000_000);
    assert_eq!(metadata.built_entries, vec!["Fruits".to_owned()]);
    assert_eq!(metadata.num_errors, 0);
}

/// Patch envelope names parse back to their scope and variant.
#[test]
fn envelope_names() {
    let pair = ExperimentVariantPair::new("expA", "v1");
    let name = patch_envelope_name(EntryScope::Shared, &pair);
    assert_eq!(name, "SharedPatch.expA.v1.mpp");
    assert_eq!(parse_patch_envelope_name(&name), Some((EntryScope::Shared, pair.clone())));
    assert_eq!(parse_patch_envelope_name("ServerPatch.expA.v1.mpp"), Some((EntryScope::Server, pair)));
    assert_eq!(parse_patch_envelope_name("Shared.mpa"), None);
}

/// Validators run per variant and fail the build at the validation gate.
#[test]
fn validators_gate_the_build() {
    let registry = registry();
    let builder = GameConfigBuilder::new(registry.clone())
        .with_validator(Arc::new(|_, specialization, log| {
            if specialization.item("Fruits", "banned").is_some() {
                log.error("The key \"banned\" is not allowed.", None);
            }
        }));

    let result = builder.build(BuildParameters {
        created_at: Some(0),
        sources: vec![SheetSource::new("Fruits", sheet(&[
            vec!["Id #key", "Name", "Value"],
            vec!["banned", "Bad", "1"],
        ]))],
        ..Default::default()
    });

    assert!(matches!(result, Err(CfgLibError::ValidationFailed(_))));
}
