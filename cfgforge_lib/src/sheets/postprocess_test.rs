//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the post-processing passes.

use crate::build::log::BuildLog;

use super::Spreadsheet;
use super::location::SourceInfo;
use super::postprocess::*;
use super::splitter::{split_key_value_items, split_library_items};
use super::syntax::{Node, RootObject};

fn library_roots(rows: &[Vec<&str>]) -> (Vec<RootObject>, BuildLog) {
    let mut log = BuildLog::new();
    let sheet = Spreadsheet::from_rows(SourceInfo::Memory { name: "test".to_owned() }, rows);
    let roots = split_library_items(&sheet, &mut log);
    (roots, log)
}

fn scalar_value(root: &RootObject, member: &str) -> String {
    match root.node().member(member) {
        Some(Node::Scalar(scalar)) => scalar.value().clone(),
        other => panic!("expected a scalar for \"{member}\", got {other:?}"),
    }
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// The /Aliases member moves out of the object into the root.
#[test]
fn aliases_are_extracted() {
    let (mut roots, mut log) = library_roots(&[
        vec!["Id #key", "Name", "/Aliases"],
        vec!["a", "Apple", "a1,a2"],
    ]);

    extract_aliases(&mut roots[0], &mut log);
    assert!(!log.has_errors());
    assert_eq!(roots[0].aliases(), &Some("a1,a2".to_owned()));
    assert!(roots[0].node().member("/Aliases").is_none());
}

/// Variant override columns split into sibling roots carrying the item's identity.
#[test]
fn variants_are_extracted() {
    let (roots, log) = library_roots(&[
        vec!["Id #key", "Name", "/:expA/v1"],
        vec!["a", "Apple", "Apricot"],
    ]);
    assert!(!log.has_errors());

    let roots = extract_variants(roots);
    assert_eq!(roots.len(), 2);

    assert_eq!(roots[0].variant_id(), &None);
    assert_eq!(scalar_value(&roots[0], "Name"), "Apple");

    assert_eq!(roots[1].variant_id(), &Some("expA/v1".to_owned()));
    assert_eq!(roots[1].id(), &["a".to_owned()]);
    assert_eq!(scalar_value(&roots[1], "Name"), "Apricot");
}

/// An unset cell in a variant column means the member inherits the baseline value.
#[test]
fn variant_overlays_inherit_absent_members() {
    let (roots, _) = library_roots(&[
        vec!["Id #key", "Name", "/:expA/v1", "Value"],
        vec!["a", "Apple", "Apricot", "1"],
    ]);

    let mut roots = extract_variants(roots);
    inherit_variant_values_from_baseline(&mut roots);

    let overlay = roots.iter().find(|root| root.variant_id().is_some()).unwrap();
    assert_eq!(scalar_value(overlay, "Name"), "Apricot");
    assert_eq!(scalar_value(overlay, "Value"), "1");
}

/// A key-value variant overlay drops empty collections, so the baseline's collection survives.
#[test]
fn key_value_empty_collection_inherits_baseline() {
    let mut log = BuildLog::new();
    let sheet = Spreadsheet::from_rows(SourceInfo::Memory { name: "test".to_owned() }, &[
        vec!["Member", "Value", "Value", "Value", "/Variant"],
        vec!["Milestones[]", "1", "2", "3", ""],
        vec!["Milestones[]", "", "", "", "expA/v1"],
    ]);
    let roots = split_key_value_items(&sheet, &mut log);
    assert!(!log.has_errors());

    let mut roots = extract_variants(roots);
    inherit_key_value_variant_values_from_baseline(&mut roots);

    let overlay = roots.iter().find(|root| root.variant_id().is_some()).unwrap();
    match overlay.node().member("Milestones") {
        Some(Node::Collection(collection)) => assert_eq!(collection.elements().len(), 3),
        other => panic!("expected the baseline collection, got {other:?}"),
    }
}

/// Duplicate (item, variant) pairs report both locations.
#[test]
fn duplicates_are_detected() {
    let (roots, mut log) = library_roots(&[
        vec!["Id #key", "Name"],
        vec!["a", "Apple"],
        vec!["a", "Apricot"],
    ]);

    detect_duplicate_objects(&roots, &mut log);
    assert!(log.has_errors());
    let message = log.messages().iter().find(|message| message.text().contains("more than once")).unwrap();
    assert!(message.location().is_some());
    assert!(message.text().contains("First definition"));
}
