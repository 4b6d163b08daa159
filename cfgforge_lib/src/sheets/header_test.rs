//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the header-path DSL parser.

use std::sync::Arc;

use super::Spreadsheet;
use super::header::*;
use super::location::{SourceInfo, SourceLocation};

fn location() -> SourceLocation {
    SourceLocation::cell(Arc::new(SourceInfo::Memory { name: "test".to_owned() }), 0, 0)
}

fn parse(value: &str) -> Result<ParsedHeader, crate::build::log::BuildMessage> {
    parse_header_cell(value, 0, &location())
}

fn slice(value: &str) -> SliceInfo {
    match parse(value).unwrap() {
        ParsedHeader::Slice(slice) => slice,
        other => panic!("expected a slice, got {other:?}"),
    }
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// Plain member path.
#[test]
fn parse_simple_member() {
    let slice = slice("Name");
    assert_eq!(slice.segments().len(), 1);
    assert_eq!(slice.segments()[0].name(), "Name");
    assert_eq!(*slice.segments()[0].kind(), SegmentKind::Root);
    assert!(!slice.is_key());
}

/// Nested member path.
#[test]
fn parse_nested_member() {
    let slice = slice("Producer.Amount");
    assert_eq!(slice.segments().len(), 2);
    assert_eq!(slice.segments()[0].name(), "Producer");
    assert_eq!(slice.segments()[1].name(), "Amount");
    assert_eq!(*slice.segments()[1].kind(), SegmentKind::Member);
}

/// Linear collection, bare and with a member.
#[test]
fn parse_linear_collection() {
    let bare = slice("Rewards[]");
    assert_eq!(*bare.segments()[0].kind(), SegmentKind::LinearCollection);

    let with_member = slice("Rewards[].Amount");
    assert_eq!(*with_member.segments()[0].kind(), SegmentKind::LinearCollection);
    assert_eq!(with_member.segments()[1].name(), "Amount");
}

/// Indexed element with its index.
#[test]
fn parse_indexed_element() {
    let slice = slice("Rewards[3]");
    assert_eq!(*slice.segments()[0].kind(), SegmentKind::IndexedElement);
    assert_eq!(*slice.segments()[0].element_index(), Some(3));
}

/// Tags, with and without a value.
#[test]
fn parse_tags() {
    let key = slice("Id #key");
    assert!(key.is_key());
    assert_eq!(key.segments()[0].name(), "Id");

    let comment = slice("Notes #comment");
    assert!(comment.is_comment());
}

/// Comment headers and empty headers parse to nothing.
#[test]
fn parse_empty_and_comment() {
    assert_eq!(parse("").unwrap(), ParsedHeader::Empty);
    assert_eq!(parse("   ").unwrap(), ParsedHeader::Empty);
    assert_eq!(parse("// ignore me").unwrap(), ParsedHeader::Empty);
}

/// A bare #comment tag is allowed without a path; other tags are not.
#[test]
fn parse_tag_on_empty_path() {
    assert!(matches!(parse("#comment").unwrap(), ParsedHeader::Slice(_)));
    assert!(parse("#key").is_err());
}

/// Reserved headers.
#[test]
fn parse_reserved_headers() {
    assert!(slice("/Variant").is_variant_id());
    assert!(slice("/Aliases").is_aliases());
}

/// Variant override headers with one and several ids.
#[test]
fn parse_variant_override() {
    assert_eq!(parse("/:expA/v1").unwrap(), ParsedHeader::VariantOverride(vec!["expA/v1".to_owned()]));
    assert_eq!(
        parse("/:expA/v1, expA/v2").unwrap(),
        ParsedHeader::VariantOverride(vec!["expA/v1".to_owned(), "expA/v2".to_owned()]),
    );
    assert!(parse("/:").is_err());
}

/// Every malformed-header case of the grammar.
#[test]
fn parse_bad_headers() {

    // Empty-named segments.
    assert!(parse(".Name").is_err());
    assert!(parse("A..B").is_err());
    assert!(parse("A.").is_err());

    // Unbalanced brackets.
    assert!(parse("A[").is_err());
    assert!(parse("A[3").is_err());
    assert!(parse("A]").is_err());
    assert!(parse("A[]]").is_err());

    // Unknown tag.
    assert!(parse("A #color").is_err());

    // Tokens after the final tag.
    assert!(parse("A #key B").is_err());
}

/// Variant override columns inherit the path of the nearest non-variant column to their left.
#[test]
fn variant_override_inherits_left_neighbour() {
    let sheet = Spreadsheet::from_rows(
        SourceInfo::Memory { name: "test".to_owned() },
        &[vec!["Id #key", "Name", "/:expA/v1"]],
    );

    let mut errors = vec![];
    let slices = parse_header_row(&sheet, &mut errors);
    assert!(errors.is_empty());
    assert_eq!(slices.len(), 3);

    let override_slice = &slices[2];
    assert_eq!(override_slice.segments()[0].name(), "Name");
    assert_eq!(override_slice.variant_id(), Some("expA/v1"));
    assert_eq!(*override_slice.index(), 2);
}

/// A variant override column with nothing to its left is an error.
#[test]
fn variant_override_without_predecessor() {
    let sheet = Spreadsheet::from_rows(
        SourceInfo::Memory { name: "test".to_owned() },
        &[vec!["/:expA/v1", "Id #key"]],
    );

    let mut errors = vec![];
    let slices = parse_header_row(&sheet, &mut errors);
    assert_eq!(errors.len(), 1);
    assert_eq!(slices.len(), 1);
}
