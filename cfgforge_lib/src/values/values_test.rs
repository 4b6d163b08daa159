//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the scalar cell parser.

use crate::items::ConfigValue;
use crate::schema::{EnumSchema, FieldType, SchemaRegistry};

use super::*;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.add_enum(EnumSchema::new("Rarity", &["Common", "Rare", "Epic"]));
    registry
}

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// The primitive types.
#[test]
fn parse_primitives() {
    let registry = registry();
    assert_eq!(parse_scalar(&FieldType::Bool, "true", &registry).unwrap(), ConfigValue::Bool(true));
    assert_eq!(parse_scalar(&FieldType::Bool, "0", &registry).unwrap(), ConfigValue::Bool(false));
    assert_eq!(parse_scalar(&FieldType::I32, "-42", &registry).unwrap(), ConfigValue::I32(-42));
    assert_eq!(parse_scalar(&FieldType::I64, "9000000000", &registry).unwrap(), ConfigValue::I64(9_000_000_000));
    assert_eq!(parse_scalar(&FieldType::F32, "1.5", &registry).unwrap(), ConfigValue::F32(1.5));
    assert_eq!(parse_scalar(&FieldType::String, "hello", &registry).unwrap(), ConfigValue::String("hello".to_owned()));

    assert!(parse_scalar(&FieldType::Bool, "yes", &registry).is_err());
    assert!(parse_scalar(&FieldType::I32, "1.5", &registry).is_err());
}

/// Enums validate against their declared variants.
#[test]
fn parse_enums() {
    let registry = registry();
    assert_eq!(parse_scalar(&FieldType::Enum("Rarity".to_owned()), "Rare", &registry).unwrap(), ConfigValue::Enum("Rare".to_owned()));
    assert!(parse_scalar(&FieldType::Enum("Rarity".to_owned()), "Legendary", &registry).is_err());
    assert!(parse_scalar(&FieldType::Enum("Unknown".to_owned()), "Rare", &registry).is_err());
}

/// Durations: component syntax and bare seconds.
#[test]
fn parse_durations() {
    assert_eq!(parse_duration("90").unwrap(), 90_000_000);
    assert_eq!(parse_duration("1.5").unwrap(), 1_500_000);
    assert_eq!(parse_duration("90s").unwrap(), 90_000_000);
    assert_eq!(parse_duration("15m").unwrap(), 900_000_000);
    assert_eq!(parse_duration("2h").unwrap(), 7_200_000_000);
    assert_eq!(parse_duration("1d2h3m4.5s").unwrap(), 86_400_000_000 + 7_200_000_000 + 180_000_000 + 4_500_000);
    assert_eq!(parse_duration("-30s").unwrap(), -30_000_000);

    assert!(parse_duration("").is_err());
    assert!(parse_duration("5x").is_err());
    assert!(parse_duration("5m3").is_err());
}

/// References keep their raw key for later canonicalization.
#[test]
fn parse_refs() {
    let registry = registry();
    match parse_scalar(&FieldType::Ref("Fruits".to_owned()), "a1", &registry).unwrap() {
        ConfigValue::Ref(meta_ref) => {
            assert_eq!(meta_ref.target_entry(), "Fruits");
            assert_eq!(meta_ref.raw_key(), "a1");
            assert!(meta_ref.resolved().is_none());
        },
        other => panic!("expected a ref, got {other:?}"),
    }
    assert!(parse_scalar(&FieldType::Ref("Fruits".to_owned()), "", &registry).is_err());
}

/// Inline collections: bracketed, bare and empty forms.
#[test]
fn parse_inline_lists() {
    let registry = registry();
    let element = Box::new(FieldType::I32);

    assert_eq!(
        parse_inline_list(&element, "[1, 2, 3]", &registry).unwrap(),
        ConfigValue::List(vec![ConfigValue::I32(1), ConfigValue::I32(2), ConfigValue::I32(3)]),
    );
    assert_eq!(
        parse_inline_list(&element, "1, 2, 3", &registry).unwrap(),
        ConfigValue::List(vec![ConfigValue::I32(1), ConfigValue::I32(2), ConfigValue::I32(3)]),
    );
    assert_eq!(parse_inline_list(&element, "[]", &registry).unwrap(), ConfigValue::List(vec![]));
    assert_eq!(parse_inline_list(&element, "", &registry).unwrap(), ConfigValue::List(vec![]));

    assert!(parse_inline_list(&element, "[1, 2", &registry).is_err());
    assert!(parse_inline_list(&element, "[1, x]", &registry).is_err());
}
