//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Tests for the [`WriteBytes`] trait.
//!
//! [`WriteBytes`]: crate::binary::WriteBytes

use super::WriteBytes;

//---------------------------------------------------------------------------//
//                                  Tests
//---------------------------------------------------------------------------//

/// Test to `WriteBytes::write_bool()`.
#[test]
fn write_bool() {
    let mut data = vec![];
    data.write_bool(true).unwrap();
    data.write_bool(false).unwrap();
    assert_eq!(data, vec![1, 0]);
}

/// Test to `WriteBytes::write_u16()`.
#[test]
fn write_u16() {
    let mut data = vec![];
    data.write_u16(10).unwrap();
    assert_eq!(data, vec![10, 0]);
}

/// Test to `WriteBytes::write_u32()`.
#[test]
fn write_u32() {
    let mut data = vec![];
    data.write_u32(10).unwrap();
    assert_eq!(data, vec![10, 0, 0, 0]);
}

/// Test to `WriteBytes::write_u128()`.
#[test]
fn write_u128() {
    let mut data = vec![];
    data.write_u128(10).unwrap();
    assert_eq!(data, vec![10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
}

/// Test to `WriteBytes::write_i64()`.
#[test]
fn write_i64() {
    let mut data = vec![];
    data.write_i64(-10).unwrap();
    assert_eq!(data, vec![246, 255, 255, 255, 255, 255, 255, 255]);
}

/// Test to `WriteBytes::write_f32()`.
#[test]
fn write_f32() {
    let mut data = vec![];
    data.write_f32(1.0).unwrap();
    assert_eq!(data, vec![0, 0, 128, 63]);
}

/// Test to `WriteBytes::write_sized_string_u8()`.
#[test]
fn write_sized_string_u8() {
    let mut data = vec![];
    data.write_sized_string_u8("Wahahahaha").unwrap();
    assert_eq!(data, vec![10, 0, 87, 97, 104, 97, 104, 97, 104, 97, 104, 97]);
}
