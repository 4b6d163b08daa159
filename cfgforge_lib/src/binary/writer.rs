//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the [`WriteBytes`] trait, to write known types as bytes.

use byteorder::{LittleEndian, WriteBytesExt};

use std::io::Write;

use crate::error::Result;

//---------------------------------------------------------------------------//
//                            Trait Definition
//---------------------------------------------------------------------------//

/// This trait allow us to easily write all kind of data to a destination that implements [`Write`].
pub trait WriteBytes: Write {

    /// This function tries to write a bool value to `self`.
    fn write_bool(&mut self, boolean: bool) -> Result<()> {
        self.write_u8(u8::from(boolean))
    }

    /// This function tries to write a byte value to `self`.
    fn write_u8(&mut self, value: u8) -> Result<()> {
        WriteBytesExt::write_u8(self, value).map_err(From::from)
    }

    /// This function tries to write an u16 value to `self`.
    fn write_u16(&mut self, value: u16) -> Result<()> {
        WriteBytesExt::write_u16::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write an u32 value to `self`.
    fn write_u32(&mut self, value: u32) -> Result<()> {
        WriteBytesExt::write_u32::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write an u64 value to `self`.
    fn write_u64(&mut self, value: u64) -> Result<()> {
        WriteBytesExt::write_u64::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write an u128 value to `self`.
    ///
    /// Content hashes are stored on disk in this format.
    fn write_u128(&mut self, value: u128) -> Result<()> {
        WriteBytesExt::write_u128::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write an i32 value to `self`.
    fn write_i32(&mut self, value: i32) -> Result<()> {
        WriteBytesExt::write_i32::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write an i64 value to `self`.
    fn write_i64(&mut self, value: i64) -> Result<()> {
        WriteBytesExt::write_i64::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write a f32 value to `self`.
    fn write_f32(&mut self, value: f32) -> Result<()> {
        WriteBytesExt::write_f32::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write a f64 value to `self`.
    fn write_f64(&mut self, value: f64) -> Result<()> {
        WriteBytesExt::write_f64::<LittleEndian>(self, value).map_err(From::from)
    }

    /// This function tries to write an UTF-8 String to `self`, without any length before it.
    fn write_string_u8(&mut self, string: &str) -> Result<()> {
        self.write_all(string.as_bytes()).map_err(From::from)
    }

    /// This function tries to write a Sized StringU8 to `self`.
    ///
    /// The first two bytes written are the length of the string, in bytes.
    fn write_sized_string_u8(&mut self, string: &str) -> Result<()> {
        self.write_u16(string.len() as u16)?;
        self.write_string_u8(string)
    }
}

// Automatic implementation for everything implementing `Write`.
impl<W: Write> WriteBytes for W {}
