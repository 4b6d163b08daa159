//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with generic functions used by the crate.
//!
//! If a function doesn't fit anywhere, it goes here.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{CfgLibError, Result};

//--------------------------------------------------------//
// Generic utils.
//--------------------------------------------------------//

/// This function parses strings to booleans, properly.
pub fn parse_str_as_bool(string: &str) -> Result<bool> {
    let str_lower_case = string.to_lowercase();
    if str_lower_case == "true" || str_lower_case == "1" {
        Ok(true)
    }
    else if str_lower_case == "false" || str_lower_case == "0" {
        Ok(false)
    }
    else {
        Err(CfgLibError::ParseBoolError(string.to_owned()))
    }
}

/// This function returns the current time, in microseconds since the unix epoch.
pub fn current_time_micros() -> Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)
        .map_err(|error| CfgLibError::InvariantViolated(error.to_string()))?
        .as_micros() as i64)
}

//--------------------------------------------------------//
// Spreadsheet coordinate utils.
//--------------------------------------------------------//

/// This function converts a zero-based column index into spreadsheet column letters.
///
/// 0 is A, 25 is Z, 26 is AA, 701 is ZZ, 702 is AAA.
pub fn column_index_to_letters(index: u32) -> String {
    let mut index = index as i64;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        index = index / 26 - 1;
        if index < 0 {
            break;
        }
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
