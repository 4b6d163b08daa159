//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the scalar cell parser: one cell string in, one typed [`ConfigValue`] out.
//!
//! The parser dispatches on the declared [`FieldType`]. Inline collections accept both
//! `[a, b, c]` and bare `a, b, c` forms. Durations accept day/hour/minute/second components
//! (`1d2h3m4.5s`) and bare seconds; instants accept integer seconds since the unix epoch.
//!
//! Errors are plain strings: the binder owns the location and wraps them into build messages.

use crate::items::{ConfigValue, MetaRef};
use crate::schema::{FieldType, SchemaRegistry};
use crate::utils::parse_str_as_bool;

#[cfg(test)] mod values_test;

/// Microseconds per second, for duration math.
const MICROS_PER_SECOND: i64 = 1_000_000;

//---------------------------------------------------------------------------//
//                              Parsing functions
//---------------------------------------------------------------------------//

/// This function parses one scalar cell into a typed value.
pub fn parse_scalar(field_type: &FieldType, text: &str, registry: &SchemaRegistry) -> Result<ConfigValue, String> {
    let text = text.trim();
    match field_type {
        FieldType::Bool => parse_str_as_bool(text)
            .map(ConfigValue::Bool)
            .map_err(|error| error.to_string()),
        FieldType::I32 => text.parse().map(ConfigValue::I32).map_err(|_| format!("cannot parse \"{text}\" as a 32-bit integer")),
        FieldType::I64 => text.parse().map(ConfigValue::I64).map_err(|_| format!("cannot parse \"{text}\" as a 64-bit integer")),
        FieldType::F32 => text.parse().map(ConfigValue::F32).map_err(|_| format!("cannot parse \"{text}\" as a 32-bit float")),
        FieldType::F64 => text.parse().map(ConfigValue::F64).map_err(|_| format!("cannot parse \"{text}\" as a 64-bit float")),
        FieldType::String => Ok(ConfigValue::String(text.to_owned())),
        FieldType::Enum(enum_name) => {
            let schema = registry.enum_schema(enum_name).ok_or_else(|| format!("unknown enum type \"{enum_name}\""))?;
            if schema.variants().iter().any(|variant| variant == text) {
                Ok(ConfigValue::Enum(text.to_owned()))
            } else {
                Err(format!("\"{text}\" is not a variant of the enum \"{enum_name}\""))
            }
        },
        FieldType::Duration => parse_duration(text).map(ConfigValue::Duration),
        FieldType::Instant => text.parse::<i64>()
            .map(|seconds| ConfigValue::Instant(seconds * MICROS_PER_SECOND))
            .map_err(|_| format!("cannot parse \"{text}\" as an instant (seconds since the unix epoch)")),
        FieldType::Ref(entry_name) => {
            if text.is_empty() {
                Err("a reference cell cannot be empty".to_owned())
            } else {
                Ok(ConfigValue::Ref(MetaRef::new(entry_name, text)))
            }
        },
        FieldType::List(inner) => parse_inline_list(inner, text, registry),
        FieldType::Struct(type_name) => Err(format!("the struct type \"{type_name}\" cannot be written in a single cell; use nested headers")),
    }
}

/// This function parses an inline collection cell: `[a, b, c]` or bare `a, b, c`.
pub fn parse_inline_list(element_type: &FieldType, text: &str, registry: &SchemaRegistry) -> Result<ConfigValue, String> {
    let text = text.trim();
    let inner = match text.strip_prefix('[') {
        Some(rest) => rest.strip_suffix(']').ok_or_else(|| format!("unterminated \"[\" in the inline collection \"{text}\""))?,
        None => text,
    };

    if inner.trim().is_empty() {
        return Ok(ConfigValue::List(vec![]));
    }

    let mut elements = vec![];
    for part in split_top_level(inner) {
        elements.push(parse_scalar(element_type, part.trim(), registry)?);
    }
    Ok(ConfigValue::List(elements))
}

/// Splits on commas, ignoring commas nested inside brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (index, char) in text.char_indices() {
        match char {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..index]);
                start = index + 1;
            },
            _ => {},
        }
    }
    parts.push(&text[start..]);
    parts
}

/// This function parses a duration: `[-]` then any of `Nd`, `Nh`, `Nm`, `Ns` components (seconds
/// may carry a fraction), or a bare number of seconds.
pub fn parse_duration(text: &str) -> Result<i64, String> {
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, text),
    };

    if text.is_empty() {
        return Err("cannot parse an empty duration".to_owned());
    }

    // Bare number: seconds.
    if let Ok(seconds) = text.parse::<f64>() {
        let micros = (seconds * MICROS_PER_SECOND as f64).round() as i64;
        return Ok(if negative { -micros } else { micros });
    }

    let mut total: i64 = 0;
    let mut number = String::new();
    for char in text.chars() {
        if char.is_ascii_digit() || char == '.' {
            number.push(char);
            continue;
        }

        let multiplier = match char {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => return Err(format!("unknown duration component \"{char}\" in \"{text}\"")),
        };

        let value: f64 = number.parse().map_err(|_| format!("invalid number \"{number}\" in the duration \"{text}\""))?;
        total += (value * (multiplier * MICROS_PER_SECOND) as f64).round() as i64;
        number.clear();
    }

    if !number.is_empty() {
        return Err(format!("the duration \"{text}\" ends with a number missing its unit"));
    }

    Ok(if negative { -total } else { total })
}
