//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the types that point back into a source spreadsheet.
//!
//! Every diagnostic the pipeline emits carries a [`SourceLocation`], so config authors get sent
//! to the offending cell instead of to a stack trace. Rows and columns are zero-based internally;
//! anything user-facing (rendered URLs) is one-based, with columns as letters.

use getset::Getters;
use serde_derive::{Deserialize, Serialize};

use std::fmt;
use std::fmt::Display;
use std::ops::Range;
use std::sync::Arc;

use crate::utils::column_index_to_letters;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// This enum identifies where a spreadsheet came from.
///
/// Google Sheets fetching itself lives outside this crate; the variant is here so locations in
/// configs authored there can still render to a clickable URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceInfo {

    /// A spreadsheet file on disk (CSV).
    SpreadsheetFile { path: String },

    /// A sheet within a Google Sheets document.
    GoogleSheet { spreadsheet_id: String, sheet_name: String },

    /// An in-memory sheet, mostly used by tests and generated configs.
    Memory { name: String },
}

/// A rectangular range of cells within one source sheet.
///
/// `rows` and `cols` are half-open zero-based ranges.
#[derive(Clone, Debug, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct SourceLocation {
    source: Arc<SourceInfo>,
    rows: Range<u32>,
    cols: Range<u32>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl SourceInfo {

    /// This function returns a short human-readable name for this source.
    pub fn short_name(&self) -> &str {
        match self {
            Self::SpreadsheetFile { path } => path.rsplit('/').next().unwrap_or(path),
            Self::GoogleSheet { sheet_name, .. } => sheet_name,
            Self::Memory { name } => name,
        }
    }

    /// This function renders the provided location within this source as an URL-like string.
    pub fn location_url(&self, location: &SourceLocation) -> String {
        let range = location.range_string();
        match self {
            Self::SpreadsheetFile { path } => format!("{path}!{range}"),
            Self::GoogleSheet { spreadsheet_id, sheet_name } =>
                format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}/edit#sheet={sheet_name}&range={range}"),
            Self::Memory { name } => format!("{name}!{range}"),
        }
    }
}

impl SourceLocation {

    /// This function builds the location of a single cell.
    pub fn cell(source: Arc<SourceInfo>, row: u32, col: u32) -> Self {
        Self { source, rows: row..row + 1, cols: col..col + 1 }
    }

    /// This function builds the location of a rectangular row/column range.
    pub fn range(source: Arc<SourceInfo>, rows: Range<u32>, cols: Range<u32>) -> Self {
        Self { source, rows, cols }
    }

    /// This function builds the location of a single column over the provided rows.
    pub fn column(source: Arc<SourceInfo>, rows: Range<u32>, col: u32) -> Self {
        Self { source, rows, cols: col..col + 1 }
    }

    /// This function builds a location spanning a whole sheet of the provided dimensions.
    pub fn full_sheet(source: Arc<SourceInfo>, n_rows: u32, n_cols: u32) -> Self {
        Self { source, rows: 0..n_rows.max(1), cols: 0..n_cols.max(1) }
    }

    /// This function merges two locations of the same source into their bounding rectangle.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            source: self.source.clone(),
            rows: self.rows.start.min(other.rows.start)..self.rows.end.max(other.rows.end),
            cols: self.cols.start.min(other.cols.start)..self.cols.end.max(other.cols.end),
        }
    }

    /// This function renders the cell range in A1 notation, one-based.
    pub fn range_string(&self) -> String {
        let start = format!("{}{}", column_index_to_letters(self.cols.start), self.rows.start + 1);
        if self.rows.len() <= 1 && self.cols.len() <= 1 {
            start
        } else {
            let end = format!("{}{}", column_index_to_letters(self.cols.end.saturating_sub(1)), self.rows.end);
            format!("{start}:{end}")
        }
    }

    /// This function renders the full URL of this location.
    pub fn url(&self) -> String {
        self.source.location_url(self)
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}!{}", self.source.short_name(), self.range_string())
    }
}
