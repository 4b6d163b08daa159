//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the spreadsheet-side of the pipeline: the rectangular cell model, the
//! header-path DSL, and the machinery that turns content rows into syntax trees.
//!
//! The pipeline, in order:
//!
//! | Stage | Module | Output |
//! | ----- | ------ | ------ |
//! | Load + preprocess | this module | [`Spreadsheet`] (rectangular, comment rows stripped) |
//! | Header parse | [`header`] | one [`SliceInfo`](header::SliceInfo) per column/row |
//! | Tree build | [`path_tree`] | a [`PathNode`](path_tree::PathNode) describing the row shape |
//! | Item split | [`splitter`] | one [`RootObject`](syntax::RootObject) per (item x variant) |
//! | Post-process | [`postprocess`] | aliases extracted, variants split out, baseline inherited |
//!
//! Stages report problems into the [`BuildLog`](crate::build::BuildLog) with cell-accurate
//! [`SourceLocation`](location::SourceLocation)s and keep going wherever that's sound.

use getset::Getters;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub mod header;
pub mod location;
pub mod path_tree;
pub mod postprocess;
pub mod splitter;
pub mod syntax;

#[cfg(test)] mod header_test;
#[cfg(test)] mod postprocess_test;

use self::location::{SourceInfo, SourceLocation};

/// Prefix marking a header or a whole row as a comment.
pub const COMMENT_PREFIX: &str = "//";

/// Reserved header naming the variant id column/row.
pub const VARIANT_HEADER: &str = "/Variant";

/// Reserved header naming the alias list column/row.
pub const ALIASES_HEADER: &str = "/Aliases";

/// Prefix of a variant override column.
pub const VARIANT_OVERRIDE_PREFIX: &str = "/:";

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// One cell of a spreadsheet.
///
/// `row` and `col` are the cell's coordinates in the ORIGINAL sheet, so they survive the
/// transposition key-value sheets go through and diagnostics stay accurate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpreadsheetCell {
    pub value: String,
    pub row: u32,
    pub col: u32,
}

/// A rectangular sheet of cells, plus where it came from.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Spreadsheet {

    /// The source this sheet was loaded from.
    source: Arc<SourceInfo>,

    /// The cells, `cells[row][col]`, padded to a rectangle.
    cells: Vec<Vec<SpreadsheetCell>>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl SpreadsheetCell {

    /// This function returns true if the cell holds no value.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// This function returns the location of this single cell.
    pub fn location(&self, source: &Arc<SourceInfo>) -> SourceLocation {
        SourceLocation::cell(source.clone(), self.row, self.col)
    }
}

impl Spreadsheet {

    /// This function builds a sheet from rows of raw values. Mostly used by tests.
    pub fn from_rows(source: SourceInfo, rows: &[Vec<&str>]) -> Self {
        let cells = rows.iter()
            .enumerate()
            .map(|(row, values)| values.iter()
                .enumerate()
                .map(|(col, value)| SpreadsheetCell { value: value.trim().to_owned(), row: row as u32, col: col as u32 })
                .collect())
            .collect();

        let mut sheet = Self { source: Arc::new(source), cells };
        sheet.preprocess();
        sheet
    }

    /// This function reads a sheet from CSV data.
    pub fn from_csv_reader<R: Read>(source: SourceInfo, data: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut cells = vec![];
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            cells.push(record.iter()
                .enumerate()
                .map(|(col, value)| SpreadsheetCell { value: value.trim().to_owned(), row: row as u32, col: col as u32 })
                .collect());
        }

        let mut sheet = Self { source: Arc::new(source), cells };
        sheet.preprocess();
        Ok(sheet)
    }

    /// This function reads a sheet from a CSV file on disk.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let source = SourceInfo::SpreadsheetFile { path: path.to_string_lossy().replace('\\', "/") };
        let data = std::fs::File::open(path)?;
        Self::from_csv_reader(source, data)
    }

    /// Preprocessing: pad all rows to the same width and drop comment rows.
    ///
    /// A row is a comment when its first non-empty cell starts with `//`. The header row is
    /// never dropped: a comment HEADER only silences its own column.
    fn preprocess(&mut self) {
        let mut index = 0;
        self.cells.retain(|row| {
            index += 1;
            if index == 1 {
                return true;
            }
            match row.iter().find(|cell| !cell.is_empty()) {
                Some(first) => !first.value.starts_with(COMMENT_PREFIX),
                None => true,
            }
        });

        let width = self.cells.iter().map(|row| row.len()).max().unwrap_or(0);
        for row in &mut self.cells {
            let row_index = row.first().map(|cell| cell.row).unwrap_or(0);
            while row.len() < width {
                row.push(SpreadsheetCell { value: String::new(), row: row_index, col: row.len() as u32 });
            }
        }
    }

    /// This function returns the amount of rows in the sheet.
    pub fn n_rows(&self) -> u32 {
        self.cells.len() as u32
    }

    /// This function returns the amount of columns in the sheet.
    pub fn n_cols(&self) -> u32 {
        self.cells.first().map(|row| row.len() as u32).unwrap_or(0)
    }

    /// This function returns true if every cell of the sheet is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// This function returns the location spanning the whole sheet.
    pub fn full_location(&self) -> SourceLocation {
        SourceLocation::full_sheet(self.source.clone(), self.n_rows(), self.n_cols())
    }

    /// This function returns a transposed view of the sheet, with cells keeping their original
    /// coordinates.
    ///
    /// Key-value sheets are authored vertically; transposing lets the horizontal item machinery
    /// run unchanged on them.
    pub fn transposed(&self) -> Self {
        let n_rows = self.n_rows() as usize;
        let n_cols = self.n_cols() as usize;
        let mut cells = vec![Vec::with_capacity(n_rows); n_cols];
        for row in &self.cells {
            for (col, cell) in row.iter().enumerate() {
                cells[col].push(cell.clone());
            }
        }
        Self { source: self.source.clone(), cells }
    }
}
