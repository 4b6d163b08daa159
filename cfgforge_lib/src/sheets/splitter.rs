//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the item splitter: the stage that divides content rows into items and builds one
//! syntax tree per item.
//!
//! Libraries are horizontal (one item per row group, one member per column); key-value sheets are
//! vertical (one member per row, values spanning columns). Both run through the same node-building
//! machinery, fed by a different cell accessor.

use crate::build::log::BuildLog;
use crate::sheets::{Spreadsheet, SpreadsheetCell};
use crate::sheets::header::{ParsedHeader, SliceInfo, parse_header_cell, parse_header_row};
use crate::sheets::location::{SourceInfo, SourceLocation};
use crate::sheets::path_tree::{PathNode, PathNodeCollection, PathNodeObject, build_path_tree};
use crate::sheets::syntax::{CollectionNode, Node, NodeMemberId, ObjectNode, RootObject, ScalarNode};

use std::sync::Arc;

/// Header label of the member-path column in a key-value sheet.
const KEY_VALUE_MEMBER_HEADER: &str = "Member";

/// Header label of the value columns in a key-value sheet.
const KEY_VALUE_VALUE_HEADER: &str = "Value";

//---------------------------------------------------------------------------//
//                          Library item splitting
//---------------------------------------------------------------------------//

/// This function splits a library sheet into one [`RootObject`] per item.
///
/// Variant members stay inline in the returned roots; [`extract_variants`] splits them out later.
///
/// [`extract_variants`]: crate::sheets::postprocess::extract_variants
pub fn split_library_items(sheet: &Spreadsheet, log: &mut BuildLog) -> Vec<RootObject> {
    if sheet.is_empty() {
        log.error("Input sheet is completely empty.", Some(sheet.full_location()));
        return vec![];
    }

    let mut errors = vec![];
    let slices = parse_header_row(sheet, &mut errors);
    for error in errors {
        log.push(error);
    }

    let variant_slice = slices.iter().find(|slice| slice.is_variant_id()).cloned();
    let data_slices = slices.iter()
        .filter(|slice| !slice.is_comment() && !slice.is_variant_id())
        .cloned()
        .collect::<Vec<_>>();

    let key_columns = data_slices.iter()
        .filter(|slice| slice.is_key() && slice.variant_id().is_none())
        .map(|slice| *slice.index())
        .collect::<Vec<_>>();
    if key_columns.is_empty() {
        log.error("Library sheet has no #key column.", Some(sheet.full_location()));
        return vec![];
    }

    let mut tree_errors = vec![];
    let tree = build_path_tree(&data_slices, &mut tree_errors);
    for error in tree_errors {
        log.push(error);
    }

    // Mutable copy of the content rows, because inherited key values are written back.
    let mut rows = sheet.cells().iter().skip(1).cloned().collect::<Vec<_>>();

    let item_ranges = split_item_ranges(sheet.source(), &mut rows, &key_columns, variant_slice.as_ref().map(|slice| *slice.index()), log);

    let mut roots = vec![];
    for range in item_ranges {
        let item_rows = &rows[range.start..range.end];
        let first_row = &item_rows[0];

        let id = key_columns.iter()
            .map(|col| first_row.get(*col as usize).map(|cell| cell.value.clone()).unwrap_or_default())
            .collect::<Vec<_>>();

        let variant_id = variant_slice.as_ref()
            .and_then(|slice| first_row.get(*slice.index() as usize))
            .map(|cell| cell.value.clone())
            .filter(|value| !value.is_empty());

        let location = item_location(sheet, item_rows);
        let cells_of = |slice: &SliceInfo| item_rows.iter()
            .map(|row| row.get(*slice.index() as usize).cloned().unwrap_or_default())
            .collect::<Vec<_>>();

        let node = build_item_object(&tree, &cells_of, sheet.source(), false, log);
        roots.push(RootObject::new(id, node, location, variant_id));
    }

    roots
}

/// A half-open range of content-row indexes belonging to one item.
struct ItemRange {
    start: usize,
    end: usize,
}

/// This function finds the row ranges of the items, inheriting key values downward.
///
/// A row begins a new item if any of its key cells or its variant cell is non-empty. The leading
/// block of fully empty rows is skipped; interior empty rows belong to the item above them.
fn split_item_ranges(
    source: &Arc<SourceInfo>,
    rows: &mut [Vec<SpreadsheetCell>],
    key_columns: &[u32],
    variant_column: Option<u32>,
    log: &mut BuildLog,
) -> Vec<ItemRange> {
    let mut ranges: Vec<ItemRange> = vec![];
    let mut last_key_values: Vec<Option<String>> = vec![None; key_columns.len()];

    for index in 0..rows.len() {
        let row_is_empty = rows[index].iter().all(SpreadsheetCell::is_empty);
        let has_key = key_columns.iter().any(|col| rows[index].get(*col as usize).is_some_and(|cell| !cell.is_empty()));
        let has_variant = variant_column.is_some_and(|col| rows[index].get(col as usize).is_some_and(|cell| !cell.is_empty()));

        if has_key || has_variant {

            // Close the previous item and start a new one, filling missing identity cells from
            // the rows above.
            if let Some(range) = ranges.last_mut() {
                range.end = index;
            }

            for (key_index, col) in key_columns.iter().enumerate() {
                let cell = &mut rows[index][*col as usize];
                if cell.is_empty() {
                    match &last_key_values[key_index] {
                        Some(value) => cell.value = value.clone(),
                        None => log.error(
                            "Missing key value, and there is no earlier value in this column to inherit.",
                            Some(SourceLocation::cell(source.clone(), cell.row, cell.col)),
                        ),
                    }
                } else {
                    last_key_values[key_index] = Some(cell.value.clone());
                }
            }

            ranges.push(ItemRange { start: index, end: rows.len() });
        } else if ranges.is_empty() {

            // Before the first item only fully empty rows are allowed.
            if !row_is_empty {
                let cell = rows[index].iter().find(|cell| !cell.is_empty()).unwrap();
                log.error(
                    "This row does not begin an item (its key cells are empty) and there is no item above it to continue.",
                    Some(SourceLocation::cell(source.clone(), cell.row, cell.col)),
                );
            }
        } else {

            // Continuation row: write the inherited identity back so reflection sees it.
            for (key_index, col) in key_columns.iter().enumerate() {
                let cell = &mut rows[index][*col as usize];
                if cell.is_empty() && !row_is_empty {
                    if let Some(value) = &last_key_values[key_index] {
                        cell.value = value.clone();
                    }
                }
            }
        }
    }

    ranges
}

/// This function computes the location spanning all rows of one item.
fn item_location(sheet: &Spreadsheet, item_rows: &[Vec<SpreadsheetCell>]) -> SourceLocation {
    let first = item_rows.first().and_then(|row| row.first()).map(|cell| cell.row).unwrap_or(0);
    let last = item_rows.last().and_then(|row| row.first()).map(|cell| cell.row).unwrap_or(first);
    SourceLocation::range(sheet.source().clone(), first..last + 1, 0..sheet.n_cols())
}

//---------------------------------------------------------------------------//
//                        Key-value item splitting
//---------------------------------------------------------------------------//

/// This function splits a key-value sheet into its single item.
///
/// The sheet is vertical: a mandatory header row declares `Member` and one or more `Value`
/// columns, plus an optional `/Variant` column. Each content row declares one member; collection
/// members take one element per value column. Variant members stay inline, like in libraries.
pub fn split_key_value_items(sheet: &Spreadsheet, log: &mut BuildLog) -> Vec<RootObject> {
    if sheet.is_empty() {
        log.error("Input sheet is completely empty.", Some(sheet.full_location()));
        return vec![];
    }

    let header_row = match sheet.cells().first() {
        Some(row) => row,
        None => return vec![],
    };

    let member_column = header_row.iter().position(|cell| cell.value == KEY_VALUE_MEMBER_HEADER);
    let value_columns = header_row.iter()
        .filter(|cell| cell.value == KEY_VALUE_VALUE_HEADER)
        .map(|cell| cell.col)
        .collect::<Vec<_>>();
    let variant_column = header_row.iter().position(|cell| cell.value == crate::sheets::VARIANT_HEADER).map(|col| col as u32);

    let member_column = match member_column {
        Some(col) => col as u32,
        None => {
            log.error("Key-value sheet has no \"Member\" header column.", Some(sheet.full_location()));
            return vec![];
        },
    };
    if value_columns.is_empty() {
        log.error("Key-value sheet has no \"Value\" header column.", Some(sheet.full_location()));
        return vec![];
    }

    // Parse each member row into a slice, indexed by its row.
    let mut slices = vec![];
    let mut value_cells_by_row: Vec<(u32, Vec<SpreadsheetCell>)> = vec![];
    for (row_index, row) in sheet.cells().iter().enumerate().skip(1) {
        let member_cell = match row.get(member_column as usize) {
            Some(cell) => cell,
            None => continue,
        };

        let values = value_columns.iter()
            .map(|col| row.get(*col as usize).cloned().unwrap_or_default())
            .collect::<Vec<_>>();

        if member_cell.is_empty() {
            if let Some(cell) = values.iter().find(|cell| !cell.is_empty()) {
                log.error(
                    "This row has values but no member path declaring what they belong to.",
                    Some(cell.location(sheet.source())),
                );
            }
            continue;
        }

        let location = member_cell.location(sheet.source());
        match parse_header_cell(&member_cell.value, row_index as u32, &location) {
            Ok(ParsedHeader::Empty) => {},
            Ok(ParsedHeader::Slice(slice)) => {
                if slice.is_comment() {
                    continue;
                }

                // A variant cell scopes the whole member row to that variant.
                let variant_id = variant_column
                    .and_then(|col| row.get(col as usize))
                    .map(|cell| cell.value.clone())
                    .filter(|value| !value.is_empty());

                let slice = match variant_id {
                    Some(variant_id) => slice.with_variant_everywhere(&variant_id),
                    None => slice,
                };

                slices.push(slice);
                value_cells_by_row.push((row_index as u32, values));
            },
            Ok(ParsedHeader::VariantOverride(_)) => {
                log.error(
                    "Variant override headers are not valid member paths; use the /Variant column instead.",
                    Some(location),
                );
            },
            Err(error) => log.push(error),
        }
    }

    let mut tree_errors = vec![];
    let tree = build_path_tree(&slices, &mut tree_errors);
    for error in tree_errors {
        log.push(error);
    }

    let cells_of = |slice: &SliceInfo| value_cells_by_row.iter()
        .find(|(row, _)| row == slice.index())
        .map(|(_, values)| values.clone())
        .unwrap_or_default();

    let node = build_item_object(&tree, &cells_of, sheet.source(), true, log);
    vec![RootObject::new(vec![], node, sheet.full_location(), None)]
}

//---------------------------------------------------------------------------//
//                          Syntax-tree construction
//---------------------------------------------------------------------------//

/// This function builds the object node of one item from the path tree and a cell accessor.
///
/// The accessor returns the cells feeding one slice, position-aligned across slices so linear
/// collection members can be paired up. `declared_collections` controls whether a collection with
/// headers but no data becomes an explicit empty collection (key-value sheets) or stays absent
/// (libraries).
pub fn build_item_object(
    tree: &PathNodeObject,
    cells_of: &dyn Fn(&SliceInfo) -> Vec<SpreadsheetCell>,
    source: &Arc<SourceInfo>,
    declared_collections: bool,
    log: &mut BuildLog,
) -> ObjectNode {
    let mut object = ObjectNode::new();
    for (id, child) in tree.children() {
        if let Some(node) = build_item_node(child, cells_of, source, declared_collections, log) {
            object.insert(id.clone(), node);
        }
    }
    object
}

fn build_item_node(
    tree: &PathNode,
    cells_of: &dyn Fn(&SliceInfo) -> Vec<SpreadsheetCell>,
    source: &Arc<SourceInfo>,
    declared_collections: bool,
    log: &mut BuildLog,
) -> Option<Node> {
    match tree {
        PathNode::Scalar(scalar) => build_scalar(&cells_of(scalar.slice()), source, log),
        PathNode::Object(object) => {
            let node = build_item_object(object, cells_of, source, declared_collections, log);
            if node.members().is_empty() { None } else { Some(Node::Object(node)) }
        },
        PathNode::Collection(collection) => build_collection_node(collection, cells_of, source, declared_collections, log),
    }
}

/// Builds a scalar from the non-empty cells of its slice.
///
/// Repeated identical values collapse (inherited identity cells produce those); genuinely
/// different values are an error.
fn build_scalar(cells: &[SpreadsheetCell], source: &Arc<SourceInfo>, log: &mut BuildLog) -> Option<Node> {
    let mut non_empty = cells.iter().filter(|cell| !cell.is_empty());
    let first = non_empty.next()?;

    for cell in non_empty {
        if cell.value != first.value {
            log.error(
                &format!("Multiple different values (\"{}\", \"{}\") for a scalar member within one item.", first.value, cell.value),
                Some(cell.location(source)),
            );
        }
    }

    Some(Node::Scalar(ScalarNode::new(&first.value, first.location(source))))
}

fn build_collection_node(
    collection: &PathNodeCollection,
    cells_of: &dyn Fn(&SliceInfo) -> Vec<SpreadsheetCell>,
    source: &Arc<SourceInfo>,
    declared_collections: bool,
    log: &mut BuildLog,
) -> Option<Node> {
    let inline_cells = collection.scalar_slice().as_ref().map(|slice| cells_of(slice)).unwrap_or_default();
    let linear_scalar_cells = collection.linear_scalar().as_ref().map(|slice| cells_of(slice)).unwrap_or_default();
    let linear_member_cells = collection.linear_members().iter()
        .map(|(name, slice)| (name.clone(), cells_of(slice)))
        .collect::<Vec<_>>();

    let inline_used = inline_cells.iter().any(|cell| !cell.is_empty());
    let linear_used = linear_scalar_cells.iter().any(|cell| !cell.is_empty())
        || linear_member_cells.iter().any(|(_, cells)| cells.iter().any(|cell| !cell.is_empty()));

    // Indexed cells are gathered up front too, so representation conflicts can be detected
    // before building anything.
    let indexed_used = collection.indexed().values().any(|node| path_node_has_data(node, cells_of));

    let representations_used = usize::from(inline_used) + usize::from(linear_used) + usize::from(indexed_used);
    if representations_used > 1 {
        let location = first_cell_location(&inline_cells, source)
            .or_else(|| first_cell_location(&linear_scalar_cells, source));
        log.error(
            &format!("The item fills more than one representation of the collection \"{}\". Pick one.", collection.name()),
            location,
        );
        return None;
    }

    if inline_used {

        // Inline form: the whole collection as one cell, parsed later by the binder.
        return build_scalar(&inline_cells, source, log);
    }

    if linear_used {
        let elements = if !linear_member_cells.is_empty() {
            build_linear_member_elements(&linear_member_cells, source)
        } else {
            linear_scalar_cells.iter()
                .filter(|cell| !cell.is_empty())
                .map(|cell| Some(Node::Scalar(ScalarNode::new(&cell.value, cell.location(source)))))
                .collect()
        };
        return Some(Node::Collection(CollectionNode::new(elements)));
    }

    if indexed_used {
        let max_index = *collection.indexed().keys().last().unwrap_or(&0);
        let mut elements = vec![None; max_index as usize + 1];
        for (index, node) in collection.indexed() {
            elements[*index as usize] = build_item_node(node, cells_of, source, declared_collections, log);
        }
        return Some(Node::Collection(CollectionNode::new(elements)));
    }

    // No data anywhere. Key-value sheets declared the member explicitly, so they get an empty
    // collection; library columns simply leave the member absent.
    if declared_collections {
        Some(Node::Collection(CollectionNode::default()))
    } else {
        None
    }
}

/// One object element per aligned cell position where at least one member is filled.
fn build_linear_member_elements(member_cells: &[(String, Vec<SpreadsheetCell>)], source: &Arc<SourceInfo>) -> Vec<Option<Node>> {
    let positions = member_cells.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);

    let mut elements = vec![];
    for position in 0..positions {
        let mut element = ObjectNode::new();
        for (name, cells) in member_cells {
            if let Some(cell) = cells.get(position) {
                if !cell.is_empty() {
                    element.insert(NodeMemberId::baseline(name), Node::Scalar(ScalarNode::new(&cell.value, cell.location(source))));
                }
            }
        }
        if !element.members().is_empty() {
            elements.push(Some(Node::Object(element)));
        }
    }
    elements
}

fn path_node_has_data(node: &PathNode, cells_of: &dyn Fn(&SliceInfo) -> Vec<SpreadsheetCell>) -> bool {
    match node {
        PathNode::Scalar(scalar) => cells_of(scalar.slice()).iter().any(|cell| !cell.is_empty()),
        PathNode::Object(object) => object.children().values().any(|child| path_node_has_data(child, cells_of)),
        PathNode::Collection(collection) => {
            collection.scalar_slice().as_ref().is_some_and(|slice| cells_of(slice).iter().any(|cell| !cell.is_empty()))
                || collection.linear_scalar().as_ref().is_some_and(|slice| cells_of(slice).iter().any(|cell| !cell.is_empty()))
                || collection.linear_members().values().any(|slice| cells_of(slice).iter().any(|cell| !cell.is_empty()))
                || collection.indexed().values().any(|child| path_node_has_data(child, cells_of))
        },
    }
}

fn first_cell_location(cells: &[SpreadsheetCell], source: &Arc<SourceInfo>) -> Option<SourceLocation> {
    cells.iter().find(|cell| !cell.is_empty()).map(|cell| cell.location(source))
}
