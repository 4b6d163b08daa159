//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the path tree: the static shape of an item, derived from the parsed headers.
//!
//! The tree tells the item splitter which cells feed which member. A collection node captures
//! every representation its headers declare; which one an ITEM actually uses is decided later,
//! per item, because different items of the same sheet may legally use different forms (as long
//! as each item sticks to one).

use getset::Getters;
use indexmap::IndexMap;

use std::collections::BTreeMap;

use crate::build::log::BuildMessage;
use crate::sheets::header::{SegmentKind, SliceInfo};
use crate::sheets::syntax::NodeMemberId;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// One node of the path tree.
#[derive(Clone, Debug, PartialEq)]
pub enum PathNode {

    /// A single scalar column.
    Scalar(PathNodeScalar),

    /// A collection, in whichever representations the headers declared.
    Collection(PathNodeCollection),

    /// A nested object.
    Object(PathNodeObject),
}

/// A scalar leaf of the path tree.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct PathNodeScalar {
    slice: SliceInfo,
}

/// A collection of the path tree, holding every representation declared for it.
///
/// Exactly one representation may carry data for any single item.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct PathNodeCollection {

    /// Name of the collection member, for diagnostics.
    name: String,

    /// Header `A`: the whole collection written inline in one cell.
    scalar_slice: Option<SliceInfo>,

    /// Header `A[]`: one scalar element per content row.
    linear_scalar: Option<SliceInfo>,

    /// Headers `A[].X`: one object element per content row.
    linear_members: IndexMap<String, SliceInfo>,

    /// Headers `A[i]` / `A[i].X`: explicitly indexed elements. Gaps become null elements.
    indexed: BTreeMap<u32, PathNode>,
}

/// An object of the path tree, with ordered children.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct PathNodeObject {
    children: IndexMap<NodeMemberId, PathNode>,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl PathNodeCollection {

    /// This function returns true if no representation at all was declared beyond the inline one.
    pub fn has_only_inline(&self) -> bool {
        self.linear_scalar.is_none() && self.linear_members.is_empty() && self.indexed.is_empty()
    }
}

/// This function groups the provided slices into a path tree.
///
/// Header-shape problems (duplicates, conflicts, illegal nesting) land in `errors`; the returned
/// tree covers whatever could still be made sense of.
pub fn build_path_tree(slices: &[SliceInfo], errors: &mut Vec<BuildMessage>) -> PathNodeObject {
    build_object(slices.iter().collect(), 0, errors)
}

fn build_object(slices: Vec<&SliceInfo>, depth: usize, errors: &mut Vec<BuildMessage>) -> PathNodeObject {
    let mut groups: IndexMap<NodeMemberId, Vec<&SliceInfo>> = IndexMap::new();
    for slice in slices {
        let segment = &slice.segments()[depth];
        let id = NodeMemberId::new(segment.name(), segment.variant_id().as_deref());
        groups.entry(id).or_default().push(slice);
    }

    let mut children = IndexMap::new();
    for (id, group) in groups {
        if let Some(node) = build_member(&group, depth, errors) {
            children.insert(id, node);
        }
    }

    PathNodeObject { children }
}

fn build_member(group: &[&SliceInfo], depth: usize, errors: &mut Vec<BuildMessage>) -> Option<PathNode> {
    let mut plain_terminals = vec![];
    let mut deeper = vec![];
    let mut linear = vec![];
    let mut indexed = vec![];

    for slice in group {
        let segment = &slice.segments()[depth];
        match segment.kind() {
            SegmentKind::LinearCollection => linear.push(*slice),
            SegmentKind::IndexedElement => indexed.push(*slice),
            SegmentKind::Root | SegmentKind::Member => {
                if slice.segments().len() == depth + 1 {
                    plain_terminals.push(*slice);
                } else {
                    deeper.push(*slice);
                }
            },
        }
    }

    // Collection forms present: everything else must fold into the collection or conflict.
    if !linear.is_empty() || !indexed.is_empty() {
        return build_collection(&plain_terminals, &deeper, &linear, &indexed, depth, errors);
    }

    // Compound member.
    if !deeper.is_empty() {
        for terminal in &plain_terminals {
            errors.push(BuildMessage::error(
                &format!("Header \"{}\" declares a scalar at a path that other headers declare as compound.", terminal.full_path()),
                Some(terminal.location().clone()),
            ));
        }
        return Some(PathNode::Object(build_object(deeper, depth + 1, errors)));
    }

    // Plain scalar. More than one column on the exact same path is a duplicate.
    for duplicate in plain_terminals.iter().skip(1) {
        errors.push(BuildMessage::error(
            &format!("Duplicate header \"{}\".", duplicate.full_path()),
            Some(duplicate.location().clone()),
        ));
    }
    plain_terminals.first().map(|slice| PathNode::Scalar(PathNodeScalar { slice: (*slice).clone() }))
}

fn build_collection(
    plain_terminals: &[&SliceInfo],
    deeper: &[&SliceInfo],
    linear: &[&SliceInfo],
    indexed: &[&SliceInfo],
    depth: usize,
    errors: &mut Vec<BuildMessage>,
) -> Option<PathNode> {
    let name = linear.first().or(indexed.first()).map(|slice| slice.segments()[depth].name().to_owned())?;

    // `A.B` next to `A[]` makes A both an object and a collection.
    for slice in deeper {
        errors.push(BuildMessage::error(
            &format!("Header \"{}\" declares a nested member of \"{name}\", which other headers declare as a collection.", slice.full_path()),
            Some(slice.location().clone()),
        ));
    }

    let mut collection = PathNodeCollection { name: name.clone(), ..Default::default() };

    // Inline representation: at most one plain column.
    for duplicate in plain_terminals.iter().skip(1) {
        errors.push(BuildMessage::error(
            &format!("Duplicate header \"{}\".", duplicate.full_path()),
            Some(duplicate.location().clone()),
        ));
    }
    collection.scalar_slice = plain_terminals.first().map(|slice| (*slice).clone());

    // Linear representation.
    for slice in linear {
        let remaining = slice.segments().len() - depth - 1;
        if remaining == 0 {
            if collection.linear_scalar.is_some() {
                errors.push(BuildMessage::error(
                    &format!("The linear collection \"{name}\" has more than one scalar element column."),
                    Some(slice.location().clone()),
                ));
            } else {
                collection.linear_scalar = Some((*slice).clone());
            }
        } else if remaining == 1 && *slice.segments()[depth + 1].kind() == SegmentKind::Member {
            let member_name = slice.segments()[depth + 1].name().to_owned();
            if collection.linear_members.contains_key(&member_name) {
                errors.push(BuildMessage::error(
                    &format!("Duplicate header \"{}\".", slice.full_path()),
                    Some(slice.location().clone()),
                ));
            } else {
                collection.linear_members.insert(member_name, (*slice).clone());
            }
        } else {
            errors.push(BuildMessage::error(
                &format!("Header \"{}\" nests deeper than one member level inside the linear collection \"{name}\".", slice.full_path()),
                Some(slice.location().clone()),
            ));
        }
    }

    if collection.linear_scalar.is_some() && !collection.linear_members.is_empty() {
        let slice = collection.linear_scalar.as_ref().unwrap();
        errors.push(BuildMessage::error(
            &format!("The linear collection \"{name}\" mixes scalar element columns with member element columns."),
            Some(slice.location().clone()),
        ));
        collection.linear_scalar = None;
    }

    // Indexed representation.
    let mut by_index: BTreeMap<u32, Vec<&SliceInfo>> = BTreeMap::new();
    for slice in indexed {
        let index = slice.segments()[depth].element_index().unwrap_or(0);
        by_index.entry(index).or_default().push(slice);
    }

    for (index, group) in by_index {
        let (terminals, nested): (Vec<_>, Vec<_>) = group.into_iter().partition(|slice| slice.segments().len() == depth + 1);

        if !terminals.is_empty() && !nested.is_empty() {
            errors.push(BuildMessage::error(
                &format!("Element {index} of the collection \"{name}\" is declared both as a scalar and as a compound."),
                Some(terminals[0].location().clone()),
            ));
            continue;
        }

        for duplicate in terminals.iter().skip(1) {
            errors.push(BuildMessage::error(
                &format!("Duplicate header \"{}\".", duplicate.full_path()),
                Some(duplicate.location().clone()),
            ));
        }

        let node = if let Some(terminal) = terminals.first() {
            PathNode::Scalar(PathNodeScalar { slice: (*terminal).clone() })
        } else {
            PathNode::Object(build_object(nested, depth + 1, errors))
        };
        collection.indexed.insert(index, node);
    }

    Some(PathNode::Collection(collection))
}
