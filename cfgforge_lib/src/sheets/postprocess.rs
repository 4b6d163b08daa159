//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the syntax-tree post-processing passes that run between splitting and binding.
//!
//! In order: alias extraction, variant extraction, baseline inheritance, duplicate detection.
//! After these passes every [`RootObject`] is a complete, self-contained definition of one
//! (item, variant) pair, which is what the binder wants to see.

use indexmap::IndexMap;

use crate::build::log::BuildLog;
use crate::sheets::ALIASES_HEADER;
use crate::sheets::syntax::{Node, NodeMemberId, ObjectNode, RootObject};

//---------------------------------------------------------------------------//
//                              Passes
//---------------------------------------------------------------------------//

/// This function pulls the `/Aliases` member out of a root and stores its raw value aside.
///
/// The value is a comma-separated list of alias keys; it gets parsed as keys during binding.
pub fn extract_aliases(root: &mut RootObject, log: &mut BuildLog) {
    let node = match root.node_mut().remove_member(ALIASES_HEADER) {
        Some(node) => node,
        None => return,
    };

    match node {
        Node::Scalar(scalar) => root.set_aliases(Some(scalar.value().clone())),
        other => log.error(
            "The /Aliases member must be a single cell with a comma-separated list of aliases.",
            other.location(),
        ),
    }
}

/// This function splits variant-annotated members out of each root into sibling roots.
///
/// Each distinct variant id found among the top-level members produces one extra root carrying
/// only its own members (with the item's identity); the original root keeps the baseline members.
pub fn extract_variants(roots: Vec<RootObject>) -> Vec<RootObject> {
    let mut result = vec![];

    for root in roots {
        let variant_ids = root.node().members().keys()
            .filter_map(|id| id.variant_id().clone())
            .collect::<indexmap::IndexSet<_>>();

        if variant_ids.is_empty() {
            result.push(root);
            continue;
        }

        let mut baseline_node = ObjectNode::new();
        let mut variant_nodes: IndexMap<String, ObjectNode> = variant_ids.iter()
            .map(|id| (id.clone(), ObjectNode::new()))
            .collect();

        for (id, node) in root.node().members() {
            match id.variant_id() {
                Some(variant_id) => {
                    variant_nodes[variant_id].insert(NodeMemberId::baseline(id.name()), node.clone());
                },
                None => {
                    baseline_node.insert(id.clone(), node.clone());
                },
            }
        }

        let mut baseline = RootObject::new(root.id().clone(), baseline_node, root.location().clone(), root.variant_id().clone());
        baseline.set_aliases(root.aliases().clone());
        result.push(baseline);

        for (variant_id, node) in variant_nodes {
            result.push(RootObject::new(root.id().clone(), node, root.location().clone(), Some(variant_id)));
        }
    }

    result
}

/// This function completes library variant overlays with the values of their baseline item.
///
/// Any top-level member absent in the overlay inherits the baseline member, and a missing
/// identity is filled from the baseline of the same item. Overlays whose key does not exist in
/// the baseline are appended items and inherit nothing.
pub fn inherit_variant_values_from_baseline(roots: &mut [RootObject]) {
    let baselines = roots.iter()
        .enumerate()
        .filter(|(_, root)| root.variant_id().is_none())
        .map(|(index, root)| (root.key(), index))
        .collect::<IndexMap<_, _>>();

    // Two passes to keep the borrow checker happy: find what to inherit, then apply it.
    let mut inherited: Vec<(usize, RootObject)> = vec![];
    for (index, root) in roots.iter().enumerate() {
        if root.variant_id().is_none() {
            continue;
        }
        if let Some(baseline_index) = baselines.get(&root.key()) {
            inherited.push((index, roots[*baseline_index].clone()));
        }
    }

    for (index, baseline) in inherited {
        let overlay = &mut roots[index];
        inherit_members(overlay, &baseline);
        if overlay.id().iter().any(String::is_empty) {
            overlay.set_id(baseline.id().clone());
        }
    }
}

/// This function completes a key-value variant overlay with the values of the baseline.
///
/// On top of the member-wise inheritance libraries get, a top-level EMPTY collection in the
/// overlay is removed first, so an accidentally empty variant collection does not wipe the
/// baseline's.
pub fn inherit_key_value_variant_values_from_baseline(roots: &mut [RootObject]) {
    let baseline_index = match roots.iter().position(|root| root.variant_id().is_none()) {
        Some(index) => index,
        None => return,
    };
    let baseline = roots[baseline_index].clone();

    for (index, overlay) in roots.iter_mut().enumerate() {
        if index == baseline_index || overlay.variant_id().is_none() {
            continue;
        }

        let empty_collections = overlay.node().members().iter()
            .filter(|(_, node)| matches!(node, Node::Collection(collection) if collection.is_empty()))
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        for id in empty_collections {
            overlay.node_mut().members_mut().shift_remove(&id);
        }

        inherit_members(overlay, &baseline);
    }
}

/// Member-wise inheritance: rebuild the overlay in baseline member order, overlay values
/// winning, then append overlay-only members in their own order.
fn inherit_members(overlay: &mut RootObject, baseline: &RootObject) {
    let mut merged = ObjectNode::new();
    for (id, node) in baseline.node().members() {
        match overlay.node().members().get(id) {
            Some(overridden) => merged.insert(id.clone(), overridden.clone()),
            None => merged.insert(id.clone(), node.clone()),
        };
    }
    for (id, node) in overlay.node().members() {
        if !merged.members().contains_key(id) {
            merged.insert(id.clone(), node.clone());
        }
    }
    *overlay.node_mut() = merged;
}

/// This function reports every `(item id, variant)` pair defined more than once.
///
/// Both definitions are pointed at, so the author can pick which one to delete.
pub fn detect_duplicate_objects(roots: &[RootObject], log: &mut BuildLog) {
    let mut seen: IndexMap<(String, Option<String>), &RootObject> = IndexMap::new();

    for root in roots {
        let id = (root.key(), root.variant_id().clone());
        match seen.get(&id) {
            Some(first) => {
                let variant = match root.variant_id() {
                    Some(variant_id) => format!(" (variant {variant_id})"),
                    None => String::new(),
                };
                log.push(
                    crate::build::log::BuildMessage::error(
                        &format!("The item \"{}\"{variant} is defined more than once. First definition at {}.", root.key(), first.location()),
                        Some(root.location().clone()),
                    ),
                );
            },
            None => { seen.insert(id, root); },
        }
    }
}
